use std::fs;

use notelink_core::{
    compiler::LinkedNotesCompiler,
    config::ResolverOptions,
    reference::extract_note_names,
    store::{find_note_file, FsNoteStore, NoteStore},
};
use tempfile::tempdir;
use test_log::test;

mod common;
use common::create_test_vault;

const EXPECTED_POST: &str = r#"---
title: Weekly Post
---

# Weekly Post

Welcome to the weekly post.

## Setup

## Install

Download the archive.
Remember to restart
your shell afterwards.

Command: - `cargo install notelink`

Later: ![[Missing]]
"#;

#[test(tokio::test)]
async fn test_compile_post_from_vault() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let vault = create_test_vault(&temp);
    let compiler = LinkedNotesCompiler::new(FsNoteStore::new(&vault)?);

    let post = find_note_file(compiler.store(), "Post")
        .await
        .expect("Post.md is in the vault");
    let published = compiler.compile_document(&post).await?;
    assert_eq!(published, EXPECTED_POST);
    Ok(())
}

#[test(tokio::test)]
async fn test_hidden_directories_are_not_notes() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let vault = create_test_vault(&temp);
    let store = FsNoteStore::new(&vault)?;

    let names: Vec<String> = store
        .list_documents()
        .await?
        .into_iter()
        .map(|doc| doc.basename)
        .collect();
    assert!(!names.contains(&"Hidden".to_string()));
    assert!(names.contains(&"Guide".to_string()));

    let compiler = LinkedNotesCompiler::new(store);
    assert_eq!(compiler.compile("![[Hidden]]", None).await, "![[Hidden]]");
    Ok(())
}

#[test(tokio::test)]
async fn test_cycle_through_vault_terminates() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let vault = create_test_vault(&temp);
    let compiler = LinkedNotesCompiler::new(FsNoteStore::new(&vault)?);

    let root = find_note_file(compiler.store(), "Loop").await.unwrap();
    let published = compiler.compile_document(&root).await?;
    assert_eq!(published, "Loop says Loop2 says ![[Loop]]\n");
    Ok(())
}

#[test(tokio::test)]
async fn test_depth_limit_from_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let vault = create_test_vault(&temp);
    let config_path = temp.path().join("notelink.toml");
    fs::write(&config_path, "[resolver]\nmax_depth = 1\n")?;

    let options = ResolverOptions::load(&config_path)?;
    let compiler = LinkedNotesCompiler::with_options(FsNoteStore::new(&vault)?, options)?;
    let published = compiler.compile("![[Guide#Install]]", None).await;
    assert_eq!(
        published,
        "## Install\n\nDownload the archive.\n![[Snippets#^note]]"
    );
    Ok(())
}

#[test(tokio::test)]
async fn test_edited_note_needs_cache_clear() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let vault = create_test_vault(&temp);
    let compiler = LinkedNotesCompiler::new(FsNoteStore::new(&vault)?);

    assert_eq!(
        compiler.compile("![[Intro]]", None).await,
        "Welcome to the weekly post."
    );
    fs::write(vault.join("Intro.md"), "Rewritten intro.\n")?;
    assert_eq!(
        compiler.compile("![[Intro]]", None).await,
        "Welcome to the weekly post."
    );

    compiler.clear_cache();
    assert_eq!(compiler.compile("![[Intro]]", None).await, "Rewritten intro.");
    Ok(())
}

#[test(tokio::test)]
async fn test_deleted_note_is_left_verbatim() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let vault = create_test_vault(&temp);
    let compiler = LinkedNotesCompiler::new(FsNoteStore::new(&vault)?);

    fs::remove_file(vault.join("Intro.md"))?;
    assert_eq!(
        compiler.try_compile("Start ![[Intro]] end", None).await?,
        "Start ![[Intro]] end"
    );
    Ok(())
}

#[test]
fn test_note_names_of_post() {
    let temp = tempdir().unwrap();
    let vault = create_test_vault(&temp);
    let post = fs::read_to_string(vault.join("Post.md")).unwrap();
    assert_eq!(
        extract_note_names(&post),
        vec!["Intro", "Guide", "Snippets", "Missing"]
    );
}
