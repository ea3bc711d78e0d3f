//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Create a small vault under `<temp_dir>/vault/`.
///
/// ```text
/// vault/
///   ├── Post.md              → embeds Intro, Guide#Install, Snippets#^cmd, Missing
///   ├── Intro.md             (frontmatter + comment)
///   ├── guides/Guide.md      → Install section embeds Snippets#^note
///   ├── guides/Snippets.md   (anchored blocks)
///   ├── Loop.md              → embeds itself via Loop2
///   ├── Loop2.md
///   └── .obsidian/Hidden.md  (never listed)
/// ```
#[allow(dead_code)]
pub fn create_test_vault(temp_dir: &TempDir) -> PathBuf {
    let vault = temp_dir.path().join("vault");
    fs::create_dir_all(vault.join("guides")).unwrap();
    fs::create_dir_all(vault.join(".obsidian")).unwrap();

    let post = r#"---
title: Weekly Post
---

# Weekly Post

![[Intro]]

## Setup

![[Guide#Install]]

Command: ![[Snippets#^cmd]]

Later: ![[Missing]]
"#;
    fs::write(vault.join("Post.md"), post).unwrap();

    let intro = r#"---
tags: [intro]
---
<!-- keep this out of published output -->
Welcome to the weekly post.
"#;
    fs::write(vault.join("Intro.md"), intro).unwrap();

    let guide = r#"# Guide

Overview text.

## Install

Download the archive.
![[Snippets#^note]]

## Troubleshooting

Nothing to see.
"#;
    fs::write(vault.join("guides/Guide.md"), guide).unwrap();

    let snippets = r#"# Snippets

- `cargo install notelink` ^cmd
- unrelated item

Remember to restart
your shell afterwards. ^note
"#;
    fs::write(vault.join("guides/Snippets.md"), snippets).unwrap();

    fs::write(vault.join("Loop.md"), "Loop says ![[Loop2]]\n").unwrap();
    fs::write(vault.join("Loop2.md"), "Loop2 says ![[Loop]]\n").unwrap();
    fs::write(vault.join(".obsidian/Hidden.md"), "hidden").unwrap();

    vault
}
