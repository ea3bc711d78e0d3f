//! # notelink-core
//!
//! Resolves embedded note references (`![[Note]]`, `![[Note#Heading]]`, `![[Note#^block]]`) in
//! markdown notes, inlining the referenced content before a note is published.
//!
//! ## Overview
//!
//! A vault of notes refers to itself constantly. Before a note leaves the vault (published to a
//! site, exported, pasted elsewhere) its embeds have to be replaced with the text they point at.
//! notelink-core does that expansion recursively, with a depth ceiling, cycle detection and a
//! cache shared across publish operations.
//!
//! ### Key Features
//!
//! - **Section and block embeds**: narrow a note to one heading's section or one `^anchor`ed block
//! - **Bounded recursion**: embeds inside embedded content expand up to `max_depth` levels
//! - **Cycle safety**: `A → B → A` chains terminate, leaving the re-entering embed as written
//! - **Degrade, don't fail**: a broken embed never stops the rest of the document from publishing
//! - **Pluggable storage**: anything implementing [`store::NoteStore`] can back the resolver
//!
//! ## Architecture
//!
//! - **[`reference`]**: Tokenizer and parser for the embed syntax
//! - **[`store`]**: The [`NoteStore`](store::NoteStore) collaborator, note lookup, in-memory and
//!   filesystem stores
//! - **[`extract`]**: Frontmatter/comment stripping, section and block narrowing
//! - **[`cache`]**: Memoized fragments keyed by note, depth and qualifier
//! - **[`compiler`]**: [`LinkedNotesCompiler`](compiler::LinkedNotesCompiler), the recursive resolver
//! - **[`config`]**: [`ResolverOptions`](config::ResolverOptions), loadable from TOML
//!
//! ## Quick Start
//!
//! ```rust
//! use notelink_core::{compiler::LinkedNotesCompiler, store::MemoryNoteStore};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let store = MemoryNoteStore::from_notes([("Intro", "Welcome!")]);
//!     let compiler = LinkedNotesCompiler::new(store);
//!
//!     let published = compiler.compile("See ![[Intro]] for details", None).await;
//!     assert_eq!(published, "See Welcome! for details");
//! }
//! ```
//!
//! ### Working with a Vault on Disk
//!
//! ```rust,no_run
//! # use notelink_core::{compiler::LinkedNotesCompiler, config::ResolverOptions, store::{find_note_file, FsNoteStore}};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ResolverOptions::load("./vault/notelink.toml")?;
//! let compiler = LinkedNotesCompiler::with_options(FsNoteStore::new("./vault")?, options)?;
//!
//! if let Some(note) = find_note_file(compiler.store(), "Weekly Review").await {
//!     let published = compiler.compile_document(&note).await?;
//!     println!("{published}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **default**: The resolution library
//! - **bin**: The `notelink` command line tool

pub mod cache;
pub mod compiler;
pub mod config;
pub mod error;
pub mod extract;
pub mod reference;
pub mod store;
#[cfg(test)]
mod tests;

pub use error::*;
