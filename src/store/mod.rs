//! The note store the resolver reads from.
//!
//! The host owns documents; the resolver only lists and reads them through [NoteStore]. Two
//! implementations ship with the crate: [MemoryNoteStore] for tests and embedding hosts, and
//! [FsNoteStore] for a vault directory on disk.

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::LinkedNotesError;

pub mod fs;
pub mod memory;

pub use fs::FsNoteStore;
pub use memory::MemoryNoteStore;

/// A note as the host knows it. `basename` is the file stem (`Intro`), `name` the file name
/// (`Intro.md`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    pub path: PathBuf,
    pub basename: String,
    pub name: String,
}

impl Document {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let basename = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Document {
            path: path.to_path_buf(),
            basename,
            name,
        }
    }

    /// Exact, case-sensitive match on either the basename or the full file name.
    pub fn matches(&self, note_name: &str) -> bool {
        self.basename == note_name || self.name == note_name
    }
}

pub trait NoteStore: Sync {
    /// Every document in the store, in the store's own order.
    fn list_documents(
        &self,
    ) -> impl Future<Output = Result<Vec<Document>, LinkedNotesError>> + Send;

    /// Raw text of `document`, frontmatter included.
    fn read_document(
        &self,
        document: &Document,
    ) -> impl Future<Output = Result<String, LinkedNotesError>> + Send;
}

/// Locate the first document (in store order) named `note_name`. A failing listing is logged and
/// reported as not found.
pub async fn find_note_file<S: NoteStore>(store: &S, note_name: &str) -> Option<Document> {
    if note_name.is_empty() {
        return None;
    }
    match store.list_documents().await {
        Ok(documents) => documents.into_iter().find(|doc| doc.matches(note_name)),
        Err(e) => {
            tracing::error!("[NoteStore] Failed to list documents: {}", e);
            None
        }
    }
}
