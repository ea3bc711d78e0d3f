use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::RwLock;

use crate::{
    error::LinkedNotesError,
    store::{Document, NoteStore},
};

/// In-memory [NoteStore]. Documents keep insertion order; re-inserting a path replaces its text
/// in place. Reads are counted per path so callers can observe caching.
#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    documents: RwLock<Vec<(Document, String)>>,
    reads: RwLock<HashMap<PathBuf, usize>>,
    failing_reads: RwLock<HashSet<PathBuf>>,
    fail_listing: AtomicBool,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store of `<name>.md` documents from `(name, text)` pairs.
    pub fn from_notes<I, N, T>(notes: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: AsRef<str>,
        T: Into<String>,
    {
        let store = Self::new();
        for (name, text) in notes {
            store.insert(format!("{}.md", name.as_ref()), text);
        }
        store
    }

    pub fn insert(&self, path: impl AsRef<Path>, text: impl Into<String>) -> Document {
        let document = Document::from_path(path);
        let text = text.into();
        let mut documents = self.documents.write();
        match documents.iter_mut().find(|(doc, _)| doc.path == document.path) {
            Some(entry) => entry.1 = text,
            None => documents.push((document.clone(), text)),
        }
        document
    }

    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        let mut documents = self.documents.write();
        let before = documents.len();
        documents.retain(|(doc, _)| doc.path != path.as_ref());
        documents.len() != before
    }

    /// Make reads of `path` fail with [LinkedNotesError::Read] (or succeed again).
    pub fn fail_reads(&self, path: impl AsRef<Path>, fail: bool) {
        let mut failing = self.failing_reads.write();
        if fail {
            failing.insert(path.as_ref().to_path_buf());
        } else {
            failing.remove(path.as_ref());
        }
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        self.reads.read().get(path.as_ref()).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.read().values().sum()
    }

    fn read_sync(&self, document: &Document) -> Result<String, LinkedNotesError> {
        *self.reads.write().entry(document.path.clone()).or_insert(0) += 1;
        if self.failing_reads.read().contains(&document.path) {
            return Err(LinkedNotesError::read(
                document.path.display(),
                "simulated read failure",
            ));
        }
        self.documents
            .read()
            .iter()
            .find(|(doc, _)| doc.path == document.path)
            .map(|(_, text)| text.clone())
            .ok_or_else(|| {
                LinkedNotesError::NotFound(format!("{} is not in the store", document.path.display()))
            })
    }
}

impl NoteStore for MemoryNoteStore {
    async fn list_documents(&self) -> Result<Vec<Document>, LinkedNotesError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(LinkedNotesError::Io("simulated listing failure".to_string()));
        }
        Ok(self
            .documents
            .read()
            .iter()
            .map(|(doc, _)| doc.clone())
            .collect())
    }

    async fn read_document(&self, document: &Document) -> Result<String, LinkedNotesError> {
        self.read_sync(document)
    }
}
