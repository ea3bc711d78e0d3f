use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::{
    error::LinkedNotesError,
    store::{Document, NoteStore},
};

pub const NOTE_EXTENSIONS: [&str; 1] = ["md"];

/// A vault directory on disk. Listing walks the tree for markdown files in sorted path order and
/// skips hidden entries (`.obsidian`, `.git`, ...).
#[derive(Debug, Clone)]
pub struct FsNoteStore {
    root: PathBuf,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

fn is_note(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| NOTE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

impl FsNoteStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, LinkedNotesError> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(LinkedNotesError::NotFound(format!(
                "Vault root {root:?} is not a directory"
            )));
        }
        Ok(FsNoteStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(&self) -> Result<Vec<Document>, LinkedNotesError> {
        let mut documents = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && is_note(entry.path()) {
                documents.push(Document::from_path(entry.path()));
            }
        }
        tracing::trace!(
            "[FsNoteStore] Listed {} notes under {:?}",
            documents.len(),
            self.root
        );
        Ok(documents)
    }
}

impl NoteStore for FsNoteStore {
    async fn list_documents(&self) -> Result<Vec<Document>, LinkedNotesError> {
        self.walk()
    }

    async fn read_document(&self, document: &Document) -> Result<String, LinkedNotesError> {
        tracing::debug!("Reading {:?}", document.path);
        tokio::fs::read_to_string(&document.path)
            .await
            .map_err(|e| LinkedNotesError::read(document.path.display(), e))
    }
}
