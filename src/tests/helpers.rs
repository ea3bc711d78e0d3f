//! Shared test utilities for resolver testing

use crate::{
    compiler::LinkedNotesCompiler,
    config::ResolverOptions,
    error::LinkedNotesError,
    store::{Document, MemoryNoteStore, NoteStore},
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Compiler over an in-memory vault of `<name>.md` notes
pub fn create_test_compiler(notes: &[(&str, &str)]) -> LinkedNotesCompiler<MemoryNoteStore> {
    init_logging();
    LinkedNotesCompiler::new(MemoryNoteStore::from_notes(notes.iter().copied()))
}

pub fn create_test_compiler_with_depth(
    notes: &[(&str, &str)],
    max_depth: usize,
) -> LinkedNotesCompiler<MemoryNoteStore> {
    init_logging();
    let options = ResolverOptions {
        max_depth,
        ..Default::default()
    };
    LinkedNotesCompiler::with_options(MemoryNoteStore::from_notes(notes.iter().copied()), options)
        .expect("test options are valid")
}

/// A store whose every operation panics, for exercising the outermost failure boundary.
#[derive(Debug, Default)]
pub struct PanickingStore;

impl NoteStore for PanickingStore {
    async fn list_documents(&self) -> Result<Vec<Document>, LinkedNotesError> {
        panic!("list_documents should not be reachable");
    }

    async fn read_document(&self, _document: &Document) -> Result<String, LinkedNotesError> {
        panic!("read_document should not be reachable");
    }
}
