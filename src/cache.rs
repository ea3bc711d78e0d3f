//! Memoized resolution results.
//!
//! Entries are keyed by note name, depth and qualifier. The same note requested at two different
//! depths produces two entries, since the deeper one has less expansion budget left.

use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::reference::{NoteReference, BLOCK_MARKER, QUALIFIER_SEPARATOR};

/// Serializes as `<noteName>[#<section>|#^<blockId>]-<depth>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey<'a> {
    pub note_name: &'a str,
    pub depth: usize,
    pub section: Option<&'a str>,
    pub block_id: Option<&'a str>,
}

impl<'a> CacheKey<'a> {
    pub fn for_reference(reference: &'a NoteReference, depth: usize) -> Self {
        CacheKey {
            note_name: &reference.note_name,
            depth,
            section: reference.section.as_deref(),
            block_id: reference.block_id.as_deref(),
        }
    }
}

impl fmt::Display for CacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.note_name)?;
        if let Some(section) = self.section {
            write!(f, "{QUALIFIER_SEPARATOR}{section}")?;
        } else if let Some(block_id) = self.block_id {
            write!(f, "{QUALIFIER_SEPARATOR}{BLOCK_MARKER}{block_id}")?;
        }
        write!(f, "-{}", self.depth)
    }
}

pub fn create_cache_key(
    note_name: &str,
    depth: usize,
    section: Option<&str>,
    block_id: Option<&str>,
) -> String {
    CacheKey {
        note_name,
        depth,
        section,
        block_id,
    }
    .to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Shared by every resolution pass of one compiler. Values are written once, fully expanded, and
/// never mutated afterwards.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<String, String>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey<'_>) -> Option<String> {
        let found = self.entries.read().get(&key.to_string()).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn insert(&self, key: &CacheKey<'_>, content: String) {
        self.entries.write().insert(key.to_string(), content);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
