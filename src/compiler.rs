//! Recursive expansion of `![[embeds]]` ahead of publishing.

use std::{collections::HashMap, panic::AssertUnwindSafe};

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;

use crate::{
    cache::{CacheKey, CacheStats, ResolutionCache},
    config::ResolverOptions,
    error::LinkedNotesError,
    extract::{clean_content, extract_block_content, extract_section_content},
    reference::{scan_references, NoteReference},
    store::{find_note_file, Document, NoteStore},
};

pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated]";

/// Inlines the content of referenced notes into a document.
///
/// ## Overview
///
/// Given a document's text, every `![[Note]]`, `![[Note#Heading]]` and `![[Note#^block]]` token
/// is replaced by the referenced note's content (narrowed to the section or block when one is
/// named). Content pulled in this way is expanded again, one level deeper, until
/// [ResolverOptions::max_depth] is reached; at that depth tokens are left as written.
///
/// ```text
/// Root.md (depth 0)   "Intro: ![[Intro]]"
///   Intro.md (1)      "Welcome! ![[Greeting#^hi]]"
///     Greeting.md (2) "Hello there ^hi"
/// ```
///
/// With the default depth of 3 the root compiles to `Intro: Welcome! Hello there`.
///
/// ## Failure Policy
///
/// A reference that cannot be resolved stays in the output verbatim. That covers missing notes,
/// circular chains (`A` embeds `B` embeds `A`) and store read failures; each is logged and the
/// remaining references are still expanded. A missing section or block falls back to the whole
/// note. [LinkedNotesCompiler::compile] never fails: if the pass itself goes wrong the original
/// text is returned unexpanded.
///
/// ## Caching
///
/// Resolved fragments are memoized per `(note, depth, qualifier)` for the lifetime of the
/// compiler, across calls, until [LinkedNotesCompiler::clear_cache]. A cache hit skips the store
/// entirely. Each top-level call gets its own processing stack, so overlapping calls on one
/// compiler never see each other's in-flight notes.
pub struct LinkedNotesCompiler<S> {
    store: S,
    options: ResolverOptions,
    cache: ResolutionCache,
}

impl<S: NoteStore> LinkedNotesCompiler<S> {
    pub fn new(store: S) -> Self {
        LinkedNotesCompiler {
            store,
            options: ResolverOptions::default(),
            cache: ResolutionCache::new(),
        }
    }

    pub fn with_options(store: S, options: ResolverOptions) -> Result<Self, LinkedNotesError> {
        options.validate()?;
        Ok(LinkedNotesCompiler {
            store,
            options,
            cache: ResolutionCache::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Takes effect on the next top-level compile. Zero is raised to one.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        if max_depth == 0 {
            tracing::warn!("[LinkedNotes] max_depth of 0 requested, using 1");
        }
        self.options.max_depth = max_depth.max(1);
    }

    pub fn set_max_content_size(&mut self, max_content_size: usize) {
        self.options.max_content_size = max_content_size;
    }

    pub fn set_options(&mut self, options: ResolverOptions) -> Result<(), LinkedNotesError> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// Drop every memoized fragment. Needed after notes change on the host side.
    pub fn clear_cache(&self) {
        tracing::debug!("[LinkedNotes] Clearing {} cached fragments", self.cache.len());
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// A fresh resolution context sharing this compiler's store, options and cache.
    pub fn context(&self) -> ResolutionContext<'_, S> {
        ResolutionContext::new(&self.store, &self.cache, self.options)
    }

    /// Expand every embed in `content`. When `current` is given, that note counts as already being
    /// resolved, so a chain leading back to it is left unexpanded.
    pub async fn try_compile(
        &self,
        content: &str,
        current: Option<&Document>,
    ) -> Result<String, LinkedNotesError> {
        let context = self.context();
        let root_entry = match current {
            Some(document) => Some(context.stack().enter(&document.basename)?),
            None => None,
        };

        let expanded = context.resolve_linked_notes(content, 0).await;
        drop(root_entry);

        if !context.stack().is_empty() {
            return Err(LinkedNotesError::Internal(format!(
                "processing stack not empty after pass: {:?}",
                context.stack().chain()
            )));
        }
        Ok(expanded)
    }

    /// Like [Self::try_compile], but any failure (a panic inside the store included) yields the
    /// original text.
    pub async fn compile(&self, content: &str, current: Option<&Document>) -> String {
        match AssertUnwindSafe(self.try_compile(content, current))
            .catch_unwind()
            .await
        {
            Ok(Ok(expanded)) => expanded,
            Ok(Err(e)) => {
                tracing::error!(
                    "[LinkedNotes] Resolution failed, publishing unexpanded content: {}",
                    e
                );
                content.to_string()
            }
            Err(_) => {
                tracing::error!(
                    "[LinkedNotes] Resolution panicked, publishing unexpanded content"
                );
                content.to_string()
            }
        }
    }

    /// Read `document` from the store and compile it. Only a failure to read the root itself is
    /// returned as an error.
    pub async fn compile_document(&self, document: &Document) -> Result<String, LinkedNotesError> {
        let content = self.store.read_document(document).await?;
        Ok(self.compile(&content, Some(document)).await)
    }
}

/// Note names currently being resolved, innermost last.
#[derive(Debug, Default)]
pub struct ProcessingStack(Mutex<Vec<String>>);

/// Membership of one note on a [ProcessingStack]; leaving scope pops it, whether the resolution
/// that pushed it finished, failed, or was dropped mid-await.
#[derive(Debug)]
pub struct StackEntry<'a> {
    stack: &'a ProcessingStack,
    name: String,
}

impl ProcessingStack {
    /// Push `name`, or report a cycle if it is already on the stack.
    pub fn enter(&self, name: &str) -> Result<StackEntry<'_>, LinkedNotesError> {
        let mut names = self.0.lock();
        if names.iter().any(|active| active == name) {
            return Err(LinkedNotesError::CircularReference(name.to_string()));
        }
        names.push(name.to_string());
        tracing::trace!("[LinkedNotes] push '{}' (depth of stack {})", name, names.len());
        Ok(StackEntry {
            stack: self,
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.lock().iter().any(|active| active == name)
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn chain(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

impl Drop for StackEntry<'_> {
    fn drop(&mut self) {
        let mut names = self.stack.0.lock();
        if let Some(idx) = names.iter().rposition(|active| active == &self.name) {
            names.remove(idx);
        }
        tracing::trace!("[LinkedNotes] pop '{}'", self.name);
    }
}

/// State of one top-level resolution pass: the shared store and cache, a snapshot of the options,
/// and the pass's own processing stack.
pub struct ResolutionContext<'a, S> {
    store: &'a S,
    cache: &'a ResolutionCache,
    options: ResolverOptions,
    stack: ProcessingStack,
}

impl<'a, S: NoteStore> ResolutionContext<'a, S> {
    pub fn new(store: &'a S, cache: &'a ResolutionCache, options: ResolverOptions) -> Self {
        ResolutionContext {
            store,
            cache,
            options,
            stack: ProcessingStack::default(),
        }
    }

    pub fn stack(&self) -> &ProcessingStack {
        &self.stack
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Replace each embed in `content` with its resolved text. Tokens that fail to resolve are
    /// kept as written. At or beyond `max_depth` the content is returned untouched.
    pub async fn resolve_linked_notes(&self, content: &str, depth: usize) -> String {
        if depth >= self.options.max_depth {
            return content.to_string();
        }

        let mut resolved: HashMap<&str, Option<String>> = HashMap::new();
        let mut output = String::with_capacity(content.len());
        let mut last = 0;

        for raw in scan_references(content) {
            if !resolved.contains_key(raw.matched) {
                let reference = raw.parse();
                let replacement = match self.resolve_note(&reference, depth).await {
                    Ok(found) => found,
                    Err(e) => {
                        tracing::error!(
                            "[LinkedNotes] Failed to resolve {} at depth {}: {}",
                            raw.matched,
                            depth,
                            e
                        );
                        None
                    }
                };
                resolved.insert(raw.matched, replacement);
            }

            output.push_str(&content[last..raw.span.start]);
            match resolved.get(raw.matched).and_then(|found| found.as_deref()) {
                Some(text) => output.push_str(text),
                None => output.push_str(raw.matched),
            }
            last = raw.span.end;
        }
        output.push_str(&content[last..]);
        output
    }

    /// Resolve one reference found at `depth`. `Ok(None)` means the note is missing or already
    /// being resolved; an error means the store failed to read it.
    pub fn resolve_note<'b>(
        &'b self,
        reference: &'b NoteReference,
        depth: usize,
    ) -> BoxFuture<'b, Result<Option<String>, LinkedNotesError>> {
        async move {
            let key = CacheKey::for_reference(reference, depth);
            if let Some(hit) = self.cache.get(&key) {
                tracing::debug!("[LinkedNotes] cache hit for {}", key);
                return Ok(Some(hit));
            }

            let _entry = match self.stack.enter(&reference.note_name) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(
                        "[LinkedNotes] {} (chain: {})",
                        e,
                        self.stack.chain().join(" -> ")
                    );
                    return Ok(None);
                }
            };

            let Some(document) = find_note_file(self.store, &reference.note_name).await else {
                tracing::warn!("[LinkedNotes] Note not found: '{}'", reference.note_name);
                return Ok(None);
            };

            let raw = self.store.read_document(&document).await?;
            let narrowed = narrow_content(&clean_content(&raw), reference);
            let bounded = truncate_content(narrowed, self.options.max_content_size);
            let expanded = self.resolve_linked_notes(&bounded, depth + 1).await;

            self.cache.insert(&key, expanded.clone());
            Ok(Some(expanded))
        }
        .boxed()
    }
}

/// Apply the reference's section or block qualifier. A qualifier that matches nothing falls back
/// to the whole note.
pub fn narrow_content(cleaned: &str, reference: &NoteReference) -> String {
    let narrowed = if let Some(section) = &reference.section {
        let found = extract_section_content(cleaned, section);
        if found.is_none() {
            tracing::warn!(
                "[LinkedNotes] Section '{}' not found in '{}', embedding the whole note",
                section,
                reference.note_name
            );
        }
        found
    } else if let Some(block_id) = &reference.block_id {
        let found = extract_block_content(cleaned, block_id);
        if found.is_none() {
            tracing::warn!(
                "[LinkedNotes] Block '^{}' not found in '{}', embedding the whole note",
                block_id,
                reference.note_name
            );
        }
        found
    } else {
        None
    };

    match narrowed {
        Some(text) => trim_fragment(&text).to_string(),
        None => trim_fragment(cleaned).to_string(),
    }
}

/// Drop leading blank lines and trailing whitespace. Indentation of the first kept line survives.
fn trim_fragment(text: &str) -> &str {
    let text = text.trim_end();
    let leading = text.len() - text.trim_start().len();
    let start = text[..leading].rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    &text[start..]
}

/// Cut `content` to at most `max_size` bytes (on a char boundary) and append
/// [TRUNCATION_MARKER]. Content within the limit is returned as is.
pub fn truncate_content(mut content: String, max_size: usize) -> String {
    if content.len() <= max_size {
        return content;
    }
    let mut end = max_size;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    tracing::warn!(
        "[LinkedNotes] Fragment of {} bytes exceeds limit of {}, truncating",
        content.len(),
        max_size
    );
    content.truncate(end);
    content.push_str(TRUNCATION_MARKER);
    content
}
