//! Depth-bounded recursive discovery of signed content.

use std::collections::HashSet;

use tracing::debug;
use tracing::trace;

use crate::formats::ContainerFormat;
use crate::formats::ParserSelector;
use crate::types::SignedItem;

/// Walks a file's containers and returns every file found along the way.
#[derive(Debug, Clone)]
pub struct ExtractionEngine {
    selector: ParserSelector,
    max_depth: usize,
}

impl ExtractionEngine {
    /// Creates an engine that nests at most `max_depth` levels below the
    /// first extraction.
    #[must_use]
    pub fn new(selector: ParserSelector, max_depth: usize) -> Self {
        Self {
            selector,
            max_depth,
        }
    }

    /// Returns the configured depth limit.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Lists `top` followed by everything extracted from it, recursively.
    ///
    /// The top file is extracted at depth 0 and a file extracted at depth
    /// `d` is itself extracted only while `d` is below the limit, so a chain
    /// of nested containers sees at most `max_depth + 1` extraction steps.
    /// Each path appears once, at its first occurrence.
    #[must_use]
    pub fn list_all_files(&self, top: &SignedItem) -> Vec<SignedItem> {
        let mut files = vec![top.clone()];
        self.extract_into(top, 0, &mut files);

        let mut seen = HashSet::new();
        files.retain(|item| seen.insert(item.path().to_path_buf()));

        debug!(top = %top.path().display(), files = files.len(), "discovery complete");
        files
    }

    fn extract_into(&self, file: &SignedItem, depth: usize, files: &mut Vec<SignedItem>) {
        let parser = self.selector.select(file);
        let attached = parser.attached_files();
        trace!(
            path = %file.path().display(),
            format = parser.format_name(),
            depth,
            attached = attached.len(),
            "file extracted"
        );

        files.extend(attached.iter().cloned());

        if depth < self.max_depth {
            for child in &attached {
                self.extract_into(child, depth + 1, files);
            }
        } else if !attached.is_empty() {
            debug!(path = %file.path().display(), depth, "nesting limit reached");
        }
    }
}
