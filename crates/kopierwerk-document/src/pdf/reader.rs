// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source document access: page lookup, inherited page attributes and the
// document information dictionary, using the `lopdf` crate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kopierwerk_core::error::{KopierwerkError, Result};
use kopierwerk_core::types::PageSelection;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info, instrument};

use super::text::decode_text_string;

/// Deepest `/Parent` chain followed when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// The PDF being copied. Opened read-only; nothing in it is modified.
pub struct SourceDocument {
    document: Document,
    pages: BTreeMap<u32, ObjectId>,
    path: PathBuf,
}

impl SourceDocument {
    // -- Construction ---------------------------------------------------------

    /// Parse the PDF at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KopierwerkError::SourceDocument`] if the file cannot be read
    /// or is not a PDF lopdf can parse.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening source PDF: {}", path.display());

        let document = Document::load(path).map_err(|err| {
            KopierwerkError::SourceDocument(format!("failed to open {}: {err}", path.display()))
        })?;
        Ok(Self::from_document(document, path))
    }

    /// Wrap an already parsed document; `path` only labels diagnostics.
    pub fn from_document(document: Document, path: impl AsRef<Path>) -> Self {
        let pages = document.get_pages();
        debug!(pages = pages.len(), "Source PDF loaded");
        Self {
            document,
            pages,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse a PDF held in memory. `label` stands in for the path in
    /// diagnostics.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8], label: impl AsRef<Path>) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            KopierwerkError::SourceDocument(format!("failed to load PDF from memory: {err}"))
        })?;
        Ok(Self::from_document(document, label))
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the source.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Where the source was read from, or the label it was given.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed source document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Pages named by `ranges`, or every page when no expression is given.
    pub fn select_pages(&self, ranges: Option<&str>) -> Result<PageSelection> {
        let selection = match ranges {
            Some(expression) => PageSelection::parse(expression, self.page_count())?,
            None => PageSelection::all(self.page_count()),
        };
        if selection.is_empty() {
            return Err(KopierwerkError::PageSelection(
                "the source document has no pages".to_string(),
            ));
        }
        debug!(selected = selection.len(), total = self.page_count(), "Pages selected");
        Ok(selection)
    }

    /// Object id of 1-based page `page_number`.
    pub fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        self.pages.get(&page_number).copied().ok_or_else(|| {
            KopierwerkError::PageSelection(format!(
                "page {page_number} exceeds document page count ({})",
                self.page_count()
            ))
        })
    }

    /// Decoded length of the page's content streams.
    pub fn page_content_len(&self, page_number: u32) -> Result<usize> {
        let page_id = self.page_id(page_number)?;
        let content = self.document.get_page_content(page_id).map_err(|err| {
            KopierwerkError::SourceDocument(format!("page {page_number} content unreadable: {err}"))
        })?;
        Ok(content.len())
    }

    /// `key` of the page itself or, failing that, of the nearest `/Pages`
    /// ancestor that defines it.
    pub fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = Some(page_id);
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.document.get_dictionary(current?).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        None
    }

    /// The document information dictionary as text, by key. Non-string
    /// entries are skipped.
    pub fn info(&self) -> BTreeMap<String, String> {
        let Ok(info) = self.document.trailer.get(b"Info") else {
            return BTreeMap::new();
        };
        let dict = match info {
            Object::Reference(id) => self.document.get_dictionary(*id).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        };
        dict.map(|dict| {
            dict.iter()
                .filter_map(|(key, value)| match value {
                    Object::String(bytes, _) => Some((
                        String::from_utf8_lossy(key).into_owned(),
                        decode_text_string(bytes),
                    )),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
    }

    /// First element of the trailer `/ID`, when present.
    pub fn file_id(&self) -> Option<Vec<u8>> {
        match self.document.trailer.get(b"ID").ok()? {
            Object::Array(items) => match items.first()? {
                Object::String(bytes, _) => Some(bytes.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}
