// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page stamps: an over-content layer drawn on top of an imported page.
//
// The page's own content streams are bracketed by `q`/`Q` so any graphics
// state they leave behind cannot leak into the overlay. Resources the overlay
// uses get names that do not collide with the page's own.

use kopierwerk_core::error::{KopierwerkError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

/// Over-content of one page. Nothing reaches the document until
/// [`PageStamp::commit`].
pub struct PageStamp<'a> {
    document: &'a mut Document,
    page_id: ObjectId,
    resources: Dictionary,
    overlay: Vec<Operation>,
}

/// What a committed stamp wrote.
#[derive(Debug, Clone)]
pub struct StampOutcome {
    /// Encoded overlay operators.
    pub overlay: Vec<u8>,
    /// Decoded length of all content streams of the page after stamping.
    pub content_len: usize,
}

impl<'a> PageStamp<'a> {
    /// Begin a stamp on `page_id`, starting from a copy of the page's own
    /// resources (inline or referenced).
    ///
    /// # Errors
    ///
    /// Returns [`KopierwerkError::Render`] if the page object is not a
    /// dictionary or its referenced resources cannot be read.
    pub fn new(document: &'a mut Document, page_id: ObjectId) -> Result<Self> {
        let page = document.get_dictionary(page_id).map_err(|err| {
            KopierwerkError::Render(format!("page object {page_id:?} is not a dictionary: {err}"))
        })?;
        let resources = match page.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => document
                .get_dictionary(*id)
                .map_err(|err| {
                    KopierwerkError::Render(format!("page resources {id:?} unreadable: {err}"))
                })?
                .clone(),
            _ => Dictionary::new(),
        };

        Ok(Self {
            document,
            page_id,
            resources,
            overlay: Vec::new(),
        })
    }

    /// Register a graphics state under a fresh `/KwGs<n>` name and return
    /// the name for use with `gs`.
    pub fn add_ext_gstate(&mut self, id: ObjectId) -> Vec<u8> {
        self.add_resource(b"ExtGState", "KwGs", id)
    }

    /// Register a font under a fresh `/KwF<n>` name for use with `Tf`.
    pub fn add_font(&mut self, id: ObjectId) -> Vec<u8> {
        self.add_resource(b"Font", "KwF", id)
    }

    /// Register an image XObject under a fresh `/KwIm<n>` name for use
    /// with `Do`.
    pub fn add_xobject(&mut self, id: ObjectId) -> Vec<u8> {
        self.add_resource(b"XObject", "KwIm", id)
    }

    /// Operators drawn above the page's own content.
    pub fn over_content(&mut self) -> &mut Vec<Operation> {
        &mut self.overlay
    }

    /// Write the overlay and updated resources into the page.
    ///
    /// The page's existing content streams are wrapped in `q`/`Q` and the
    /// overlay follows them as the last content stream. The page's `/Resources`
    /// becomes an inline dictionary holding the original entries plus every
    /// name added through this stamp.
    ///
    /// # Errors
    ///
    /// Returns [`KopierwerkError::Render`] if the overlay cannot be encoded
    /// or the page object is missing or malformed.
    pub fn commit(self) -> Result<StampOutcome> {
        let overlay = Content {
            operations: self.overlay,
        }
        .encode()
        .map_err(|err| KopierwerkError::Render(format!("cannot encode overlay: {err}")))?;

        let existing = existing_contents(self.document, self.page_id)?;
        let mut contents = Vec::with_capacity(existing.len() + 3);
        if !existing.is_empty() {
            let save = self
                .document
                .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let restore = self
                .document
                .add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
            contents.push(Object::Reference(save));
            contents.extend(existing);
            contents.push(Object::Reference(restore));
        }
        let overlay_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), overlay.clone()));
        contents.push(Object::Reference(overlay_id));

        let content_len = contents
            .iter()
            .filter_map(|item| item.as_reference().ok())
            .filter_map(|id| self.document.get_object(id).ok())
            .filter_map(|object| object.as_stream().ok())
            .map(|stream| {
                stream
                    .decompressed_content()
                    .map(|content| content.len())
                    .unwrap_or(stream.content.len())
            })
            .sum();

        let page = self
            .document
            .get_object_mut(self.page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| KopierwerkError::Render(format!("page vanished: {err}")))?;
        page.set("Contents", Object::Array(contents));
        page.set("Resources", Object::Dictionary(self.resources));

        debug!(
            page = ?self.page_id,
            overlay_bytes = overlay.len(),
            content_len,
            "Page stamp committed"
        );
        Ok(StampOutcome {
            overlay,
            content_len,
        })
    }

    fn add_resource(&mut self, category: &[u8], prefix: &str, id: ObjectId) -> Vec<u8> {
        let mut entries = match self.resources.get(category) {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(sub_id)) => self
                .document
                .get_dictionary(*sub_id)
                .cloned()
                .unwrap_or_else(|_| Dictionary::new()),
            _ => Dictionary::new(),
        };

        let name = (1..)
            .map(|n| format!("{prefix}{n}").into_bytes())
            .find(|candidate| !entries.has(candidate))
            .unwrap_or_else(|| prefix.as_bytes().to_vec());
        entries.set(name.clone(), Object::Reference(id));
        self.resources
            .set(category.to_vec(), Object::Dictionary(entries));
        name
    }
}

/// References to the page's current content streams, in drawing order.
fn existing_contents(
    document: &Document,
    page_id: ObjectId,
) -> Result<Vec<Object>> {
    let page = document
        .get_dictionary(page_id)
        .map_err(|err| KopierwerkError::Render(format!("page unreadable: {err}")))?;
    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match document.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    Ok(contents)
}
