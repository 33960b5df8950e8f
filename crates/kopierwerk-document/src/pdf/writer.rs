// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output document: imported pages, metadata and encryption, serialised with
// `lopdf` when the run is finalised.
//
// The writer is built from complete `EncryptionSettings`; there is no way to
// change them once the output has been opened.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use kopierwerk_core::error::{KopierwerkError, Result};
use kopierwerk_core::types::{MetadataSet, PageRect};
use kopierwerk_security::EncryptionSettings;
use lopdf::encryption::crypt_filters::{Aes128CryptFilter, CryptFilter};
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::{debug, info, instrument, warn};

use super::reader::SourceDocument;
use super::stamp::PageStamp;
use crate::metadata::{info_dictionary, xmp_packet};

pub const PDF_VERSION: &str = "1.7";

/// Page attributes a page may inherit from its `/Pages` ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Used when neither the page nor its ancestors define a media box.
const US_LETTER: [i64; 4] = [0, 0, 612, 792];

/// Name of the AES-128 crypt filter in the `/Encrypt` dictionary.
const CRYPT_FILTER: &[u8] = b"StdCF";

/// Collects the encryption settings an output needs before it can be opened.
pub struct OutputDocumentBuilder {
    encryption: EncryptionSettings,
}

impl OutputDocumentBuilder {
    /// Fix the encryption the output will be written with.
    pub fn new(encryption: EncryptionSettings) -> Self {
        Self { encryption }
    }

    /// Open an output that serialises into `sink`.
    pub fn open<W: Write>(self, sink: W) -> OutputDocument<W> {
        let mut document = Document::with_version(PDF_VERSION);
        let pages_id = document.new_object_id();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        OutputDocument {
            document,
            pages_id,
            catalog_id,
            imported: BTreeMap::new(),
            encryption: self.encryption,
            sink,
            page_count: 0,
        }
    }
}

/// A source page copied into the output but not necessarily placed yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportedPage {
    pub id: ObjectId,
    /// 1-based page number in the source document.
    pub source_page: u32,
    /// Visible area: the crop box, else the media box.
    pub rect: PageRect,
}

/// The PDF being written.
pub struct OutputDocument<W: Write> {
    document: Document,
    pages_id: ObjectId,
    catalog_id: ObjectId,
    /// Source object id to output object id, shared by every imported page.
    imported: BTreeMap<ObjectId, ObjectId>,
    encryption: EncryptionSettings,
    sink: W,
    page_count: u32,
}

impl<W: Write> OutputDocument<W> {
    /// The document under construction.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access for adding shared objects such as watermark resources.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Pages appended so far with [`OutputDocument::add_page`].
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    // -- Metadata -------------------------------------------------------------

    /// Write the `/Info` dictionary and the catalog's XMP metadata stream.
    pub fn write_metadata<Tz: TimeZone>(
        &mut self,
        metadata: &MetadataSet,
        now: &DateTime<Tz>,
    ) -> Result<()>
    where
        Tz::Offset: Display,
    {
        let info_id = self.document.add_object(info_dictionary(metadata, now));
        self.document.trailer.set("Info", info_id);

        let mut packet = Stream::new(
            dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
            xmp_packet(metadata, now).into_bytes(),
        );
        packet.allows_compression = false;
        let packet_id = self.document.add_object(packet);

        let catalog = self
            .document
            .get_object_mut(self.catalog_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| KopierwerkError::OutputDocument(format!("catalog missing: {err}")))?;
        catalog.set("Metadata", packet_id);
        debug!(fields = metadata.len(), "Metadata written");
        Ok(())
    }

    // -- Pages ----------------------------------------------------------------

    /// Copy page `page_number` of `source` into this document.
    ///
    /// Objects the page references are copied once per run and shared by
    /// later imports. References to other pages or to the page tree become
    /// null. Inherited attributes are resolved and stored on the page.
    #[instrument(skip(self, source))]
    pub fn import_page(
        &mut self,
        source: &SourceDocument,
        page_number: u32,
    ) -> Result<ImportedPage> {
        let source_page = source.page_id(page_number)?;
        let page = source
            .document()
            .get_dictionary(source_page)
            .map_err(|err| {
                KopierwerkError::SourceDocument(format!(
                    "page {page_number} is not a dictionary: {err}"
                ))
            })?;

        let target_page = self.document.new_object_id();
        let mut importer = Importer {
            source: source.document(),
            target: &mut self.document,
            imported: &mut self.imported,
            source_page,
            target_page,
        };

        let mut dict = Dictionary::new();
        for (key, value) in page.iter() {
            if key == b"Parent" {
                continue;
            }
            dict.set(key.clone(), importer.object(value));
        }
        for key in INHERITABLE {
            if dict.has(key) {
                continue;
            }
            if let Some(value) = source.inherited_attribute(source_page, key) {
                dict.set(key.to_vec(), importer.object(value));
            }
        }
        if !dict.has(b"MediaBox") {
            warn!(page_number, "Page has no media box, assuming US Letter");
            dict.set(
                "MediaBox",
                Object::Array(US_LETTER.into_iter().map(Object::Integer).collect()),
            );
        }

        let rect = visible_rect(&self.document, &dict).ok_or_else(|| {
            KopierwerkError::SourceDocument(format!("page {page_number} has no usable page box"))
        })?;
        self.document
            .objects
            .insert(target_page, Object::Dictionary(dict));

        debug!(
            target = ?target_page,
            width = rect.width(),
            height = rect.height(),
            shared_objects = self.imported.len(),
            "Page imported"
        );
        Ok(ImportedPage {
            id: target_page,
            source_page: page_number,
            rect,
        })
    }

    /// Start an over-content layer on an imported page. The page is changed
    /// only when the returned stamp is committed.
    pub fn stamp(&mut self, page: &ImportedPage) -> Result<PageStamp<'_>> {
        PageStamp::new(&mut self.document, page.id)
    }

    /// Append an imported page to the end of the page tree.
    ///
    /// The page's `/Parent` is pointed at the output's single `/Pages` node
    /// and `/Count` is bumped. Pages appear in the output in the order they
    /// are added; adding the same import twice lists it twice.
    ///
    /// # Errors
    ///
    /// Returns [`KopierwerkError::OutputDocument`] if the page or the page
    /// tree node is missing from the document.
    pub fn add_page(&mut self, page: &ImportedPage) -> Result<()> {
        let pages_id = self.pages_id;
        self.document
            .get_object_mut(page.id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| KopierwerkError::OutputDocument(format!("page missing: {err}")))?
            .set("Parent", pages_id);

        let count = self.page_count + 1;
        let pages = self
            .document
            .get_object_mut(pages_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| KopierwerkError::OutputDocument(format!("page tree missing: {err}")))?;
        match pages.get_mut(b"Kids") {
            Ok(Object::Array(kids)) => kids.push(Object::Reference(page.id)),
            _ => {
                return Err(KopierwerkError::OutputDocument(
                    "page tree has no /Kids array".to_string(),
                ));
            }
        }
        pages.set("Count", i64::from(count));
        self.page_count = count;
        Ok(())
    }

    // -- Output ---------------------------------------------------------------

    /// Compress, encrypt and serialise the document, then flush the sink.
    #[instrument(skip_all, fields(pages = self.page_count))]
    pub fn finalize(mut self, file_id: [u8; 16]) -> Result<W> {
        if self.page_count == 0 {
            return Err(KopierwerkError::OutputDocument(
                "no pages were added to the output".to_string(),
            ));
        }

        let id = Object::String(file_id.to_vec(), StringFormat::Hexadecimal);
        self.document
            .trailer
            .set("ID", Object::Array(vec![id.clone(), id]));
        self.document.compress();

        let state = encryption_state(&self.document, &self.encryption)?;
        self.document
            .encrypt(&state)
            .map_err(|err| KopierwerkError::Encryption(format!("cannot encrypt output: {err}")))?;

        self.document
            .save_to(&mut self.sink)
            .map_err(|err| KopierwerkError::OutputDocument(format!("cannot serialise: {err}")))?;
        self.sink.flush()?;

        info!(
            pages = self.page_count,
            objects = self.document.objects.len(),
            "Output finalised"
        );
        Ok(self.sink)
    }
}

fn encryption_state(
    document: &Document,
    settings: &EncryptionSettings,
) -> Result<EncryptionState> {
    let filter: Arc<dyn CryptFilter> = Arc::new(Aes128CryptFilter);
    let version = EncryptionVersion::V4 {
        document,
        encrypt_metadata: settings.cipher.encrypt_metadata,
        crypt_filters: BTreeMap::from([(CRYPT_FILTER.to_vec(), filter)]),
        stream_filter: CRYPT_FILTER.to_vec(),
        string_filter: CRYPT_FILTER.to_vec(),
        owner_password: settings.owner_password.expose(),
        user_password: settings.user_password.expose(),
        permissions: Permissions::from_bits_truncate(settings.permissions.bits().into()),
    };
    EncryptionState::try_from(version)
        .map_err(|err| KopierwerkError::Encryption(format!("cannot derive keys: {err}")))
}

// -- Object import ------------------------------------------------------------

/// Deep copy of source objects into the output, one output object per source
/// object.
struct Importer<'a> {
    source: &'a Document,
    target: &'a mut Document,
    imported: &'a mut BTreeMap<ObjectId, ObjectId>,
    source_page: ObjectId,
    target_page: ObjectId,
}

impl Importer<'_> {
    fn object(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.reference(*id),
            Object::Dictionary(dict) => Object::Dictionary(self.dictionary(dict)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.object(item)).collect())
            }
            Object::Stream(stream) => {
                let mut copy = Stream::new(self.dictionary(&stream.dict), stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.object(value));
        }
        copy
    }

    fn reference(&mut self, id: ObjectId) -> Object {
        if id == self.source_page {
            return Object::Reference(self.target_page);
        }
        if let Some(target) = self.imported.get(&id) {
            return Object::Reference(*target);
        }
        let Ok(object) = self.source.get_object(id) else {
            warn!(?id, "Cannot resolve reference, using null");
            return Object::Null;
        };
        if is_page_tree_node(object) {
            return Object::Null;
        }

        // Register before descending so cycles resolve to the same object.
        let target = self.target.new_object_id();
        self.imported.insert(id, target);
        let copy = self.object(object);
        self.target.objects.insert(target, copy);
        Object::Reference(target)
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .map(|name| name == b"Page" || name == b"Pages")
        .unwrap_or(false)
}

// -- Page boxes ---------------------------------------------------------------

fn visible_rect(document: &Document, page: &Dictionary) -> Option<PageRect> {
    let page_box = |key: &[u8]| page.get(key).ok().and_then(|value| rect_of(document, value));
    page_box(b"CropBox").or_else(|| page_box(b"MediaBox"))
}

fn rect_of(document: &Document, object: &Object) -> Option<PageRect> {
    let items = resolve(document, object).as_array().ok()?;
    let values = items
        .iter()
        .map(|item| resolve(document, item).as_float().ok().map(f64::from))
        .collect::<Option<Vec<f64>>>()?;
    match values.as_slice() {
        [x0, y0, x1, y1] => Some(PageRect::from_corners(*x0, *y0, *x1, *y1)),
        _ => None,
    }
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        _ => object,
    }
}
