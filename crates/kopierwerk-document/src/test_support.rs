// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small in-memory source PDFs for unit tests.

use lopdf::{Document, Object, Stream, dictionary};

use crate::pdf::text::encode_text_string;

pub(crate) struct SampleOptions {
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    /// Put on the `/Pages` root so pages inherit it.
    pub media_box: [i64; 4],
    /// Put on every page when set.
    pub crop_box: Option<[i64; 4]>,
}

impl SampleOptions {
    pub fn pages(page_count: u32) -> Self {
        Self {
            page_count,
            title: None,
            author: None,
            media_box: [0, 0, 612, 792],
            crop_box: None,
        }
    }
}

fn rect(values: [i64; 4]) -> Object {
    Object::Array(values.into_iter().map(Object::Integer).collect())
}

/// A PDF whose pages share one font and each print "Page N".
pub(crate) fn sample_pdf(options: &SampleOptions) -> Vec<u8> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for number in 1..=options.page_count {
        let content = format!("BT /F1 24 Tf 72 700 Td (Page {number}) Tj ET");
        let content_id = document.add_object(Stream::new(lopdf::Dictionary::new(), content.into_bytes()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if let Some(crop_box) = options.crop_box {
            page.set("CropBox", rect(crop_box));
        }
        kids.push(Object::Reference(document.add_object(page)));
    }

    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::from(options.page_count),
            "MediaBox" => rect(options.media_box),
            "Resources" => resources_id,
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let mut info = lopdf::Dictionary::new();
    if let Some(title) = &options.title {
        info.set("Title", encode_text_string(title));
    }
    if let Some(author) = &options.author {
        info.set("Author", encode_text_string(author));
    }
    let info_id = document.add_object(info);
    document.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    document.save_to(&mut bytes).expect("serialise sample PDF");
    bytes
}
