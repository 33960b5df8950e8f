// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Kopierwerk.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::KopierwerkError;

// -- Geometry -----------------------------------------------------------------

/// Axis-aligned page rectangle in PDF user-space units (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl PageRect {
    /// Build a rectangle from two opposite corners in any order.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            left: x0.min(x1),
            bottom: y0.min(y1),
            right: x0.max(x1),
            top: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// True when `(x, y)` lies strictly inside the rectangle's right and top
    /// edges and on or above its left and bottom edges.
    pub fn contains_origin(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right && y >= self.bottom && y < self.top
    }
}

// -- Page selection -----------------------------------------------------------

/// Ordered list of 1-based source page numbers to copy.
///
/// Order and duplicates are kept exactly as written in the range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection(Vec<u32>);

impl PageSelection {
    /// Every page of a `page_count`-page document, in document order.
    pub fn all(page_count: u32) -> Self {
        Self((1..=page_count).collect())
    }

    /// Parse a range expression such as `"1-3,5"` against a document with
    /// `page_count` pages.
    ///
    /// Accepted items, separated by commas: `N`, `A-B` (inclusive, descending
    /// when `A > B`), `N-` (through the last page) and `-N` (from the first
    /// page). Whitespace around items and bounds is ignored.
    pub fn parse(expression: &str, page_count: u32) -> Result<Self, KopierwerkError> {
        let mut pages = Vec::new();

        for part in expression.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            if let Some((start_str, end_str)) = part.split_once('-') {
                let start = match start_str.trim() {
                    "" => 1,
                    bound => parse_page_number(bound, page_count)?,
                };
                let end = match end_str.trim() {
                    "" => page_count,
                    bound => parse_page_number(bound, page_count)?,
                };
                if start_str.trim().is_empty() && end_str.trim().is_empty() {
                    return Err(KopierwerkError::PageSelection(
                        "range '-' has no bounds".to_string(),
                    ));
                }

                if start <= end {
                    pages.extend(start..=end);
                } else {
                    pages.extend((end..=start).rev());
                }
            } else {
                pages.push(parse_page_number(part, page_count)?);
            }
        }

        if pages.is_empty() {
            return Err(KopierwerkError::PageSelection(format!(
                "range expression '{expression}' selects no pages"
            )));
        }

        Ok(Self(pages))
    }

    pub fn pages(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

fn parse_page_number(text: &str, page_count: u32) -> Result<u32, KopierwerkError> {
    let page: u32 = text
        .parse()
        .map_err(|_| KopierwerkError::PageSelection(format!("invalid page number: '{text}'")))?;

    if page == 0 {
        return Err(KopierwerkError::PageSelection(
            "page 0 is invalid (pages start at 1)".to_string(),
        ));
    }
    if page > page_count {
        return Err(KopierwerkError::PageSelection(format!(
            "page {page} exceeds document page count ({page_count})"
        )));
    }
    Ok(page)
}

// -- Metadata -----------------------------------------------------------------

/// Document information fields Kopierwerk reads and rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetadataField {
    Title,
    Subject,
    Keywords,
    Creator,
    Author,
}

impl MetadataField {
    /// All fields, in the order they are merged.
    pub const ALL: [MetadataField; 5] = [
        Self::Title,
        Self::Subject,
        Self::Keywords,
        Self::Creator,
        Self::Author,
    ];

    /// Key used in the PDF `/Info` dictionary.
    pub fn info_key(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Subject => "Subject",
            Self::Keywords => "Keywords",
            Self::Creator => "Creator",
            Self::Author => "Author",
        }
    }
}

/// User-supplied replacement values, one optional string per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataOverrides {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
}

impl MetadataOverrides {
    pub fn get(&self, field: MetadataField) -> Option<&str> {
        match field {
            MetadataField::Title => self.title.as_deref(),
            MetadataField::Subject => self.subject.as_deref(),
            MetadataField::Keywords => self.keywords.as_deref(),
            MetadataField::Creator => self.creator.as_deref(),
            MetadataField::Author => self.author.as_deref(),
        }
    }
}

/// Merged metadata for the output document. Absent fields are omitted from
/// the output rather than written empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSet(BTreeMap<MetadataField, String>);

impl MetadataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: MetadataField, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    pub fn get(&self, field: MetadataField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetadataField, &str)> {
        self.0.iter().map(|(field, value)| (*field, value.as_str()))
    }
}

// -- Security -----------------------------------------------------------------

/// End-user capabilities granted on the encrypted output. All default to
/// disallowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub print: bool,
    pub copy: bool,
    pub assembly: bool,
    pub annotate: bool,
}

/// Password required to open the output. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct UserPassword(String);

impl UserPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserPassword(<redacted>)")
    }
}
