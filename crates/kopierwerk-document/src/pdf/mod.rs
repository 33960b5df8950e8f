// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: the source reader, the encrypted output writer and page stamps.

pub mod reader;
pub mod stamp;
pub mod text;
pub mod writer;

pub use reader::SourceDocument;
pub use stamp::{PageStamp, StampOutcome};
pub use writer::{ImportedPage, OutputDocument, OutputDocumentBuilder};
