// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// kopierwerk-document: document processing for Kopierwerk.
//
// Reads the source PDF, lays out and draws the tiled watermark on each
// selected page, merges metadata and writes the encrypted copy. The
// `PageAssemblyPipeline` drives all of it for one run.

pub mod font;
pub mod metadata;
pub mod pdf;
pub mod pipeline;
pub mod watermark;

#[cfg(test)]
mod test_support;

// Re-export the primary structs so callers can use `kopierwerk_document::PageAssemblyPipeline` etc.
pub use metadata::MetadataMerger;
pub use pdf::{OutputDocument, OutputDocumentBuilder, SourceDocument};
pub use pipeline::{PageAssemblyPipeline, PageReport, PipelineState, RunReport};
pub use watermark::{SizeMetrics, WatermarkRenderer, WatermarkUnit, tiles};
