// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page assembly: one run from source PDF to encrypted, watermarked copy.
//
// The run is a one-way state machine. Encryption is fixed before the output
// is opened, metadata is written before the first page, and every page is
// stamped before it is appended. Any error moves the pipeline to `Failed`;
// the reader and writer are released by drop on every path.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use chrono::Local;
use kopierwerk_core::config::Config;
use kopierwerk_core::error::KopierwerkError;
use kopierwerk_security::{EncryptionConfigurer, document_id, hash_bytes};
use tracing::{debug, error, info, instrument, warn};

use crate::metadata::MetadataMerger;
use crate::pdf::{OutputDocumentBuilder, SourceDocument};
use crate::watermark::tiling::MAX_TILES_PER_PAGE;
use crate::watermark::{Gaps, SizeMetrics, WatermarkRenderer, WatermarkResources, WatermarkUnit, tiles};

/// Lifecycle states of a copy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Created,
    ReaderOpened,
    PagesSelected,
    /// Encryption settings are complete; the output is not open yet.
    WriterConfigured,
    WriterOpened,
    MetadataWritten,
    /// At least one page has been stamped and appended.
    PageStamped,
    Finalized,
    Failed,
}

impl PipelineState {
    /// Whether `next` directly follows `self`. Only `PageStamped` repeats, and
    /// any unfinished state may fail.
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        match next {
            Failed => !matches!(self, Finalized | Failed),
            _ => matches!(
                (self, next),
                (Created, ReaderOpened)
                    | (ReaderOpened, PagesSelected)
                    | (PagesSelected, WriterConfigured)
                    | (WriterConfigured, WriterOpened)
                    | (WriterOpened, MetadataWritten)
                    | (MetadataWritten, PageStamped)
                    | (PageStamped, PageStamped)
                    | (PageStamped, Finalized)
            ),
        }
    }
}

/// What happened to one selected page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    /// 1-based page number in the source.
    pub source_page: u32,
    pub tiles: usize,
    /// Decoded content length of the source page.
    pub source_content_len: usize,
    /// Decoded content length of the stamped output page.
    pub output_content_len: usize,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One entry per output page, in output order.
    pub pages: Vec<PageReport>,
    /// SHA-256 of every page overlay in order. Equal configurations over the
    /// same source produce the same fingerprint.
    pub layout_fingerprint: String,
}

impl RunReport {
    /// Tiles drawn across all pages.
    pub fn total_tiles(&self) -> usize {
        self.pages.iter().map(|page| page.tiles).sum()
    }
}

/// Drives a single copy run for a validated [`Config`].
pub struct PageAssemblyPipeline<'a> {
    config: &'a Config,
    configurer: EncryptionConfigurer,
    state: PipelineState,
    transitions: Vec<PipelineState>,
}

impl<'a> PageAssemblyPipeline<'a> {
    /// A pipeline in `Created` for one run over `config`.
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            configurer: EncryptionConfigurer::new(),
            state: PipelineState::Created,
            transitions: Vec::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state entered so far, in order, excluding `Created`.
    pub fn transitions(&self) -> &[PipelineState] {
        &self.transitions
    }

    /// Run to completion, writing the copy to the configured target file.
    pub fn run(&mut self) -> Result<RunReport, KopierwerkError> {
        let config = self.config;
        self.run_with(|| File::create(&config.target).map(BufWriter::new))
            .map(|(_, report)| report)
    }

    /// Run to completion, writing into the sink returned by `open_sink`.
    ///
    /// `open_sink` is called only once the pages are selected and encryption
    /// is configured, so earlier failures never touch the target.
    #[instrument(skip_all, fields(
        source = %self.config.source.display(),
        target = %self.config.target.display(),
    ))]
    pub fn run_with<W, F>(&mut self, open_sink: F) -> Result<(W, RunReport), KopierwerkError>
    where
        W: Write,
        F: FnOnce() -> io::Result<W>,
    {
        if self.state != PipelineState::Created {
            return Err(KopierwerkError::OutputDocument(format!(
                "pipeline already ran (state {:?})",
                self.state
            )));
        }
        match self.execute(open_sink) {
            Ok(done) => Ok(done),
            Err(err) => {
                error!(state = ?self.state, error = %err, "Copy run failed");
                self.advance(PipelineState::Failed);
                Err(err)
            }
        }
    }

    fn execute<W, F>(&mut self, open_sink: F) -> Result<(W, RunReport), KopierwerkError>
    where
        W: Write,
        F: FnOnce() -> io::Result<W>,
    {
        let config = self.config;

        let source = SourceDocument::open(&config.source)?;
        info!(
            path = %source.path().display(),
            pages = source.page_count(),
            "Source opened"
        );
        self.advance(PipelineState::ReaderOpened);

        let selection = source.select_pages(config.page_ranges.as_deref())?;
        self.advance(PipelineState::PagesSelected);

        let unit = WatermarkUnit::from_config(config)?;
        let metrics = SizeMetrics::compute(
            &unit,
            Gaps {
                ratio: config.gap_ratio,
                size: config.gap_size,
            },
        );
        if !metrics.is_tileable() {
            warn!(kind = unit.kind(), "Watermark has no extent, pages will not be stamped");
        }

        let settings = self
            .configurer
            .configure(&config.permissions, config.user_password.as_ref())?;
        let builder = OutputDocumentBuilder::new(settings);
        self.advance(PipelineState::WriterConfigured);

        let sink = open_sink().map_err(|err| {
            KopierwerkError::OutputDocument(format!(
                "cannot create {}: {err}",
                config.target.display()
            ))
        })?;
        let mut output = builder.open(sink);
        self.advance(PipelineState::WriterOpened);

        let mut info = source.info();
        let metadata = MetadataMerger::merge(&mut info, &config.metadata);
        output.write_metadata(&metadata, &Local::now())?;
        self.advance(PipelineState::MetadataWritten);

        let resources = WatermarkResources::register(output.document_mut(), &unit, config.opacity);
        let renderer = WatermarkRenderer::new(&unit, resources);
        let mut overlays = Vec::new();
        let mut pages = Vec::with_capacity(selection.len());

        for page_number in selection.iter() {
            let page = output.import_page(&source, page_number)?;
            let grid = tiles(page.rect, &metrics);
            let planned = grid.planned_len();
            if planned > MAX_TILES_PER_PAGE as f64 {
                return Err(KopierwerkError::Render(format!(
                    "page {page_number} would need {planned:.0} watermark tiles, \
                     more than the limit of {MAX_TILES_PER_PAGE}"
                )));
            }
            let mut stamp = output.stamp(&page)?;
            let tile_count = renderer.render(&mut stamp, grid);
            let outcome = stamp.commit()?;
            output.add_page(&page)?;

            overlays.extend_from_slice(&outcome.overlay);
            let report = PageReport {
                source_page: page_number,
                tiles: tile_count,
                source_content_len: source.page_content_len(page_number)?,
                output_content_len: outcome.content_len,
            };
            debug!(
                page = page_number,
                tiles = report.tiles,
                source_len = report.source_content_len,
                output_len = report.output_content_len,
                "Page stamped"
            );
            pages.push(report);
            self.advance(PipelineState::PageStamped);
        }

        let source_id = source.file_id().unwrap_or_default();
        let file_id = document_id(&[
            config.source.as_os_str().as_encoded_bytes(),
            config.target.as_os_str().as_encoded_bytes(),
            source_id.as_slice(),
        ]);
        let sink = output.finalize(file_id)?;
        self.advance(PipelineState::Finalized);

        let report = RunReport {
            pages,
            layout_fingerprint: hash_bytes(&overlays),
        };
        info!(
            pages = report.pages.len(),
            tiles = report.total_tiles(),
            layout = %report.layout_fingerprint,
            "Copy written"
        );
        Ok((sink, report))
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        debug!(from = ?self.state, to = ?next, "Pipeline state");
        self.state = next;
        self.transitions.push(next);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::{Path, PathBuf};

    use image::{Rgba, RgbaImage};
    use kopierwerk_core::config::WatermarkSource;
    use kopierwerk_core::types::UserPassword;
    use lopdf::Document;
    use tempfile::TempDir;

    use super::*;
    use crate::test_support::{SampleOptions, sample_pdf};

    use super::PipelineState::*;

    fn workspace(pages: u32) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.pdf");
        std::fs::write(&source, sample_pdf(&SampleOptions::pages(pages))).unwrap();
        (dir, source)
    }

    fn text_config(dir: &Path, source: &Path) -> Config {
        Config::new(
            source,
            dir.join("copy.pdf"),
            WatermarkSource::Text {
                lines: vec!["CONFIDENTIAL".into(), "review copy".into()],
            },
        )
    }

    fn run_in_memory(config: &Config) -> (Vec<u8>, RunReport) {
        PageAssemblyPipeline::new(config)
            .run_with(|| Ok(Vec::new()))
            .unwrap()
    }

    #[test]
    fn copies_every_page_with_tiles() {
        let (dir, source) = workspace(3);
        let config = text_config(dir.path(), &source);
        let (bytes, report) = run_in_memory(&config);

        assert_eq!(report.pages.len(), 3);
        for page in &report.pages {
            assert!(page.tiles > 0);
            assert!(page.output_content_len > page.source_content_len);
        }
        let output = Document::load_mem(&bytes).unwrap();
        assert_eq!(output.get_pages().len(), 3);
        assert!(bytes.windows(8).any(|window| window == b"/Encrypt"));
    }

    #[test]
    fn ranges_keep_order_and_duplicates() {
        let (dir, source) = workspace(4);
        let mut config = text_config(dir.path(), &source);
        config.page_ranges = Some("4,2-3,2".into());
        let (bytes, report) = run_in_memory(&config);

        let order: Vec<u32> = report.pages.iter().map(|page| page.source_page).collect();
        assert_eq!(order, vec![4, 2, 3, 2]);
        assert_eq!(Document::load_mem(&bytes).unwrap().get_pages().len(), 4);
    }

    #[test]
    fn bad_range_fails_before_the_output_is_opened() {
        let (dir, source) = workspace(2);
        let mut config = text_config(dir.path(), &source);
        config.page_ranges = Some("1-9".into());

        let opened = Cell::new(false);
        let mut pipeline = PageAssemblyPipeline::new(&config);
        let err = pipeline
            .run_with(|| {
                opened.set(true);
                Ok(Vec::<u8>::new())
            })
            .err()
            .unwrap();

        assert!(matches!(err, KopierwerkError::PageSelection(_)));
        assert!(!opened.get());
        assert_eq!(pipeline.state(), Failed);
        assert_eq!(pipeline.transitions(), &[ReaderOpened, Failed]);
    }

    #[test]
    fn missing_source_fails_without_creating_target() {
        let dir = TempDir::new().unwrap();
        let config = text_config(dir.path(), &dir.path().join("absent.pdf"));
        let mut pipeline = PageAssemblyPipeline::new(&config);
        let err = pipeline.run().unwrap_err();

        assert!(matches!(err, KopierwerkError::SourceDocument(_)));
        assert!(!config.target.exists());
        assert_eq!(pipeline.transitions(), &[Failed]);
    }

    #[test]
    fn transitions_follow_the_fixed_order() {
        let (dir, source) = workspace(2);
        let config = text_config(dir.path(), &source);
        let mut pipeline = PageAssemblyPipeline::new(&config);
        pipeline.run_with(|| Ok(Vec::<u8>::new())).unwrap();

        assert_eq!(
            pipeline.transitions(),
            &[
                ReaderOpened,
                PagesSelected,
                WriterConfigured,
                WriterOpened,
                MetadataWritten,
                PageStamped,
                PageStamped,
                Finalized,
            ]
        );
        assert!(pipeline.run_with(|| Ok(Vec::<u8>::new())).is_err());
    }

    #[test]
    fn layout_is_idempotent() {
        let (dir, source) = workspace(2);
        let config = text_config(dir.path(), &source);
        let (_, first) = run_in_memory(&config);
        let (_, second) = run_in_memory(&config);
        assert_eq!(first.layout_fingerprint, second.layout_fingerprint);
        assert_eq!(first.pages, second.pages);

        let mut rotated = config.clone();
        rotated.text_rotation = 45.0;
        let (_, third) = run_in_memory(&rotated);
        assert_ne!(first.layout_fingerprint, third.layout_fingerprint);
    }

    #[test]
    fn image_watermark_is_tiled() {
        let (dir, source) = workspace(1);
        let image_path = dir.path().join("stamp.png");
        RgbaImage::from_pixel(40, 20, Rgba([200, 0, 0, 128]))
            .save(&image_path)
            .unwrap();
        let config = Config::new(
            &source,
            dir.path().join("copy.pdf"),
            WatermarkSource::Image { path: image_path },
        );

        let report = PageAssemblyPipeline::new(&config).run().unwrap();
        assert!(report.pages[0].tiles > 0);
        let output = Document::load(&config.target).unwrap();
        assert_eq!(output.get_pages().len(), 1);
    }

    #[test]
    fn user_password_guards_the_copy() {
        let (dir, source) = workspace(2);
        let mut config = text_config(dir.path(), &source);
        config.user_password = Some(UserPassword::new("secret"));
        config.permissions.print = true;
        let (bytes, _) = run_in_memory(&config);

        let output = Document::load_mem(&bytes).unwrap();
        assert!(output.is_encrypted());
        let encrypt = output.get_encrypted().unwrap();
        assert_eq!(encrypt.get(b"V").unwrap().as_i64().unwrap(), 4);
        assert_eq!(encrypt.get(b"R").unwrap().as_i64().unwrap(), 4);
        assert!(!encrypt.get(b"EncryptMetadata").unwrap().as_bool().unwrap());
        let p = encrypt.get(b"P").unwrap().as_i64().unwrap();
        assert_ne!(p & (1 << 2), 0, "printing should be allowed");
        assert_eq!(p & (1 << 4), 0, "copying should be denied");

        let mut locked = Document::load_mem(&bytes).unwrap();
        assert!(locked.decrypt("wrong").is_err());
        let mut unlocked = Document::load_mem(&bytes).unwrap();
        unlocked.decrypt("secret").unwrap();
        assert_eq!(unlocked.get_pages().len(), 2);
    }

    #[test]
    fn overly_dense_layout_is_refused() {
        let (dir, source) = workspace(1);
        let image_path = dir.path().join("dot.png");
        RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]))
            .save(&image_path)
            .unwrap();
        let mut config = Config::new(
            &source,
            dir.path().join("copy.pdf"),
            WatermarkSource::Image { path: image_path },
        );
        config.gap_ratio = 0.0;
        config.gap_size = 0.0;

        let mut pipeline = PageAssemblyPipeline::new(&config);
        let err = pipeline.run_with(|| Ok(Vec::<u8>::new())).err().unwrap();
        assert!(matches!(err, KopierwerkError::Render(ref detail) if detail.contains("tiles")));
        assert_eq!(pipeline.state(), Failed);
    }

    #[test]
    fn states_cannot_be_skipped() {
        assert!(Created.can_advance_to(ReaderOpened));
        assert!(!Created.can_advance_to(PagesSelected));
        assert!(!PagesSelected.can_advance_to(WriterOpened));
        assert!(!WriterOpened.can_advance_to(PageStamped));
        assert!(!MetadataWritten.can_advance_to(Finalized));
        assert!(PageStamped.can_advance_to(PageStamped));
        assert!(WriterOpened.can_advance_to(Failed));
        assert!(!Finalized.can_advance_to(Failed));
        assert!(!Finalized.can_advance_to(ReaderOpened));
    }
}
