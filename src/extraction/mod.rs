//! Frame-to-record extraction.
//!
//! This module provides:
//! - Region, vocabulary, and frame range configuration
//! - The per-frame driver (load → crop → preprocess → recognize → correct)
//! - The batch runner over a fixed-stride frame range
//! - CSV output of records and a failure log

pub mod config;
pub mod csv_writer;
pub mod driver;
pub mod record;
pub mod runner;

pub use config::ExtractionConfig;
pub use driver::FrameExtractor;
pub use runner::{run_batch, BatchReport};

use anyhow::Result;
use std::path::Path;

use crate::ocr::{FuzzyCorrector, TextRecognizer};

/// Runs the full extraction pipeline: scan frames, write the frame table and failure log.
pub fn run_extraction(
    config: &ExtractionConfig,
    recognizer: &dyn TextRecognizer,
    table_path: &Path,
    failure_log_path: &Path,
) -> Result<BatchReport> {
    config.validate()?;

    let corrector = FuzzyCorrector::new(config.vocabulary.clone(), config.correction_threshold);
    let extractor = FrameExtractor::new(config, recognizer, &corrector);

    crate::log(&format!(
        "Reading frames from {} with {}",
        config.frames_dir.display(),
        recognizer.name()
    ));
    let report = run_batch(&extractor, &config.frames, config.parallel)?;

    csv_writer::write_frame_table(table_path, &report.records)?;
    crate::log(&format!(
        "Frame table saved: {} ({} rows)",
        table_path.display(),
        report.records.len()
    ));

    csv_writer::write_failure_log(failure_log_path, &report.failures)?;
    crate::log(&format!("Failure log saved: {}", failure_log_path.display()));

    Ok(report)
}
