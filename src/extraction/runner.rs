//! Batch runner - walks the frame range and collects records.
//!
//! Frames are independent, so they are processed on the rayon pool when
//! `parallel` is set. Results are collected in frame order either way.

use anyhow::{anyhow, Result};
use rayon::prelude::*;
use std::time::Instant;

use crate::extraction::config::FrameRange;
use crate::extraction::driver::{FrameError, FrameExtractor};
use crate::extraction::record::FrameRecord;

/// One skipped frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFailure {
    pub frame_id: u64,
    /// Short kind label, e.g. `decode`
    pub kind: &'static str,
    pub detail: String,
}

impl FrameFailure {
    fn from_error(frame_id: u64, error: &FrameError) -> Self {
        Self {
            frame_id,
            kind: error.label(),
            detail: error.to_string(),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.kind == "not_found"
    }
}

/// Everything a batch produced.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successful records in ascending frame order
    pub records: Vec<FrameRecord>,
    /// Skipped frames in ascending frame order
    pub failures: Vec<FrameFailure>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.records.len()
    }

    pub fn skipped(&self) -> usize {
        self.failures.len()
    }

    pub fn missing(&self) -> usize {
        self.failures.iter().filter(|f| f.is_missing()).count()
    }

    /// Files one frame outcome. A fatal error is returned instead.
    fn add(&mut self, frame_id: u64, outcome: Result<FrameRecord, FrameError>) -> Result<()> {
        match outcome {
            Ok(record) => self.records.push(record),
            Err(e) if e.is_fatal() => {
                return Err(anyhow!("Frame {}: {}", frame_id, e));
            }
            Err(e) => {
                // Gaps in the frame sequence are expected, don't log each one
                if !matches!(e, FrameError::NotFound { .. }) {
                    crate::log(&format!("Frame {}: skipped: {}", frame_id, e));
                }
                self.failures.push(FrameFailure::from_error(frame_id, &e));
            }
        }
        Ok(())
    }
}

/// Runs the driver over every frame identifier in `range`.
///
/// Per-frame failures are recorded and skipped. Only a fatal configuration
/// error (a region outside the frame) aborts the batch.
pub fn run_batch(extractor: &FrameExtractor, range: &FrameRange, parallel: bool) -> Result<BatchReport> {
    let ids = range.ids();
    let started = Instant::now();
    crate::log(&format!(
        "Batch: {} frame(s) from {} to {} every {}{}",
        ids.len(),
        range.start,
        range.end,
        range.stride,
        if parallel { " (parallel)" } else { "" }
    ));

    let mut report = BatchReport::default();
    if parallel {
        let outcomes: Vec<(u64, Result<FrameRecord, FrameError>)> = ids
            .par_iter()
            .map(|&id| (id, extractor.process_frame(id)))
            .collect();
        for (frame_id, outcome) in outcomes {
            report.add(frame_id, outcome)?;
        }
    } else {
        for &frame_id in &ids {
            report.add(frame_id, extractor.process_frame(frame_id))?;
        }
    }

    crate::log(&format!(
        "Batch complete in {:.1}s: {} processed, {} skipped ({} missing)",
        started.elapsed().as_secs_f64(),
        report.processed(),
        report.skipped(),
        report.missing()
    ));

    Ok(report)
}
