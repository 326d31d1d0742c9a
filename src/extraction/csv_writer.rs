//! Writers for extraction results.
//!
//! The frame table holds one row per successfully processed frame:
//! `frame, player_1_name, player_1_character, player_2_name, player_2_character`.
//! The failure log holds one line per skipped frame.

use anyhow::{Context, Result};
use chrono::Local;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::extraction::record::FrameRecord;
use crate::extraction::runner::FrameFailure;

/// CSV header row of the frame table.
pub const FRAME_COLUMNS: [&str; 5] = [
    "frame",
    "player_1_name",
    "player_1_character",
    "player_2_name",
    "player_2_character",
];

#[derive(Serialize)]
struct FrameRow<'a> {
    frame: u64,
    player_1_name: &'a str,
    player_1_character: &'a str,
    player_2_name: &'a str,
    player_2_character: &'a str,
}

impl<'a> From<&'a FrameRecord> for FrameRow<'a> {
    fn from(record: &'a FrameRecord) -> Self {
        Self {
            frame: record.frame_id,
            player_1_name: &record.p1_name,
            player_1_character: record.p1_character.label(),
            player_2_name: &record.p2_name,
            player_2_character: record.p2_character.label(),
        }
    }
}

/// Writes the frame table, replacing any existing file.
///
/// The header is written even when there are no records, so the aggregation
/// stage always sees the expected columns.
pub fn write_frame_table(path: &Path, records: &[FrameRecord]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create frame table: {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    writer
        .write_record(FRAME_COLUMNS)
        .context("Failed to write frame table header")?;
    for record in records {
        writer
            .serialize(FrameRow::from(record))
            .with_context(|| format!("Failed to write row for frame {}", record.frame_id))?;
    }

    writer.flush().context("Failed to flush frame table")?;
    Ok(())
}

/// Writes one line per skipped frame: `frame<TAB>kind<TAB>detail`.
pub fn write_failure_log(path: &Path, failures: &[FrameFailure]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create failure log: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "# {} skipped frame(s), written {}", failures.len(), Local::now().format("%Y-%m-%dT%H:%M:%S"))
        .context("Failed to write failure log header")?;
    for failure in failures {
        writeln!(out, "{}\t{}\t{}", failure.frame_id, failure.kind, failure.detail)
            .context("Failed to write failure log line")?;
    }

    out.flush().context("Failed to flush failure log")?;
    Ok(())
}
