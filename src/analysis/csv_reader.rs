//! CSV reader for the frame table.
//!
//! Parses the table written by extraction back into `FrameRecord`s. All
//! fields are read as text; rows missing a column are skipped. A character
//! cell outside the vocabulary (empty cells included) is read as `Unknown`.

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use regex::Regex;
use std::path::Path;

use crate::extraction::csv_writer::FRAME_COLUMNS;
use crate::extraction::record::{Character, FrameRecord, UNKNOWN_LABEL};

/// All records loaded from a frame table.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    /// Records in file order
    pub records: Vec<FrameRecord>,
    /// Rows that could not be used
    pub skipped_rows: usize,
    /// Non-blank character cells that were not a vocabulary label
    pub unknown_characters: usize,
}

impl DataSet {
    /// Load records from a frame table.
    ///
    /// Columns are located by header name, so extra or reordered columns are
    /// fine. A header missing a required column is an error; a data row
    /// missing a column is skipped with a warning.
    pub fn from_csv(path: &Path, vocabulary: &[String]) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

        let headers = reader
            .headers()
            .context("Failed to read CSV header")?
            .clone();
        let columns = ColumnIndex::from_headers(&headers)?;
        let frame_pattern = Regex::new(r"(\d+)\D*$")?;

        let mut data = DataSet::default();
        for (row_idx, row_result) in reader.records().enumerate() {
            // +2: one for the header, one for 1-based numbering
            let line_num = row_idx + 2;
            let parsed = row_result
                .map_err(|e| anyhow!("{}", e))
                .and_then(|row| {
                    let raw = columns.parse_row(&row, &frame_pattern)?;
                    Ok(FrameRecord {
                        frame_id: raw.frame_id,
                        p1_name: raw.p1_name.to_string(),
                        p1_character: data.character(raw.p1_character, vocabulary, line_num),
                        p2_name: raw.p2_name.to_string(),
                        p2_character: data.character(raw.p2_character, vocabulary, line_num),
                    })
                });

            match parsed {
                Ok(record) => data.records.push(record),
                Err(e) => {
                    data.skipped_rows += 1;
                    crate::log(&format!(
                        "Warning: Skipping malformed CSV row {}: {}",
                        line_num, e
                    ));
                }
            }
        }

        Ok(data)
    }

    /// Number of records in the dataset.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset is empty.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maps a character cell onto the vocabulary.
    fn character(&mut self, cell: &str, vocabulary: &[String], line_num: usize) -> Character {
        match Character::from_label(cell) {
            Character::Known(label) if !vocabulary.contains(&label) => {
                self.unknown_characters += 1;
                crate::log(&format!(
                    "Warning: CSV row {}: character '{}' is not in the vocabulary, reading as {}",
                    line_num, label, UNKNOWN_LABEL
                ));
                Character::Unknown
            }
            character => character,
        }
    }
}

/// Text cells of one row, borrowed from the CSV record.
struct RawRow<'r> {
    frame_id: u64,
    p1_name: &'r str,
    p1_character: &'r str,
    p2_name: &'r str,
    p2_character: &'r str,
}

/// Positions of the required columns, in `FRAME_COLUMNS` order.
struct ColumnIndex([usize; 5]);

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut positions = [0usize; 5];
        for (slot, name) in positions.iter_mut().zip(FRAME_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| anyhow!("CSV header is missing column '{}'", name))?;
        }
        Ok(Self(positions))
    }

    fn get<'r>(&self, row: &'r StringRecord, i: usize) -> Result<&'r str> {
        row.get(self.0[i])
            .ok_or_else(|| anyhow!("missing column '{}'", FRAME_COLUMNS[i]))
    }

    fn parse_row<'r>(&self, row: &'r StringRecord, frame_pattern: &Regex) -> Result<RawRow<'r>> {
        let frame_text = self.get(row, 0)?;
        let frame_id = parse_frame_id(frame_text, frame_pattern)
            .ok_or_else(|| anyhow!("no frame number in '{}'", frame_text))?;

        Ok(RawRow {
            frame_id,
            p1_name: self.get(row, 1)?,
            p1_character: self.get(row, 2)?,
            p2_name: self.get(row, 3)?,
            p2_character: self.get(row, 4)?,
        })
    }
}

/// Extracts the frame identifier from either `2000` or a path like `frames/frame_2000.jpg`.
fn parse_frame_id(text: &str, frame_pattern: &Regex) -> Option<u64> {
    frame_pattern
        .captures(text.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
