//! Output for aggregated matchups: the summary table and a JSON report.

use anyhow::{Context, Result};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::matchups::{MatchupSummary, MatchupTable};

/// Column order of the summary table.
pub const SUMMARY_COLUMNS: [&str; 5] = [
    "player_1_name",
    "player_1_character",
    "player_2_name",
    "player_2_character",
    "occurrence",
];

/// Aggregation report written by `export_to_json`.
#[derive(Debug, Clone, Serialize)]
pub struct MatchupStats {
    /// Rows read from the frame table
    pub total_records: usize,
    /// Records that passed the name filter
    pub counted_records: usize,
    /// Records dropped by the name filter
    pub discarded_records: usize,
    /// Distinct matchups before filtering
    pub matchup_count: usize,
    pub min_occurrences: u32,
    pub summaries: Vec<MatchupSummary>,
}

impl MatchupStats {
    pub fn new(
        total_records: usize,
        table: &MatchupTable,
        min_occurrences: u32,
        summaries: Vec<MatchupSummary>,
    ) -> Self {
        Self {
            total_records,
            counted_records: table.counted(),
            discarded_records: table.discarded(),
            matchup_count: table.len(),
            min_occurrences,
            summaries,
        }
    }
}

/// Writes the summary table, header included even when empty.
pub fn write_summaries_csv(path: &Path, summaries: &[MatchupSummary]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create summary table: {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

    write_rows(&mut writer, summaries)?;
    writer.flush().context("Failed to flush summary table")?;
    Ok(())
}

fn write_rows<W: Write>(writer: &mut Writer<W>, summaries: &[MatchupSummary]) -> Result<()> {
    writer
        .write_record(SUMMARY_COLUMNS)
        .context("Failed to write summary header")?;
    for summary in summaries {
        writer
            .serialize(summary)
            .with_context(|| format!("Failed to write summary {} vs {}", summary.p1_name, summary.p2_name))?;
    }
    Ok(())
}

/// Export the aggregation report to a JSON file.
///
/// The output is pretty-printed for human readability.
pub fn export_to_json(stats: &MatchupStats, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(stats).context("Failed to serialize matchup report")?;

    let mut file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}

/// Formats summaries as an aligned text table, at most `limit` rows.
pub fn format_table(summaries: &[MatchupSummary], limit: usize) -> Vec<String> {
    let shown = &summaries[..summaries.len().min(limit)];
    let name_width = shown
        .iter()
        .flat_map(|s| [s.p1_name.chars().count(), s.p2_name.chars().count()])
        .chain(std::iter::once(8))
        .max()
        .unwrap_or(8);

    let mut lines = Vec::with_capacity(shown.len() + 1);
    lines.push(format!(
        "{:<nw$}  {:<8}  {:<nw$}  {:<8}  {:>5}",
        "player 1",
        "char",
        "player 2",
        "char",
        "count",
        nw = name_width
    ));
    for s in shown {
        lines.push(format!(
            "{:<nw$}  {:<8}  {:<nw$}  {:<8}  {:>5}",
            s.p1_name,
            s.p1_character,
            s.p2_name,
            s.p2_character,
            s.occurrence_count,
            nw = name_width
        ));
    }
    lines
}
