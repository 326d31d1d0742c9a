//! Matchup aggregation over the frame table.
//!
//! This module provides:
//! - CSV reading of extraction output
//! - Majority-vote aggregation per (player 1, player 2) matchup
//! - Summary table and JSON report export

pub mod config;
pub mod csv_reader;
pub mod export;
pub mod matchups;

pub use config::AnalysisConfig;
pub use csv_reader::DataSet;
pub use matchups::{aggregate, MatchupSummary};

use anyhow::Result;
use std::path::Path;

/// Runs the full analysis pipeline: read the frame table, aggregate, write outputs.
///
/// Character cells outside `vocabulary` are read as `Unknown`.
pub fn run_analysis(
    input: &Path,
    output_csv: &Path,
    json_path: Option<&Path>,
    config: &AnalysisConfig,
    vocabulary: &[String],
) -> Result<Vec<MatchupSummary>> {
    let data = DataSet::from_csv(input, vocabulary)?;
    crate::log(&format!(
        "Loaded {} records from {} ({} malformed rows skipped, {} unrecognized characters)",
        data.len(),
        input.display(),
        data.skipped_rows,
        data.unknown_characters
    ));

    let matchups::Aggregation { table, summaries } = aggregate(&data.records, config);
    crate::log(&format!(
        "{} matchups from {} records ({} discarded), {} with at least {} occurrences",
        table.len(),
        table.counted(),
        table.discarded(),
        summaries.len(),
        config.min_occurrences
    ));

    export::write_summaries_csv(output_csv, &summaries)?;
    crate::log(&format!("Matchup table saved: {}", output_csv.display()));

    if let Some(json_path) = json_path {
        let stats = export::MatchupStats::new(
            data.len(),
            &table,
            config.min_occurrences,
            summaries.clone(),
        );
        export::export_to_json(&stats, json_path)?;
        crate::log(&format!("Matchup JSON saved: {}", json_path.display()));
    }

    if config.preview_rows > 0 && !summaries.is_empty() {
        for line in export::format_table(&summaries, config.preview_rows) {
            crate::log(&line);
        }
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionConfig;
    use tempfile::tempdir;

    fn vocabulary() -> Vec<String> {
        ExtractionConfig::default().vocabulary
    }

    #[test]
    fn test_run_analysis_end_to_end() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("frames.csv");
        std::fs::write(
            &input,
            "frame,player_1_name,player_1_character,player_2_name,player_2_character\n\
             2000,AL,Beef,BO,Pork\n\
             4000,AL,Beef,BO,Unknown\n\
             6000,AL,Pork,BO,Pork\n\
             8000,A,Pork,BO,Pork\n\
             10000,CY,Rice\n",
        )
        .unwrap();

        let output = dir.path().join("matchups.csv");
        let json = dir.path().join("matchups.json");
        let config = AnalysisConfig {
            min_occurrences: 3,
            ..Default::default()
        };

        let summaries = run_analysis(&input, &output, Some(&json), &config, &vocabulary()).unwrap();

        assert_eq!(summaries.len(), 1);
        let parallel = AnalysisConfig {
            parallel: true,
            chunk_size: 2,
            ..config.clone()
        };
        let parallel_output = dir.path().join("matchups_parallel.csv");
        assert_eq!(run_analysis(&input, &parallel_output, None, &parallel, &vocabulary()).unwrap(), summaries);
        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(content.lines().nth(1), Some("AL,Beef,BO,Pork,3"));

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(report["total_records"], 4);
        assert_eq!(report["discarded_records"], 1);
    }

    #[test]
    fn test_blank_character_cells_never_resolve() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("frames.csv");
        let mut content =
            "frame,player_1_name,player_1_character,player_2_name,player_2_character\n".to_string();
        for i in 1..=5 {
            content.push_str(&format!("{},AL,,BO,Pork\n", i * 2000));
        }
        std::fs::write(&input, content).unwrap();

        let output = dir.path().join("matchups.csv");
        let summaries =
            run_analysis(&input, &output, None, &AnalysisConfig::default(), &vocabulary()).unwrap();

        assert!(summaries.is_empty());
        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written.lines().count(), 1);
    }

    #[test]
    fn test_run_analysis_missing_input() {
        let dir = tempdir().unwrap();
        let result = run_analysis(
            &dir.path().join("absent.csv"),
            &dir.path().join("matchups.csv"),
            None,
            &AnalysisConfig::default(),
            &vocabulary(),
        );
        assert!(result.is_err());
    }
}
