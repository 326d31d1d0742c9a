//! Aggregation settings.

use serde::{Deserialize, Serialize};

/// Matchup aggregation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Matchups seen in fewer frames than this are dropped
    pub min_occurrences: u32,
    /// Names shorter than this are treated as OCR failures
    pub min_name_length: usize,
    /// Number of summaries echoed to the log after aggregation
    pub preview_rows: usize,
    /// Fold the frame table in parallel chunks
    pub parallel: bool,
    /// Records per chunk when `parallel` is set
    pub chunk_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 5,
            min_name_length: 2,
            preview_rows: 20,
            parallel: false,
            chunk_size: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"min_occurrences": 3}"#).unwrap();
        assert_eq!(config.min_occurrences, 3);
        assert_eq!(config.min_name_length, 2);
        assert!(!config.parallel);
    }
}
