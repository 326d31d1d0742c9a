//! Per-frame structured record.

use std::fmt;

/// Sentinel written for a character the corrector could not resolve.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A character field: a vocabulary label or the `Unknown` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Character {
    Known(String),
    Unknown,
}

impl Character {
    /// Interprets persisted text; the sentinel and blank cells map to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label == UNKNOWN_LABEL {
            Character::Unknown
        } else {
            Character::Known(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Character::Known(label) => label,
            Character::Unknown => UNKNOWN_LABEL,
        }
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of reading one frame. Names are trimmed raw OCR text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    pub frame_id: u64,
    pub p1_name: String,
    pub p1_character: Character,
    pub p2_name: String,
    pub p2_character: Character,
}

impl FrameRecord {
    /// Convenience constructor taking labels as they appear in the frame table.
    #[cfg(test)]
    pub fn from_labels(
        frame_id: u64,
        p1_name: &str,
        p1_character: &str,
        p2_name: &str,
        p2_character: &str,
    ) -> Self {
        Self {
            frame_id,
            p1_name: p1_name.to_string(),
            p1_character: Character::from_label(p1_character),
            p2_name: p2_name.to_string(),
            p2_character: Character::from_label(p2_character),
        }
    }
}
