//! Configuration types for frame extraction.
//!
//! Provides the four field regions, the character vocabulary, the frame
//! range to scan, preprocessing parameters, and Tesseract settings.
//! Every field has a default, so a partial `extraction` section is valid.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A rectangle in absolute pixel coordinates of a full frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    /// X position of top-left corner
    pub x: u32,
    /// Y position of top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// True when the rectangle lies entirely inside a `width` × `height` frame.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|x2| x2 <= width)
            && self.y.checked_add(self.height).is_some_and(|y2| y2 <= height)
    }
}

impl std::fmt::Display for Roi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// Which kind of content a field holds. Selects preprocessing and whitelist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    PlayerName,
    PlayerCharacter,
}

/// The four semantic fields read from every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Player1Name,
    Player2Name,
    Player1Character,
    Player2Character,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Player1Name,
        Field::Player2Name,
        Field::Player1Character,
        Field::Player2Character,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Player1Name | Field::Player2Name => FieldKind::PlayerName,
            Field::Player1Character | Field::Player2Character => FieldKind::PlayerCharacter,
        }
    }

    /// Column name used in the frame table.
    pub fn column(self) -> &'static str {
        match self {
            Field::Player1Name => "player_1_name",
            Field::Player2Name => "player_2_name",
            Field::Player1Character => "player_1_character",
            Field::Player2Character => "player_2_character",
        }
    }
}

/// Fixed regions for each field, in frame pixel coordinates.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub player_1_name: Roi,
    pub player_2_name: Roi,
    pub player_1_character: Roi,
    pub player_2_character: Roi,
}

impl Default for RegionConfig {
    fn default() -> Self {
        // Tuned for 1280x720 broadcast frames
        Self {
            player_1_name: Roi::new(291, 657, 228, 34),
            player_2_name: Roi::new(939, 658, 227, 32),
            player_1_character: Roi::new(305, 110, 60, 19),
            player_2_character: Roi::new(1096, 109, 60, 22),
        }
    }
}

impl RegionConfig {
    pub fn roi(&self, field: Field) -> Roi {
        match field {
            Field::Player1Name => self.player_1_name,
            Field::Player2Name => self.player_2_name,
            Field::Player1Character => self.player_1_character,
            Field::Player2Character => self.player_2_character,
        }
    }
}

/// Bounded, fixed-stride sequence of frame identifiers. `end` is exclusive.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameRange {
    pub start: u64,
    pub end: u64,
    pub stride: u64,
}

impl Default for FrameRange {
    fn default() -> Self {
        Self {
            start: 2000,
            end: 592000,
            stride: 2000,
        }
    }
}

impl FrameRange {
    /// Frame identifiers in ascending order.
    pub fn ids(&self) -> Vec<u64> {
        if self.stride == 0 {
            return Vec::new();
        }
        (self.start..self.end).step_by(self.stride as usize).collect()
    }
}

/// Largest accepted upscale factor.
pub const MAX_UPSCALE: u32 = 8;

/// Parameters for the image transforms applied before recognition.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Integer upscale factor applied to both field kinds
    pub upscale: u32,
    /// Gaussian sigma of the noise-suppression blur on character icons
    pub blur_sigma: f32,
    /// Side length of the adaptive-threshold neighbourhood (odd, >= 3)
    pub threshold_window: u32,
    /// Subtracted from the local weighted mean before comparing
    pub threshold_offset: i32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            upscale: 2,
            blur_sigma: 0.8,
            threshold_window: 11,
            threshold_offset: 2,
        }
    }
}

/// How to invoke the Tesseract CLI.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    /// Explicit executable path; discovered automatically when unset
    pub executable: Option<PathBuf>,
    /// Explicit tessdata directory; engine default when unset
    pub tessdata_dir: Option<PathBuf>,
    pub language: String,
    /// OCR engine mode (3 = default, LSTM when available)
    pub oem: u8,
    /// Page segmentation mode (8 = single word)
    pub psm: u8,
    /// A single field read is killed after this many milliseconds
    pub timeout_ms: u64,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            executable: None,
            tessdata_dir: None,
            language: "eng".to_string(),
            oem: 3,
            psm: 8,
            timeout_ms: 10_000,
        }
    }
}

/// Complete extraction configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Directory holding one image per frame identifier
    pub frames_dir: PathBuf,
    /// File name template; `{frame}` is replaced by the identifier
    pub file_template: String,
    pub frames: FrameRange,
    pub regions: RegionConfig,
    /// Valid character labels, in tie-break order
    pub vocabulary: Vec<String>,
    /// Correction accepts only scores strictly above this (0-100)
    pub correction_threshold: u8,
    /// Characters Tesseract may emit for name fields
    pub name_whitelist: String,
    pub preprocess: PreprocessConfig,
    pub tesseract: TesseractConfig,
    /// Process frames on a worker pool
    pub parallel: bool,
}

fn default_vocabulary() -> Vec<String> {
    ["Beef", "Pork", "Onion", "Garlic", "Rice", "Noodle"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_name_whitelist() -> String {
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890 ".to_string()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("frames_folder"),
            file_template: "frame_{frame}.jpg".to_string(),
            frames: FrameRange::default(),
            regions: RegionConfig::default(),
            vocabulary: default_vocabulary(),
            correction_threshold: 60,
            name_whitelist: default_name_whitelist(),
            preprocess: PreprocessConfig::default(),
            tesseract: TesseractConfig::default(),
            parallel: true,
        }
    }
}

impl ExtractionConfig {
    /// Path of the image file for one frame identifier.
    pub fn frame_path(&self, frame_id: u64) -> PathBuf {
        let name = self.file_template.replace("{frame}", &frame_id.to_string());
        self.frames_dir.join(name)
    }

    /// Whitelist for character fields: the vocabulary labels concatenated.
    pub fn character_whitelist(&self) -> String {
        self.vocabulary.concat()
    }

    pub fn whitelist(&self, kind: FieldKind) -> String {
        match kind {
            FieldKind::PlayerName => self.name_whitelist.clone(),
            FieldKind::PlayerCharacter => self.character_whitelist(),
        }
    }

    /// Rejects configurations that cannot produce meaningful records.
    pub fn validate(&self) -> Result<()> {
        if self.vocabulary.iter().all(|v| v.trim().is_empty()) {
            bail!("vocabulary is empty");
        }
        if self.frames.stride == 0 {
            bail!("frame stride must be greater than zero");
        }
        if self.frames.start > self.frames.end {
            bail!(
                "frame range start {} is after end {}",
                self.frames.start,
                self.frames.end
            );
        }
        if !self.file_template.contains("{frame}") {
            bail!("file_template '{}' has no {{frame}} placeholder", self.file_template);
        }
        for field in Field::ALL {
            let roi = self.regions.roi(field);
            if roi.width == 0 || roi.height == 0 {
                bail!("region {} has zero size: {}", field.column(), roi);
            }
        }
        let p = &self.preprocess;
        if p.upscale == 0 || p.upscale > MAX_UPSCALE {
            bail!(
                "upscale factor must be between 1 and {}, got {}",
                MAX_UPSCALE,
                p.upscale
            );
        }
        if self.tesseract.timeout_ms == 0 {
            bail!("tesseract timeout_ms must be greater than zero");
        }
        if !(p.blur_sigma > 0.0) {
            bail!("blur_sigma must be positive, got {}", p.blur_sigma);
        }
        if p.threshold_window < 3 || p.threshold_window % 2 == 0 {
            bail!(
                "threshold_window must be odd and at least 3, got {}",
                p.threshold_window
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        ExtractionConfig::default().validate().unwrap();
    }

    #[test]
    fn test_frame_range_ids() {
        let range = FrameRange { start: 2000, end: 10000, stride: 2000 };
        assert_eq!(range.ids(), vec![2000, 4000, 6000, 8000]);
    }

    #[test]
    fn test_default_frame_range_bounds() {
        let ids = FrameRange::default().ids();
        assert_eq!(ids.first(), Some(&2000));
        assert_eq!(ids.last(), Some(&590000));
        assert_eq!(ids.len(), 295);
    }

    #[test]
    fn test_frame_path_uses_template() {
        let config = ExtractionConfig {
            frames_dir: PathBuf::from("frames"),
            ..Default::default()
        };
        assert_eq!(config.frame_path(4000), PathBuf::from("frames").join("frame_4000.jpg"));
    }

    #[test]
    fn test_character_whitelist_concatenates_vocabulary() {
        let config = ExtractionConfig::default();
        assert_eq!(config.character_whitelist(), "BeefPorkOnionGarlicRiceNoodle");
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let config = ExtractionConfig {
            vocabulary: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_stride_rejected() {
        let mut config = ExtractionConfig::default();
        config.frames.stride = 0;
        assert!(config.validate().is_err());
        assert!(config.frames.ids().is_empty());
    }

    #[test]
    fn test_even_threshold_window_rejected() {
        let mut config = ExtractionConfig::default();
        config.preprocess.threshold_window = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_upscale_bounds() {
        let mut config = ExtractionConfig::default();
        config.preprocess.upscale = 0;
        assert!(config.validate().is_err());
        config.preprocess.upscale = MAX_UPSCALE;
        assert!(config.validate().is_ok());
        config.preprocess.upscale = 1 << 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ExtractionConfig::default();
        config.tesseract.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roi_fits_within() {
        let roi = Roi::new(10, 10, 20, 20);
        assert!(roi.fits_within(30, 30));
        assert!(!roi.fits_within(29, 30));
        assert!(!Roi::new(u32::MAX, 0, 1, 1).fits_within(100, 100));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ExtractionConfig =
            serde_json::from_str(r#"{"correction_threshold": 70, "frames": {"stride": 1000}}"#)
                .unwrap();
        assert_eq!(config.correction_threshold, 70);
        assert_eq!(config.frames.stride, 1000);
        assert_eq!(config.frames.start, 2000);
        assert_eq!(config.vocabulary.len(), 6);
    }
}
