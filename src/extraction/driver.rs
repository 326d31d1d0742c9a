//! Frame extraction driver.
//!
//! Loads one frame image, reads the four fields, and assembles a
//! `FrameRecord`. The decoded image is dropped before returning.

use image::RgbImage;
use std::path::PathBuf;
use thiserror::Error;

use crate::extraction::config::{ExtractionConfig, Field, FieldKind, Roi};
use crate::extraction::record::{Character, FrameRecord};
use crate::ocr::{read_field, CharacterCorrector, TextRecognizer};

/// Why a frame produced no record.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame file not found: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("region {field} {roi} lies outside the {width}x{height} frame")]
    RoiOutOfBounds {
        field: &'static str,
        roi: Roi,
        width: u32,
        height: u32,
    },
}

impl FrameError {
    /// A misconfigured region affects every frame, so the batch must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::RoiOutOfBounds { .. })
    }

    /// Short label written to the failure log.
    pub fn label(&self) -> &'static str {
        match self {
            FrameError::NotFound { .. } => "not_found",
            FrameError::Unreadable { .. } => "unreadable",
            FrameError::Decode { .. } => "decode",
            FrameError::RoiOutOfBounds { .. } => "roi_out_of_bounds",
        }
    }
}

/// Reads structured records out of frame images.
pub struct FrameExtractor<'a> {
    config: &'a ExtractionConfig,
    recognizer: &'a dyn TextRecognizer,
    corrector: &'a dyn CharacterCorrector,
    name_whitelist: String,
    character_whitelist: String,
}

impl<'a> FrameExtractor<'a> {
    pub fn new(
        config: &'a ExtractionConfig,
        recognizer: &'a dyn TextRecognizer,
        corrector: &'a dyn CharacterCorrector,
    ) -> Self {
        Self {
            config,
            recognizer,
            corrector,
            name_whitelist: config.whitelist(FieldKind::PlayerName),
            character_whitelist: config.whitelist(FieldKind::PlayerCharacter),
        }
    }

    /// Loads and processes one frame.
    pub fn process_frame(&self, frame_id: u64) -> Result<FrameRecord, FrameError> {
        let image = self.load_frame(frame_id)?;
        self.extract_record(frame_id, &image)
    }

    /// Reads and decodes the frame file for `frame_id`.
    pub fn load_frame(&self, frame_id: u64) -> Result<RgbImage, FrameError> {
        let path = self.config.frame_path(frame_id);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FrameError::NotFound { path });
            }
            Err(source) => return Err(FrameError::Unreadable { path, source }),
        };

        match image::load_from_memory(&bytes) {
            Ok(img) => Ok(img.to_rgb8()),
            Err(source) => Err(FrameError::Decode { path, source }),
        }
    }

    /// Reads all four fields from an already decoded frame.
    pub fn extract_record(&self, frame_id: u64, image: &RgbImage) -> Result<FrameRecord, FrameError> {
        let (width, height) = image.dimensions();
        for field in Field::ALL {
            let roi = self.config.regions.roi(field);
            if !roi.fits_within(width, height) {
                return Err(FrameError::RoiOutOfBounds {
                    field: field.column(),
                    roi,
                    width,
                    height,
                });
            }
        }

        Ok(FrameRecord {
            frame_id,
            p1_name: self.read_text(frame_id, image, Field::Player1Name),
            p1_character: self.read_character(frame_id, image, Field::Player1Character),
            p2_name: self.read_text(frame_id, image, Field::Player2Name),
            p2_character: self.read_character(frame_id, image, Field::Player2Character),
        })
    }

    /// Trimmed recognizer output; a recognizer error yields an empty field.
    fn read_text(&self, frame_id: u64, image: &RgbImage, field: Field) -> String {
        let kind = field.kind();
        let whitelist = match kind {
            FieldKind::PlayerName => &self.name_whitelist,
            FieldKind::PlayerCharacter => &self.character_whitelist,
        };

        match read_field(
            image,
            &self.config.regions.roi(field),
            kind,
            &self.config.preprocess,
            self.recognizer,
            whitelist,
        ) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                crate::log(&format!(
                    "Frame {}: recognition failed for {}: {:#}",
                    frame_id,
                    field.column(),
                    e
                ));
                String::new()
            }
        }
    }

    fn read_character(&self, frame_id: u64, image: &RgbImage, field: Field) -> Character {
        let raw = self.read_text(frame_id, image, field);
        self.corrector.correct(&raw)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use anyhow::{anyhow, Result};
    use image::GrayImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::ocr::TextRecognizer;

    /// Returns fixed text per field kind, telling kinds apart by whitelist.
    pub struct StubRecognizer {
        pub name_text: &'static str,
        pub character_text: &'static str,
        pub character_whitelist: String,
        pub fail_characters: bool,
        calls: AtomicUsize,
    }

    impl StubRecognizer {
        pub fn new(name_text: &'static str, character_text: &'static str) -> Self {
            Self {
                name_text,
                character_text,
                character_whitelist: "BeefPorkOnionGarlicRiceNoodle".to_string(),
                fail_characters: false,
                calls: AtomicUsize::new(0),
            }
        }

        /// Number of `recognize` calls so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextRecognizer for StubRecognizer {
        fn name(&self) -> &str {
            "stub"
        }

        fn recognize(&self, _img: &GrayImage, whitelist: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if whitelist == self.character_whitelist {
                if self.fail_characters {
                    return Err(anyhow!("engine crashed"));
                }
                Ok(format!("{}\n", self.character_text))
            } else {
                Ok(format!("  {}\n", self.name_text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::StubRecognizer;
    use super::*;
    use crate::extraction::config::RegionConfig;
    use crate::ocr::FuzzyCorrector;
    use tempfile::tempdir;

    fn small_config(dir: &std::path::Path) -> ExtractionConfig {
        ExtractionConfig {
            frames_dir: dir.to_path_buf(),
            file_template: "frame_{frame}.png".to_string(),
            regions: RegionConfig {
                player_1_name: Roi::new(0, 0, 10, 5),
                player_2_name: Roi::new(10, 0, 10, 5),
                player_1_character: Roi::new(0, 5, 10, 5),
                player_2_character: Roi::new(10, 5, 10, 5),
            },
            ..Default::default()
        }
    }

    fn corrector(config: &ExtractionConfig) -> FuzzyCorrector {
        FuzzyCorrector::new(config.vocabulary.clone(), config.correction_threshold)
    }

    #[test]
    fn test_extract_record_trims_and_corrects() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path());
        let recognizer = StubRecognizer::new("AL", "Bcef");
        let corrector = corrector(&config);
        let extractor = FrameExtractor::new(&config, &recognizer, &corrector);

        let record = extractor
            .extract_record(2000, &RgbImage::new(20, 10))
            .unwrap();

        assert_eq!(record.frame_id, 2000);
        assert_eq!(record.p1_name, "AL");
        assert_eq!(record.p2_name, "AL");
        assert_eq!(record.p1_character, Character::Known("Beef".to_string()));
        assert_eq!(record.p2_character, Character::Known("Beef".to_string()));
    }

    #[test]
    fn test_recognition_error_is_field_level() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path());
        let mut recognizer = StubRecognizer::new("BO", "Pork");
        recognizer.fail_characters = true;
        let corrector = corrector(&config);
        let extractor = FrameExtractor::new(&config, &recognizer, &corrector);

        let record = extractor
            .extract_record(4000, &RgbImage::new(20, 10))
            .unwrap();

        // Names still come through when the character reads fail
        assert_eq!(record.p1_name, "BO");
        assert_eq!(record.p1_character, Character::Unknown);
        assert_eq!(record.p2_character, Character::Unknown);
    }

    #[test]
    fn test_roi_outside_frame_is_fatal() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path());
        let recognizer = StubRecognizer::new("AL", "Beef");
        let corrector = corrector(&config);
        let extractor = FrameExtractor::new(&config, &recognizer, &corrector);

        let err = extractor
            .extract_record(2000, &RgbImage::new(15, 10))
            .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(err.label(), "roi_out_of_bounds");
    }

    #[test]
    fn test_missing_frame_is_not_found() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path());
        let recognizer = StubRecognizer::new("AL", "Beef");
        let corrector = corrector(&config);
        let extractor = FrameExtractor::new(&config, &recognizer, &corrector);

        let err = extractor.process_frame(2000).unwrap_err();
        assert!(matches!(err, FrameError::NotFound { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_corrupt_frame_is_decode_error() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path());
        std::fs::write(config.frame_path(2000), b"not an image").unwrap();
        let recognizer = StubRecognizer::new("AL", "Beef");
        let corrector = corrector(&config);
        let extractor = FrameExtractor::new(&config, &recognizer, &corrector);

        let err = extractor.process_frame(2000).unwrap_err();
        assert!(matches!(err, FrameError::Decode { .. }));
        assert_eq!(err.label(), "decode");
    }

    #[test]
    fn test_process_frame_from_disk() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path());
        RgbImage::new(20, 10).save(config.frame_path(2000)).unwrap();
        let recognizer = StubRecognizer::new("AL", "Noodle");
        let corrector = corrector(&config);
        let extractor = FrameExtractor::new(&config, &recognizer, &corrector);

        let record = extractor.process_frame(2000).unwrap();
        assert_eq!(record.p2_character, Character::Known("Noodle".to_string()));
    }
}
