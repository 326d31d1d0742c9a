pub mod correct;
pub mod engine;
pub mod preprocess;
pub mod setup;

pub use correct::{CharacterCorrector, FuzzyCorrector};
pub use engine::{TesseractCli, TextRecognizer};

use anyhow::Result;
use image::RgbImage;

use crate::extraction::config::{FieldKind, PreprocessConfig, Roi};
use preprocess::{crop_region, preprocess};

/// High-level function: frame → field region → preprocessed image → raw text.
///
/// Returns the recognizer's untrimmed output; callers decide how to clean it.
pub fn read_field(
    img: &RgbImage,
    roi: &Roi,
    kind: FieldKind,
    preprocess_config: &PreprocessConfig,
    recognizer: &dyn TextRecognizer,
    whitelist: &str,
) -> Result<String> {
    let cropped = crop_region(img, roi);
    let prepared = preprocess(&cropped, kind, preprocess_config);
    recognizer.recognize(&prepared, whitelist)
}
