//! Character label correction against the closed vocabulary.
//!
//! Raw icon OCR is noisy ("Bccf", "P0rk", stray whitespace), so every
//! recognized string is snapped to its closest vocabulary label, or to
//! `Unknown` when nothing is close enough.

use regex::Regex;
use std::sync::OnceLock;

use crate::extraction::record::Character;

/// Maps raw recognized text onto a character label.
pub trait CharacterCorrector: Send + Sync {
    fn correct(&self, raw: &str) -> Character;
}

/// Similarity between two strings on a 0-100 scale.
pub type Scorer = fn(&str, &str) -> u8;

/// Picks the best-scoring vocabulary entry and accepts it above a threshold.
pub struct FuzzyCorrector {
    vocabulary: Vec<String>,
    threshold: u8,
    scorer: Scorer,
}

impl FuzzyCorrector {
    pub fn new(vocabulary: Vec<String>, threshold: u8) -> Self {
        Self::with_scorer(vocabulary, threshold, similarity_ratio)
    }

    pub fn with_scorer(vocabulary: Vec<String>, threshold: u8, scorer: Scorer) -> Self {
        Self {
            vocabulary,
            threshold,
            scorer,
        }
    }

    /// Best vocabulary entry and its score. Ties keep the earliest entry.
    pub fn best_match(&self, raw: &str) -> Option<(&str, u8)> {
        let mut best: Option<(&str, u8)> = None;
        for label in &self.vocabulary {
            let score = (self.scorer)(raw, label);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((label.as_str(), score)),
            }
        }
        best
    }
}

impl CharacterCorrector for FuzzyCorrector {
    fn correct(&self, raw: &str) -> Character {
        match self.best_match(raw) {
            Some((label, score)) if score > self.threshold => Character::Known(label.to_string()),
            _ => Character::Unknown,
        }
    }
}

fn non_alphanumeric() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static pattern"))
}

/// Lowercases, turns runs of non-alphanumerics into single spaces, and trims.
pub fn normalize(text: &str) -> String {
    non_alphanumeric()
        .replace_all(&text.to_lowercase(), " ")
        .trim()
        .to_string()
}

/// Normalized Levenshtein similarity, rounded to 0-100.
///
/// Two strings that are both empty after normalization score 0: an empty
/// reading carries no evidence for any label.
pub fn similarity_ratio(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (strsim::normalized_levenshtein(&a, &b) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary() -> Vec<String> {
        ["Beef", "Pork", "Onion", "Garlic", "Rice", "Noodle"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn known(label: &str) -> Character {
        Character::Known(label.to_string())
    }

    #[test]
    fn test_exact_match() {
        let corrector = FuzzyCorrector::new(vocabulary(), 60);
        assert_eq!(corrector.correct("Garlic"), known("Garlic"));
    }

    #[test]
    fn test_noisy_match() {
        let corrector = FuzzyCorrector::new(vocabulary(), 60);
        assert_eq!(corrector.correct("Noodie"), known("Noodle"));
        assert_eq!(corrector.correct(" onion\n"), known("Onion"));
        assert_eq!(corrector.correct("Rce"), known("Rice"));
    }

    #[test]
    fn test_garbage_is_unknown() {
        let corrector = FuzzyCorrector::new(vocabulary(), 60);
        assert_eq!(corrector.correct("xyzzyq"), Character::Unknown);
        assert_eq!(corrector.correct(""), Character::Unknown);
    }

    #[test]
    fn test_score_of_exactly_threshold_is_rejected() {
        // "oni" vs "onion": 2 edits over 5 chars
        assert_eq!(similarity_ratio("Oni", "Onion"), 60);
        let corrector = FuzzyCorrector::new(vec!["Onion".to_string()], 60);
        assert_eq!(corrector.correct("Oni"), Character::Unknown);
    }

    #[test]
    fn test_threshold_boundary_with_fixed_scores() {
        fn score_60(_: &str, _: &str) -> u8 {
            60
        }
        fn score_61(_: &str, _: &str) -> u8 {
            61
        }

        let rejects = FuzzyCorrector::with_scorer(vocabulary(), 60, score_60);
        let accepts = FuzzyCorrector::with_scorer(vocabulary(), 60, score_61);

        assert_eq!(rejects.correct("anything"), Character::Unknown);
        assert_eq!(accepts.correct("anything"), known("Beef"));
    }

    #[test]
    fn test_tie_keeps_vocabulary_order() {
        // "pxrk" is one edit from both labels
        let forward = FuzzyCorrector::new(vec!["Pork".to_string(), "Park".to_string()], 60);
        let reverse = FuzzyCorrector::new(vec!["Park".to_string(), "Pork".to_string()], 60);

        assert_eq!(forward.correct("Pxrk"), known("Pork"));
        assert_eq!(reverse.correct("Pxrk"), known("Park"));
    }

    #[test]
    fn test_correction_is_deterministic() {
        let corrector = FuzzyCorrector::new(vocabulary(), 60);
        for raw in ["Bcef", "Onlon", "zz", "", "NOODLE", "Pxrk"] {
            let first = corrector.correct(raw);
            for _ in 0..10 {
                assert_eq!(corrector.correct(raw), first);
            }
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Beef!!\n"), "beef");
        assert_eq!(normalize("Gar-lic"), "gar lic");
        assert_eq!(normalize("--"), "");
    }

    #[test]
    fn test_best_match_empty_vocabulary() {
        let corrector = FuzzyCorrector::new(vec![], 60);
        assert!(corrector.best_match("Beef").is_none());
        assert_eq!(corrector.correct("Beef"), Character::Unknown);
    }
}
