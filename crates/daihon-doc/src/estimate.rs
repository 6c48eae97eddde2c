//! Narration duration heuristic.
//!
//! Two weighted classes: each glyph of a dense script (Hangul, kana, CJK
//! ideographs) costs `dense_glyph_secs`, each word of a sparse script costs
//! `sparse_word_secs`. The sum is rounded to the nearest 0.1s. Anything else
//! (punctuation, whitespace, emoji) is free.
//!
//! The estimate is provisional: once synthesis reports a measured duration
//! the store records that instead, until the content changes again.

use crate::config::EstimatorConfig;

/// Glyph and word counts that feed the estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScriptCounts {
    pub dense_glyphs: usize,
    pub sparse_words: usize,
}

/// Whether `c` belongs to a dense (one glyph ≈ one syllable) script.
pub fn is_dense_glyph(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7A3}'     // Hangul syllables
        | '\u{1100}'..='\u{11FF}'   // Hangul jamo
        | '\u{3130}'..='\u{318F}'   // Hangul compatibility jamo
        | '\u{3040}'..='\u{309F}'   // Hiragana
        | '\u{30A0}'..='\u{30FF}'   // Katakana
        | '\u{4E00}'..='\u{9FFF}'   // CJK unified ideographs
    )
}

/// Count dense glyphs and sparse words in `content`.
///
/// A sparse word is a maximal run of non-dense alphanumeric characters;
/// an apostrophe inside a run does not split it (`don't` is one word).
pub fn count(content: &str) -> ScriptCounts {
    let mut counts = ScriptCounts::default();
    let mut in_word = false;

    for c in content.chars() {
        if is_dense_glyph(c) {
            counts.dense_glyphs += 1;
            in_word = false;
        } else if c.is_alphanumeric() {
            if !in_word {
                counts.sparse_words += 1;
                in_word = true;
            }
        } else if c == '\'' || c == '\u{2019}' {
            // keep the current run open
        } else {
            in_word = false;
        }
    }

    counts
}

/// Round to the nearest tenth of a second.
pub fn round_tenth(secs: f64) -> f64 {
    (secs * 10.0).round() / 10.0
}

/// Content → estimated seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DurationEstimator {
    config: EstimatorConfig,
}

impl DurationEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate narration seconds for `content`. Total: empty text is `0.0`,
    /// and the result is never negative or NaN.
    pub fn estimate(&self, content: &str) -> f64 {
        let counts = count(content);
        let raw = counts.dense_glyphs as f64 * self.config.dense_glyph_secs
            + counts.sparse_words as f64 * self.config.sparse_word_secs;
        round_tenth(raw).max(0.0)
    }
}

/// Estimate with the default weights.
pub fn estimate(content: &str) -> f64 {
    DurationEstimator::default().estimate(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(estimate(""), 0.0);
        assert_eq!(estimate("  ...!?  "), 0.0);
    }

    #[test]
    fn test_ten_hangul_glyphs() {
        assert_eq!(estimate("가나다라마바사아자차"), 3.0);
    }

    #[test]
    fn test_sparse_words() {
        assert_eq!(estimate("Hello World"), 1.0);
        assert_eq!(estimate("don't stop"), 1.0);
        assert_eq!(count("Top 10 tips").sparse_words, 3);
    }

    #[test]
    fn test_mixed_scripts() {
        // 4 Hangul glyphs (1.2s) + 2 words (1.0s)
        assert_eq!(estimate("안녕하세 Rust lang"), 2.2);
        let counts = count("오늘은AI 이야기");
        assert_eq!(counts.dense_glyphs, 6);
        assert_eq!(counts.sparse_words, 1);
    }

    #[test]
    fn test_rounds_to_tenth() {
        // 7 glyphs * 0.3 = 2.1 (with float noise)
        assert_eq!(estimate("가나다라마바사"), 2.1);
        assert_eq!(round_tenth(0.25000001), 0.3);
        assert_eq!(round_tenth(0.04), 0.0);
    }

    #[test]
    fn test_custom_weights() {
        let estimator = DurationEstimator::new(EstimatorConfig {
            dense_glyph_secs: 0.2,
            sparse_word_secs: 0.4,
        });
        assert_eq!(estimator.estimate("가나 one two"), 1.2);
    }

    #[test]
    fn test_unvalidated_negative_weights_floor_at_zero() {
        let estimator = DurationEstimator::new(EstimatorConfig {
            dense_glyph_secs: 0.3,
            sparse_word_secs: -0.5,
        });
        assert_eq!(estimator.estimate("Hello World"), 0.0);
        let estimator = DurationEstimator::new(EstimatorConfig {
            dense_glyph_secs: f64::NAN,
            sparse_word_secs: 0.5,
        });
        assert_eq!(estimator.estimate("가나"), 0.0);
    }

    #[test]
    fn test_line_breaks_split_words() {
        assert_eq!(count("one\ntwo").sparse_words, 2);
        assert_eq!(count("하나\n둘").dense_glyphs, 3);
    }
}
