//! Word-count based timing for text display and word highlighting.
//!
//! Everything in here is a pure function of its inputs so it can be called
//! from any session, on any thread, as often as the UI likes.

use std::time::Duration;

pub const DEFAULT_MIN_DURATION_MS: u64 = 2000;
pub const DEFAULT_MAX_DURATION_MS: u64 = 10000;

/// Inclusive bounds applied to every computed display duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationBounds {
    pub min: Duration,
    pub max: Duration,
}

impl DurationBounds {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self::from_millis(DEFAULT_MIN_DURATION_MS, DEFAULT_MAX_DURATION_MS)
    }
}

/// Number of whitespace separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The words of `text` in order. Recomputed on every call.
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// How long `text` stays on screen: `seconds_per_word` per word, clamped to
/// `bounds`. Empty text gets `bounds.min`.
pub fn display_duration(text: &str, seconds_per_word: f64, bounds: DurationBounds) -> Duration {
    let raw_ms = word_count(text) as f64 * seconds_per_word * 1000.0;

    let raw = if raw_ms.is_nan() || raw_ms <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(raw_ms / 1000.0).unwrap_or(bounds.max)
    };

    raw.max(bounds.min).min(bounds.max)
}

/// Time allotted to each word when highlighting `word_count` words over
/// `total`. Zero words means there is nothing to highlight.
pub fn word_highlight_duration(total: Duration, word_count: usize) -> Duration {
    if word_count == 0 {
        return Duration::ZERO;
    }

    total.div_f64(word_count as f64)
}

pub fn format_word_count(word_count: i64) -> String {
    if word_count == 1 {
        return "1 word".to_string();
    }
    format!("{word_count} words")
}

/// Precomputed timing for one text: its words and how long each is shown.
#[derive(Debug, Clone, PartialEq)]
pub struct TextTiming<'a> {
    pub words: Vec<&'a str>,
    pub total: Duration,
    pub per_word: Duration,
}

impl<'a> TextTiming<'a> {
    pub fn compute(text: &'a str, seconds_per_word: f64, bounds: DurationBounds) -> Self {
        let words = words(text);
        let total = display_duration(text, seconds_per_word, bounds);
        let per_word = word_highlight_duration(total, words.len());

        Self {
            words,
            total,
            per_word,
        }
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Index of the word being "spoken" `elapsed` into the text phase.
    ///
    /// Once the schedule runs out the last word stays highlighted, so a late
    /// repaint never shows an unhighlighted text.
    pub fn highlighted_word(&self, elapsed: Duration) -> Option<usize> {
        if self.words.is_empty() {
            return None;
        }
        if self.per_word.is_zero() {
            return Some(self.words.len() - 1);
        }

        let idx = (elapsed.as_secs_f64() / self.per_word.as_secs_f64()) as usize;
        Some(idx.min(self.words.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARCUS: &str = "Men exist for the sake of one another.";

    #[test]
    fn test_word_count_basic() {
        assert_eq!(word_count(MARCUS), 8);
        assert_eq!(word_count("one"), 1);
    }

    #[test]
    fn test_word_count_empty_and_blank() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \t\n  "), 0);
    }

    #[test]
    fn test_word_count_collapses_whitespace_runs() {
        assert_eq!(word_count("  Teach   them\tthen\n\nor bear  "), 5);
    }

    #[test]
    fn test_words_matches_expected_tokens() {
        assert_eq!(
            words(MARCUS),
            vec!["Men", "exist", "for", "the", "sake", "of", "one", "another."]
        );
    }

    #[test]
    fn test_words_len_equals_word_count() {
        for text in ["", " a ", "a b  c", MARCUS, "\u{3000}full width\u{3000}space"] {
            assert_eq!(words(text).len(), word_count(text), "text: {text:?}");
        }
    }

    #[test]
    fn test_display_duration_within_default_bounds() {
        let d = display_duration(MARCUS, 0.5, DurationBounds::default());
        assert_eq!(d, Duration::from_millis(4000));
    }

    #[test]
    fn test_display_duration_empty_text_gets_minimum() {
        let d = display_duration("", 0.5, DurationBounds::default());
        assert_eq!(d, Duration::from_millis(DEFAULT_MIN_DURATION_MS));
    }

    #[test]
    fn test_display_duration_long_text_capped() {
        let text = "word ".repeat(500);
        let d = display_duration(&text, 1.0, DurationBounds::default());
        assert_eq!(d, Duration::from_millis(DEFAULT_MAX_DURATION_MS));
    }

    #[test]
    fn test_display_duration_always_in_bounds() {
        let bounds = DurationBounds::from_millis(1500, 6000);
        for text in ["", "one", MARCUS, "a b c d e f g h i j k l m n o p"] {
            for rate in [0.0, 0.1, 0.25, 0.5, 1.0, 3.0, 100.0] {
                let d = display_duration(text, rate, bounds);
                assert!(d >= bounds.min && d <= bounds.max, "{text:?} @ {rate}");
            }
        }
    }

    #[test]
    fn test_display_duration_degenerate_rates() {
        let bounds = DurationBounds::default();
        assert_eq!(display_duration(MARCUS, -1.0, bounds), bounds.min);
        assert_eq!(display_duration(MARCUS, f64::NAN, bounds), bounds.min);
        assert_eq!(display_duration(MARCUS, f64::INFINITY, bounds), bounds.max);
    }

    #[test]
    fn test_word_highlight_duration() {
        assert_eq!(
            word_highlight_duration(Duration::from_millis(4000), 8),
            Duration::from_millis(500)
        );
        assert_eq!(
            word_highlight_duration(Duration::from_millis(4000), 0),
            Duration::ZERO
        );
        assert_eq!(word_highlight_duration(Duration::ZERO, 0), Duration::ZERO);
    }

    #[test]
    fn test_format_word_count() {
        assert_eq!(format_word_count(1), "1 word");
        assert_eq!(format_word_count(0), "0 words");
        assert_eq!(format_word_count(8), "8 words");
        assert_eq!(format_word_count(-1), "-1 words");
    }

    #[test]
    fn test_text_timing_compute() {
        let timing = TextTiming::compute(MARCUS, 0.5, DurationBounds::default());
        assert_eq!(timing.word_count(), 8);
        assert_eq!(timing.total, Duration::from_millis(4000));
        assert_eq!(timing.per_word, Duration::from_millis(500));
    }

    #[test]
    fn test_text_timing_highlight_progression() {
        let timing = TextTiming::compute(MARCUS, 0.5, DurationBounds::default());
        assert_eq!(timing.highlighted_word(Duration::ZERO), Some(0));
        assert_eq!(timing.highlighted_word(Duration::from_millis(499)), Some(0));
        assert_eq!(timing.highlighted_word(Duration::from_millis(500)), Some(1));
        assert_eq!(timing.highlighted_word(Duration::from_millis(3999)), Some(7));
        // schedule exhausted
        assert_eq!(timing.highlighted_word(Duration::from_secs(60)), Some(7));
    }

    #[test]
    fn test_text_timing_empty_text_has_no_highlight() {
        let timing = TextTiming::compute("", 0.5, DurationBounds::default());
        assert_eq!(timing.per_word, Duration::ZERO);
        assert_eq!(timing.highlighted_word(Duration::from_millis(100)), None);
    }
}
