//! Normalized timed-lyric model shared by all parser front ends.

/// A single timed word within a lyric line.
///
/// `start` and `end` are seconds from track start; the word is "current"
/// during the half-open interval `[start, end)`. Invariant: `end >= start`.
#[derive(Debug, Clone, PartialEq)]
pub struct WordTiming {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl WordTiming {
    /// Create a new word timing.
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Fractional highlight progress (wipe) through this word at `at` seconds.
    ///
    /// Clamped to `[0, 1]`. A zero-duration word reports `0.0` so callers
    /// never divide by zero.
    #[must_use]
    pub fn progress(&self, at: f64) -> f32 {
        let span = self.end - self.start;
        if span <= 0.0 {
            return 0.0;
        }
        ((at - self.start) / span).clamp(0.0, 1.0) as f32
    }
}

/// One renderable lyric unit: a sung line or an adlib fragment.
///
/// Lines are immutable once parsed; a track's `Vec<LyricLine>` is replaced
/// wholesale on track change, never mutated in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LyricLine {
    /// Start offset in seconds; the line becomes a rendering candidate at or
    /// after this time.
    pub time: f64,
    /// Full display text. When word-level timing exists this is the word
    /// texts joined with spaces.
    pub text: String,
    /// Per-word timing, absent for line-granular formats like SRT.
    pub words: Option<Vec<WordTiming>>,
    /// Secondary/bracketed vocal, detected by a leading `(` in source text.
    pub is_adlib: bool,
}

impl LyricLine {
    /// A line with line-level timing only.
    pub fn plain(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
            words: None,
            is_adlib: false,
        }
    }

    /// A line built from word timings. The line starts at the first word's
    /// start and its display text is the word texts joined with spaces.
    #[must_use]
    pub fn from_words(words: Vec<WordTiming>, is_adlib: bool) -> Self {
        let time = words.first().map_or(0.0, |w| w.start);
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            time,
            text,
            words: Some(words),
            is_adlib,
        }
    }

    /// Upper bound of this line's active window.
    ///
    /// Main lines stay active until the next line begins (unbounded for the
    /// last line). Adlibs are short-lived overlays: they expire at their last
    /// word's `end`, or two seconds after their start without word timing.
    #[must_use]
    pub fn window_end(&self, next_line_start: Option<f64>) -> f64 {
        if self.is_adlib {
            self.words
                .as_ref()
                .and_then(|words| words.last())
                .map_or(self.time + 2.0, |w| w.end)
        } else {
            next_line_start.unwrap_or(f64::INFINITY)
        }
    }
}

/// Stable sort by start time; document order is preserved on ties.
pub fn sort_lines(lines: &mut [LyricLine]) {
    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_progress_bounds() {
        let word = WordTiming::new("hello", 10.0, 12.0);
        assert_eq!(word.progress(10.0), 0.0);
        assert_eq!(word.progress(12.0), 1.0);
        assert_eq!(word.progress(5.0), 0.0);
        assert_eq!(word.progress(20.0), 1.0);
        assert!((word.progress(11.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_word_progress_zero_duration() {
        let word = WordTiming::new("x", 3.0, 3.0);
        assert_eq!(word.progress(3.0), 0.0);
        assert_eq!(word.progress(4.0), 0.0);
    }

    #[test]
    fn test_from_words_joins_text() {
        let line = LyricLine::from_words(
            vec![
                WordTiming::new("Hello", 1.0, 1.5),
                WordTiming::new("world", 1.5, 2.0),
            ],
            false,
        );
        assert_eq!(line.time, 1.0);
        assert_eq!(line.text, "Hello world");
        assert!(!line.is_adlib);
    }

    #[test]
    fn test_main_line_window_bounded_by_next() {
        let line = LyricLine::plain(5.0, "main");
        assert_eq!(line.window_end(Some(9.0)), 9.0);
        assert_eq!(line.window_end(None), f64::INFINITY);
    }

    #[test]
    fn test_adlib_window_from_last_word() {
        let adlib = LyricLine::from_words(vec![WordTiming::new("(yeah)", 6.0, 7.2)], true);
        assert_eq!(adlib.window_end(Some(30.0)), 7.2);
    }

    #[test]
    fn test_adlib_window_without_words() {
        let adlib = LyricLine {
            time: 6.0,
            text: "(yeah)".to_string(),
            words: None,
            is_adlib: true,
        };
        assert_eq!(adlib.window_end(None), 8.0);
    }

    #[test]
    fn test_sort_lines_stable_on_ties() {
        let mut lines = vec![
            LyricLine::plain(2.0, "b"),
            LyricLine::plain(1.0, "a"),
            LyricLine::plain(1.0, "a2"),
        ];
        sort_lines(&mut lines);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["a", "a2", "b"]);
    }
}
