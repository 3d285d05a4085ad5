//! Highlight cursor: which line and word are active at a given playback time.

use crate::lyrics::LyricLine;

/// Derived highlight position, recomputed on every clock tick. Purely
/// transient; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Index of the active line, `None` before the first line or without
    /// lyrics.
    pub line: Option<usize>,
    /// Index of the active word within the active line, `None` when the line
    /// has no word timing or no word has started yet.
    pub word: Option<usize>,
}

impl Cursor {
    /// Locate the cursor for `lines` (sorted ascending by time) at `at`
    /// seconds.
    ///
    /// The active line is the latest-started line whose window still contains
    /// `at`: main lines stay active until the next line begins, while an
    /// expired adlib falls through to the line beneath it. The active word is
    /// scoped to the active line and recomputed from scratch, never carried
    /// over from another line.
    #[must_use]
    pub fn locate(lines: &[LyricLine], at: f64) -> Self {
        let Some(line_index) = active_line(lines, at) else {
            return Self::default();
        };
        Self {
            line: Some(line_index),
            word: active_word(&lines[line_index], at),
        }
    }
}

fn active_line(lines: &[LyricLine], at: f64) -> Option<usize> {
    for (i, line) in lines.iter().enumerate().rev() {
        if line.time > at {
            continue;
        }
        if line.is_adlib {
            if at < line.window_end(None) {
                return Some(i);
            }
            // Adlibs are overlays, not replacements: once expired, keep
            // scanning for the line they overlaid.
            continue;
        }
        return Some(i);
    }
    None
}

fn active_word(line: &LyricLine, at: f64) -> Option<usize> {
    let words = line.words.as_ref()?;
    words.iter().rposition(|w| w.start <= at)
}
