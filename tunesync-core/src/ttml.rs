//! TTML timed-text parsing.
//!
//! The backend ships word-synced lyrics as TTML: `<p>` elements are lines
//! carrying `begin`/`end` attributes, `<span>` children are words with their
//! own timing. Two heuristics observed in real-world lyric files are
//! preserved deliberately rather than "fixed":
//!
//! - Directly adjacent spans (no intervening text node) belong to one visual
//!   word that the source split across timing spans (letter-by-letter karaoke
//!   markup) and are merged; any text between spans, including whitespace,
//!   separates words.
//! - A word whose trimmed text starts with `(` opens a bracketed adlib run,
//!   closed by a trailing `)`. A run appearing after regular words splits the
//!   paragraph into a main line plus separate adlib line(s).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::Result;
use crate::lyrics::{sort_lines, LyricLine, WordTiming};

/// Parse a TTML document into lyric lines, sorted by start time.
///
/// Structurally odd paragraphs degrade to skipped or partial lines; only a
/// malformed XML stream is an error. `<tt></tt>` yields an empty vec.
pub fn parse_ttml(input: &str) -> Result<Vec<LyricLine>> {
    let mut reader = Reader::from_str(input);
    let mut lines: Vec<LyricLine> = Vec::new();
    let mut paragraph: Option<Paragraph> = None;
    let mut span: Option<Span> = None;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => match e.name().as_ref() {
                b"p" => {
                    paragraph = Some(Paragraph::new(attr_time(&e, b"begin")));
                    span = None;
                }
                b"span" => {
                    if paragraph.is_some() {
                        span = Some(Span {
                            start: attr_time(&e, b"begin"),
                            end: attr_time(&e, b"end"),
                            text: String::new(),
                        });
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"p" => {
                    if let Some(p) = paragraph.take() {
                        p.finish(&mut lines);
                    }
                    span = None;
                }
                b"span" => {
                    if let (Some(p), Some(s)) = (paragraph.as_mut(), span.take()) {
                        p.push_span(s);
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if let Ok(txt) = e.unescape() {
                    if let Some(s) = span.as_mut() {
                        s.text.push_str(&txt);
                    } else if let Some(p) = paragraph.as_mut() {
                        if !txt.is_empty() {
                            p.pending_separator = true;
                        }
                        p.text.push_str(&txt);
                    }
                }
            }
            _ => {}
        }
    }

    // Source order is not trusted; ties keep document order.
    sort_lines(&mut lines);
    Ok(lines)
}

/// Parse a TTML time expression to seconds.
///
/// Accepts `<number>s`, `H:MM:SS[.fff]`, `MM:SS[.fff]`, or a bare number of
/// seconds. Missing or unparsable values map to `0` so a single bad
/// timestamp never sinks the document.
#[must_use]
pub fn parse_time_value(value: &str) -> f64 {
    parse_time_inner(value).unwrap_or(0.0)
}

fn parse_time_inner(value: &str) -> Option<f64> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.strip_suffix('s').unwrap_or(s);
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [secs] => secs.trim().parse::<f64>().ok(),
        [minutes, secs] => {
            let minutes: f64 = minutes.trim().parse().ok()?;
            let secs: f64 = secs.trim().parse().ok()?;
            Some(minutes * 60.0 + secs)
        }
        [hours, minutes, secs] => {
            let hours: f64 = hours.trim().parse().ok()?;
            let minutes: f64 = minutes.trim().parse().ok()?;
            let secs: f64 = secs.trim().parse().ok()?;
            Some(hours * 3600.0 + minutes * 60.0 + secs)
        }
        _ => None,
    }
}

fn attr_time(e: &BytesStart<'_>, key: &[u8]) -> f64 {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map_or(0.0, |attr| {
            parse_time_value(&String::from_utf8_lossy(&attr.value))
        })
}

/// A word-level span while its events are still streaming in.
struct Span {
    start: f64,
    end: f64,
    text: String,
}

/// Accumulated state for the `<p>` currently being read.
struct Paragraph {
    begin: f64,
    words: Vec<WordTiming>,
    /// Bare text content outside spans, used when the paragraph has no spans.
    text: String,
    saw_span: bool,
    /// Text content seen since the last span closed; blocks the merge.
    pending_separator: bool,
}

impl Paragraph {
    fn new(begin: f64) -> Self {
        Self {
            begin,
            words: Vec::new(),
            text: String::new(),
            saw_span: false,
            pending_separator: true,
        }
    }

    fn push_span(&mut self, span: Span) {
        self.saw_span = true;
        if !self.pending_separator {
            if let Some(last) = self.words.last_mut() {
                // Same visual word split across timing spans: concatenate,
                // keep the first start, take the last end.
                last.text.push_str(&span.text);
                last.end = span.end;
                return;
            }
        }
        self.words.push(WordTiming::new(span.text, span.start, span.end));
        self.pending_separator = false;
    }

    fn finish(self, lines: &mut Vec<LyricLine>) {
        if self.saw_span {
            let words: Vec<WordTiming> = self
                .words
                .into_iter()
                .filter(|w| !w.text.trim().is_empty())
                .collect();
            if words.is_empty() {
                return;
            }
            for (run, is_adlib) in split_adlib_runs(words) {
                lines.push(LyricLine::from_words(run, is_adlib));
            }
        } else {
            let text = self.text.trim();
            if text.is_empty() {
                return;
            }
            lines.push(LyricLine {
                time: self.begin,
                text: text.to_string(),
                words: None,
                is_adlib: text.starts_with('('),
            });
        }
    }
}

/// Group a paragraph's words into main and bracketed adlib runs.
fn split_adlib_runs(words: Vec<WordTiming>) -> Vec<(Vec<WordTiming>, bool)> {
    let mut runs: Vec<(Vec<WordTiming>, bool)> = Vec::new();
    let mut current: Vec<WordTiming> = Vec::new();
    let mut in_adlib = false;

    for word in words {
        let trimmed = word.text.trim();
        if !in_adlib && trimmed.starts_with('(') {
            if !current.is_empty() {
                runs.push((std::mem::take(&mut current), false));
            }
            in_adlib = true;
        }
        let closes = in_adlib && trimmed.ends_with(')');
        current.push(word);
        if closes {
            runs.push((std::mem::take(&mut current), true));
            in_adlib = false;
        }
    }
    if !current.is_empty() {
        runs.push((current, in_adlib));
    }
    runs
}
