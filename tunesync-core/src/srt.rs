//! SRT subtitle parsing.
//!
//! An SRT payload is a sequence of blocks: a numeric index line, a
//! `HH:MM:SS,mmm --> HH:MM:SS,mmm` range line, one or more text lines, then a
//! blank separator. Only the start timestamp is kept; the backend owns real
//! playback timing and the range end is never consulted. Malformed blocks are
//! skipped rather than failing the whole payload.

use crate::lyrics::LyricLine;

/// Parse an SRT payload into lyric lines.
///
/// Lines carry no word-level timing (SRT is line-granular only) and are never
/// adlibs. Empty input yields an empty vec, not an error.
#[must_use]
pub fn parse_srt(input: &str) -> Vec<LyricLine> {
    let mut out = Vec::new();
    let mut iter = input.lines().peekable();

    while let Some(line) = iter.next() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // A block opens with a bare integer index. The index itself is not
        // used; anything else between blocks is noise and gets skipped.
        if !is_index_line(line) {
            continue;
        }

        let Some(time_line) = iter.next() else {
            break;
        };
        let Some(start) = parse_start_time(time_line.trim()) else {
            // Malformed or missing range line: drop this block, keep going.
            continue;
        };

        let mut text_lines = Vec::new();
        while let Some(next) = iter.peek() {
            let next = next.trim();
            if next.is_empty() {
                break;
            }
            text_lines.push(next.to_string());
            iter.next();
        }

        if !text_lines.is_empty() {
            out.push(LyricLine::plain(start, text_lines.join("\n")));
        }
    }

    out
}

fn is_index_line(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

/// Extract the start timestamp from a `H:MM:SS,mmm --> H:MM:SS,mmm` line.
fn parse_start_time(time_line: &str) -> Option<f64> {
    if !time_line.contains("-->") {
        return None;
    }
    let start = time_line.split("-->").next()?.trim();
    let (hms, millis) = start.split_once(',')?;
    let mut parts = hms.split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    let seconds: u32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let millis: u32 = millis.trim().parse().ok()?;

    Some(
        f64::from(hours) * 3600.0
            + f64::from(minutes) * 60.0
            + f64::from(seconds)
            + f64::from(millis) / 1000.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_block() {
        let input = "1\n00:00:05,500 --> 00:00:08,000\nHello world\n";
        let lines = parse_srt(input);
        assert_eq!(lines.len(), 1);
        assert!((lines[0].time - 5.5).abs() < 1e-9);
        assert_eq!(lines[0].text, "Hello world");
        assert!(lines[0].words.is_none());
        assert!(!lines[0].is_adlib);
    }

    #[test]
    fn test_parse_multiple_blocks_in_order() {
        let input = "\
1
00:00:01,000 --> 00:00:02,000
First

2
00:00:03,000 --> 00:00:04,000
Second

3
00:01:05,250 --> 00:01:07,000
Third
";
        let lines = parse_srt(input);
        assert_eq!(lines.len(), 3);
        let times: Vec<f64> = lines.iter().map(|l| l.time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(lines[2].text, "Third");
        assert!((lines[2].time - 65.25).abs() < 1e-9);
    }

    #[test]
    fn test_multiline_text_joined_with_newline() {
        let input = "1\n00:00:01,000 --> 00:00:02,000\nLine one\nLine two\n";
        let lines = parse_srt(input);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Line one\nLine two");
    }

    #[test]
    fn test_malformed_time_line_skips_block_only() {
        let input = "\
1
not a time line
Garbage

2
00:00:03,000 --> 00:00:04,000
Survivor
";
        let lines = parse_srt(input);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Survivor");
    }

    #[test]
    fn test_block_without_text_is_dropped() {
        let input = "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nKept\n";
        let lines = parse_srt(input);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Kept");
    }

    #[test]
    fn test_hours_contribute_to_start_time() {
        let input = "1\n01:02:03,004 --> 01:02:05,000\nLate\n";
        let lines = parse_srt(input);
        assert!((lines[0].time - (3600.0 + 123.0 + 0.004)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_srt("").is_empty());
        assert!(parse_srt("\n\n\n").is_empty());
    }

    #[test]
    fn test_stray_text_between_blocks_ignored() {
        let input = "WEBVTT-ish garbage\n\n1\n00:00:01,000 --> 00:00:02,000\nReal\n";
        let lines = parse_srt(input);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Real");
    }
}
