//! Timeline helpers
//!
//! - pointer position → slider ratio → media time
//! - chapters WebVTT parsing and lookup for the hover label
//! - human-readable durations
//!
//! # Example
//!
//! ```rust
//! use ober_core::timeline::{parse_chapters, hover_text};
//!
//! let vtt = "WEBVTT\n\n00:00.000 --> 01:00.000\nIntro\n\n01:00.000 --> 10:00.000\nMain part\n";
//! let chapters = parse_chapters(vtt).unwrap();
//! assert_eq!(hover_text(75.0, &chapters), "01:15 : Main part");
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One chapter of the chapters track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub start: f64,
    pub end: f64,
    pub title: String,
}

/// Horizontal extent of the slider in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderGeometry {
    pub left: f64,
    pub width: f64,
}

impl SliderGeometry {
    /// Position of `client_x` along the slider, clamped to [0, 1]
    pub fn ratio_at(&self, client_x: f64) -> f64 {
        if self.width <= 0.0 || !client_x.is_finite() {
            return 0.0;
        }
        ((client_x - self.left) / self.width).clamp(0.0, 1.0)
    }
}

/// Media time for a slider ratio
pub fn time_at_ratio(ratio: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0) * duration
}

/// `mm:ss`, or `hh:mm:ss` from one hour on. Empty for unknown or live durations.
pub fn seconds_to_human_readable(duration: f64) -> String {
    if !duration.is_finite() || duration < 0.0 {
        return String::new();
    }

    let total = duration.trunc() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Index of the chapter playing at `time`. On overlap the last one wins.
pub fn chapter_index_at(chapters: &[Chapter], time: f64) -> Option<usize> {
    chapters
        .iter()
        .rposition(|chapter| time >= chapter.start && time < chapter.end)
}

/// Slider hover label: `mm:ss` followed by the chapter title when there is one
pub fn hover_text(time: f64, chapters: &[Chapter]) -> String {
    let mut text = seconds_to_human_readable(time);
    if let Some(index) = chapter_index_at(chapters, time) {
        text.push_str(" : ");
        text.push_str(&chapters[index].title);
    }
    text
}

/// Padding-top percentage that keeps the container at `ratio` (`"16:9"` → 56.25)
pub fn aspect_ratio_padding(ratio: &str) -> Option<f64> {
    let (width, height) = ratio.split_once(':')?;
    let width: f64 = width.trim().parse().ok()?;
    let height: f64 = height.trim().parse().ok()?;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(height / width * 100.0)
}

/// Parse a chapters WebVTT file
pub fn parse_chapters(input: &str) -> Result<Vec<Chapter>> {
    let mut chapters = Vec::new();
    let mut lines = input.lines().map(|line| line.trim_end_matches('\r')).peekable();

    let header = lines.next().unwrap_or("").trim_start_matches('\u{feff}');
    if !header.starts_with("WEBVTT") {
        return Err(Error::InvalidChapters("missing WEBVTT header".to_string()));
    }

    // header metadata runs until the first blank line
    for line in lines.by_ref() {
        if line.is_empty() {
            break;
        }
    }

    while let Some(line) = lines.next() {
        if line.is_empty() {
            continue;
        }

        if line.starts_with("NOTE") || line.starts_with("STYLE") || line.starts_with("REGION") {
            for line in lines.by_ref() {
                if line.is_empty() {
                    break;
                }
            }
            continue;
        }

        let timing = if line.contains("-->") {
            line
        } else {
            match lines.next() {
                Some(next) if next.contains("-->") => next,
                _ => continue,
            }
        };
        let (start, end) = parse_timing_line(timing)?;

        let mut title = String::new();
        while let Some(text) = lines.peek() {
            if text.is_empty() {
                break;
            }
            if !title.is_empty() {
                title.push('\n');
            }
            title.push_str(text);
            lines.next();
        }

        chapters.push(Chapter { start, end, title });
    }

    Ok(chapters)
}

/// "00:01:00.000 --> 00:02:00.000 align:start"
fn parse_timing_line(line: &str) -> Result<(f64, f64)> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| Error::InvalidChapters(format!("invalid timing line: {}", line)))?;
    let end = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| Error::InvalidChapters(format!("missing end time: {}", line)))?;

    Ok((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

/// "hh:mm:ss.mmm" or "mm:ss.mmm"
fn parse_timestamp(ts: &str) -> Result<f64> {
    let invalid = || Error::InvalidChapters(format!("invalid timestamp: {}", ts));
    let number = |part: &str| part.replace(',', ".").parse::<f64>().map_err(|_| invalid());

    let parts: Vec<&str> = ts.split(':').collect();
    match parts[..] {
        [minutes, seconds] => Ok(number(minutes)? * 60.0 + number(seconds)?),
        [hours, minutes, seconds] => Ok(number(hours)? * 3600.0 + number(minutes)? * 60.0 + number(seconds)?),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAPTERS: &str = "WEBVTT
Kind: chapters

NOTE generated by the CMS
spans two lines

chapter-1
00:00:00.000 --> 00:01:00.000
Opening

00:01:00.000 --> 00:45:00,500 align:start
Interview

01:00:00.000 --> 01:10:00.000
Credits
";

    #[test]
    fn test_parse_chapters() {
        let chapters = parse_chapters(CHAPTERS).unwrap();

        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].title, "Opening");
        assert_eq!(chapters[1].end, 2700.5);
        assert_eq!(chapters[2].start, 3600.0);
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(parse_chapters("00:00.000 --> 00:01.000\nx"), Err(Error::InvalidChapters(_))));
    }

    #[test]
    fn test_invalid_timestamp() {
        let vtt = "WEBVTT\n\naa:00.000 --> 00:01.000\nBroken\n";
        assert!(parse_chapters(vtt).is_err());
    }

    #[test]
    fn test_human_readable_durations() {
        assert_eq!(seconds_to_human_readable(0.0), "00:00");
        assert_eq!(seconds_to_human_readable(75.9), "01:15");
        assert_eq!(seconds_to_human_readable(3599.0), "59:59");
        assert_eq!(seconds_to_human_readable(3725.0), "01:02:05");
        assert_eq!(seconds_to_human_readable(f64::INFINITY), "");
        assert_eq!(seconds_to_human_readable(f64::NAN), "");
    }

    #[test]
    fn test_hover_text() {
        let chapters = parse_chapters(CHAPTERS).unwrap();

        assert_eq!(hover_text(30.0, &chapters), "00:30 : Opening");
        assert_eq!(hover_text(60.0, &chapters), "01:00 : Interview");
        assert_eq!(hover_text(3000.0, &chapters), "50:00");
    }

    #[test]
    fn test_overlapping_chapters_last_wins() {
        let chapters = vec![
            Chapter { start: 0.0, end: 100.0, title: "Part".into() },
            Chapter { start: 10.0, end: 20.0, title: "Highlight".into() },
        ];
        assert_eq!(chapter_index_at(&chapters, 15.0), Some(1));
        assert_eq!(chapter_index_at(&chapters, 25.0), Some(0));
    }

    #[test]
    fn test_slider_ratio() {
        let slider = SliderGeometry { left: 100.0, width: 400.0 };

        assert_eq!(slider.ratio_at(300.0), 0.5);
        assert_eq!(slider.ratio_at(50.0), 0.0);
        assert_eq!(slider.ratio_at(900.0), 1.0);
        assert_eq!(time_at_ratio(0.5, 120.0), 60.0);
        assert_eq!(time_at_ratio(0.5, f64::NAN), 0.0);
    }

    #[test]
    fn test_aspect_ratio_padding() {
        assert_eq!(aspect_ratio_padding("16:9"), Some(56.25));
        assert_eq!(aspect_ratio_padding("4:3"), Some(75.0));
        assert_eq!(aspect_ratio_padding("wide"), None);
        assert_eq!(aspect_ratio_padding("0:9"), None);
    }
}
