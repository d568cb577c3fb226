//! Strip markdown-like decoration from generated text

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADING_MARKER: Regex = Regex::new(r"#{1,6}\s?").unwrap();
    static ref EMPHASIS: Regex = Regex::new(r"[*_`]").unwrap();
    static ref REPEATED_PERIODS: Regex = Regex::new(r"\.{2,}").unwrap();
}

/// Clean one piece of generated text
///
/// Removes heading markers and emphasis characters, collapses runs of
/// periods to one, collapses whitespace to single spaces and trims.
/// `None` and blank input both yield an empty string.
pub fn normalize(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let text = HEADING_MARKER.replace_all(raw, "");
    let text = EMPHASIS.replace_all(&text, "");
    let text = REPEATED_PERIODS.replace_all(&text, ".");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
