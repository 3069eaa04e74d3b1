use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Whole-word street suffix abbreviations, applied in this order.
const ABBREVIATIONS: [(&str, &str); 8] = [
    ("STREET", "ST"),
    ("AVENUE", "AVE"),
    ("ROAD", "RD"),
    ("DRIVE", "DR"),
    ("LANE", "LN"),
    ("COURT", "CT"),
    ("CIRCLE", "CIR"),
    ("PLACE", "PL"),
];

static SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    let words = ABBREVIATIONS.iter().map(|(long, _)| *long).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"\b(?:{words})\b")).expect("suffix pattern is valid")
});

/// Canonical matching key for a free-text street address.
///
/// Uppercases, turns `, . - #` into spaces, abbreviates common street suffixes
/// and collapses whitespace. Missing input yields the empty string.
pub fn normalize(raw: Option<&str>) -> String {
    let Some(raw) = raw else { return String::new() };

    let upper = raw.trim().to_uppercase()
        .chars()
        .map(|c| if matches!(c, ',' | '.' | '-' | '#') { ' ' } else { c })
        .collect::<String>();

    let abbreviated = SUFFIX.replace_all(&upper, |caps: &Captures| {
        ABBREVIATIONS.iter()
            .find(|(long, _)| *long == &caps[0])
            .map_or(caps[0].to_string(), |(_, short)| short.to_string())
    });

    abbreviated.split_whitespace().collect::<Vec<_>>().join(" ")
}
