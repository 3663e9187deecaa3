use crate::types::Reading;
use once_cell::sync::Lazy;
use regex::Regex;

/// First decimal number immediately followed by the flow unit. OCR sometimes
/// renders the superscript as a literal `³`, so both glyphs are accepted.
static FLOW_RATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*m[3³]/s").unwrap());

/// Extracts a unit-qualified flow value from recognized text. A miss is not
/// an error: OCR misreads degrade to zero rather than aborting the cycle.
pub fn extract_flow_value(text: &str) -> f64 {
    FLOW_RATE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Builds a Reading from the three raw recognized strings. Always returns a
/// Reading; numeric misses come back as zero. The timestamp text is used
/// verbatim as the dedup key, so OCR instability in it shows up as
/// duplicate-looking or missed entries rather than being corrected here.
pub fn parse_reading(last_update: &str, turbine_text: &str, pond_hatch_text: &str) -> Reading {
    Reading::new(
        last_update,
        extract_flow_value(turbine_text),
        extract_flow_value(pond_hatch_text),
    )
}
