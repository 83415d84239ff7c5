//! Last-resort extraction of a single score from text that is not JSON.

use std::sync::OnceLock;

use regex::Regex;

// Left boundary: start of text or a consumed character that is neither a
// digit nor a dot.
fn out_of_hundred() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^\d.])(\d{1,3}(?:\.\d+)?)\s*/\s*100(?:[^\d]|$)").expect("valid regex")
    })
}

fn bare_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^\d.])(\d{1,3}(?:\.\d+)?)(?:[^\d.]|\.(?:[^\d]|$)|$)").expect("valid regex")
    })
}

/// Finds a score in free text: an `NN/100` pattern wins, otherwise the first
/// standalone number below 1000. Decimals are rounded to the nearest
/// integer; the caller clamps the result.
pub fn salvage_score(text: &str) -> Option<u32> {
    out_of_hundred()
        .captures(text)
        .or_else(|| bare_number().captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|n| n.round() as u32)
}
