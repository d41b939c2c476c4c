// src/parse.rs
//! Tolerant numeric parsing for screener cells.
//!
//! Every parser here is total: blank, dash-placeholder, or otherwise
//! unparseable input resolves to `None`, never an error. Callers must treat
//! a missing metric as missing, not as zero.

/// Trim a possibly-absent text field down to a plain string.
pub fn clean_text(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn is_blank(value: &str) -> bool {
    value.is_empty() || value == "-"
}

/// Parse a plain decimal, stripping thousands separators.
pub fn parse_float(value: Option<&str>) -> Option<f64> {
    let v = value?.trim();
    if is_blank(v) {
        return None;
    }
    v.replace(',', "").parse().ok()
}

/// Parse a percentage cell like `"12.3%"` into `12.3`.
pub fn parse_percent(value: Option<&str>) -> Option<f64> {
    let v = value?.trim();
    if is_blank(v) {
        return None;
    }
    v.replace('%', "").replace(',', "").parse().ok()
}

/// Parse a unit-suffixed magnitude like `"1.2B"` into whole units.
/// Suffixes T/B/M/K are case-insensitive; no suffix means no scaling.
pub fn parse_market_cap(value: Option<&str>) -> Option<f64> {
    let v = value?.trim();
    if is_blank(v) {
        return None;
    }
    let cleaned = v.replace(',', "").to_ascii_uppercase();
    let (number, scale) = match cleaned.as_bytes().last() {
        Some(b'T') => (&cleaned[..cleaned.len() - 1], 1e12),
        Some(b'B') => (&cleaned[..cleaned.len() - 1], 1e9),
        Some(b'M') => (&cleaned[..cleaned.len() - 1], 1e6),
        Some(b'K') => (&cleaned[..cleaned.len() - 1], 1e3),
        _ => (cleaned.as_str(), 1.0),
    };
    number.parse::<f64>().ok().map(|n| n * scale)
}
