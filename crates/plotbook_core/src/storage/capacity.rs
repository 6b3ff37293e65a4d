//! Capacity-failure classification and size formatting.

use super::KvError;
use once_cell::sync::Lazy;
use regex::Regex;

static CAPACITY_SIGNATURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)QuotaExceeded|NS_ERROR_DOM_QUOTA_REACHED|SQLITE_FULL|SQLITE_TOOBIG|database or disk is full|string or blob too big",
    )
    .expect("valid capacity signature regex")
});

/// Legacy DOM exception codes for quota failures (WebKit/Blink, Gecko).
const CAPACITY_DOM_CODES: &[&str] = &["22", "1014"];

/// Whether a backend failure means the store ran out of room.
pub fn is_capacity_exceeded(err: &KvError) -> bool {
    if let Some(code) = err.code.as_deref() {
        if CAPACITY_DOM_CODES.contains(&code) || CAPACITY_SIGNATURE_RE.is_match(code) {
            return true;
        }
    }
    CAPACITY_SIGNATURE_RE.is_match(&err.message)
}

/// Formats a byte count as `B`, `KB` (one decimal) or `MB` (two decimals).
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    }
}
