//! Shared utility functions for the Runway application.

use axum::http::HeaderMap;
use chrono::{Datelike, TimeZone, Utc};
use sha2::{Digest, Sha256};

/// Hash a secret for database lookups (bearer tokens).
/// Uses SHA-256 with application salt, returns lowercase hex string.
pub fn hash_secret(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"runway-v1:");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Bucket a Unix timestamp into a `"Jan-2026"` style month label.
pub fn month_label(timestamp: i64) -> String {
    let dt = Utc
        .timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_else(Utc::now);
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    format!("{}-{}", MONTHS[dt.month0() as usize], dt.year())
}

/// The month labels for the last `count` months, oldest first, ending with
/// the month containing `now`.
pub fn last_months(now: i64, count: u32) -> Vec<String> {
    let dt = Utc.timestamp_opt(now, 0).single().unwrap_or_else(Utc::now);
    let mut year = dt.year();
    let mut month = dt.month() as i32;

    let mut labels = Vec::with_capacity(count as usize);
    for _ in 0..count {
        labels.push((year, month));
        month -= 1;
        if month == 0 {
            month = 12;
            year -= 1;
        }
    }
    labels.reverse();

    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    labels
        .into_iter()
        .map(|(y, m)| format!("{}-{}", MONTHS[(m - 1) as usize], y))
        .collect()
}

/// Epoch timestamp of the first instant of the month `n` months before the
/// month containing `now`.
pub fn month_start_n_months_ago(now: i64, n: u32) -> i64 {
    let dt = Utc.timestamp_opt(now, 0).single().unwrap_or_else(Utc::now);
    let mut year = dt.year();
    let mut month = dt.month() as i32 - n as i32;
    while month <= 0 {
        month += 12;
        year -= 1;
    }
    Utc.with_ymd_and_hms(year, month as u32, 1, 0, 0, 0)
        .single()
        .map(|d| d.timestamp())
        .unwrap_or(now)
}
