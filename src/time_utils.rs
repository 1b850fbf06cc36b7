// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with millisecond precision and a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Epoch milliseconds at which a token issued at `now` with a lifetime of
/// `expires_in` seconds expires. A missing lifetime means "already expired".
pub fn token_expiry_millis(now: DateTime<Utc>, expires_in: Option<i64>) -> i64 {
    now.timestamp_millis() + expires_in.unwrap_or(0).saturating_mul(1000)
}
