// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for timestamps.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as RFC3339 with millisecond precision and a `Z` suffix.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current UTC time in unix seconds.
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}
