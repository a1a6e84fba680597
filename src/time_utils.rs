// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for duration and date/time formatting.

use chrono::NaiveDateTime;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

/// Render a duration in seconds as `H:MM:SS`, with a `.ffffff` suffix when
/// there is a fractional part and a `N day(s), ` prefix past 24 hours.
///
/// The value is rounded to whole microseconds first. Negative durations
/// borrow from the day count, so -1 second reads `-1 day, 23:59:59`.
pub fn format_elapsed(seconds: f64) -> String {
    let total = (seconds * MICROS_PER_SECOND as f64).round_ties_even() as i64;

    let days = total.div_euclid(MICROS_PER_DAY);
    let rest = total.rem_euclid(MICROS_PER_DAY);

    let micros = rest % MICROS_PER_SECOND;
    let secs = rest / MICROS_PER_SECOND;
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);

    let mut out = String::new();
    if days != 0 {
        let plural = if days.abs() != 1 { "s" } else { "" };
        out.push_str(&format!("{days} day{plural}, "));
    }
    out.push_str(&format!("{h}:{m:02}:{s:02}"));
    if micros != 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    out
}

/// Capitalize the first letter of each word and lowercase the rest.
///
/// Any non-letter starts a new word, so `"strength training"` becomes
/// `"Strength Training"` and `"e-bike"` becomes `"E-Bike"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Format a database `DATETIME` the way the feeds expose it.
pub fn format_naive_datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}
