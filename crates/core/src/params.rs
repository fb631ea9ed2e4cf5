//! Generation-parameter resolution.
//!
//! Request parameters are explicit optionals: an absent field falls back to
//! the preset default, a present value is taken as-is — including an
//! intentional zero. Either way the result is clamped into the effective
//! limit when one exists. Out-of-range input clamps to the nearest bound;
//! it never rejects the job.

use crate::catalog::{RangeFloat, RangeInt};

/// Resolve an integer parameter against its default and optional limit.
pub fn effective_int(user: Option<i64>, default: i64, limit: Option<RangeInt>) -> i64 {
    let value = user.unwrap_or(default);
    match limit {
        Some(range) => value.clamp(range.min, range.max),
        None => value,
    }
}

/// Resolve a float parameter against its default and optional limit.
pub fn effective_f64(user: Option<f64>, default: f64, limit: Option<RangeFloat>) -> f64 {
    let value = user.unwrap_or(default);
    match limit {
        Some(range) => value.clamp(range.min, range.max),
        None => value,
    }
}

/// Pick the user string when non-blank, else the default.
pub fn effective_str<'a>(user: Option<&'a str>, default: &'a str) -> &'a str {
    match user {
        Some(value) if !value.trim().is_empty() => value,
        _ => default,
    }
}
