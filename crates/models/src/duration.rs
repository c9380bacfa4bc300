//! Duration strings in the `72h3m0.5s` format used by load generators.
//!
//! A string is a possibly signed sequence of decimal numbers, each with an
//! optional fraction and a mandatory unit suffix. Valid units are `ns`,
//! `us` (or `µs`/`μs`), `ms`, `s`, `m` and `h`. The bare string `0` is also
//! accepted. Results must fit in an `i64` count of nanoseconds.

use chrono::Duration;
use thiserror::Error;

const MAX_NANOS: u64 = 1 << 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("invalid duration {0:?}")]
    Invalid(String),
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },
}

fn unit_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(1_000_000_000),
        "m" => Some(60_000_000_000),
        "h" => Some(3_600_000_000_000),
        _ => None,
    }
}

/// Parse a duration string into a signed [`chrono::Duration`].
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());

    let mut s = input;
    let mut negative = false;
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    if s == "0" {
        return Ok(Duration::zero());
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    while !s.is_empty() {
        if !s.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
            return Err(invalid());
        }

        let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
        let (int_digits, rest) = s.split_at(int_len);
        s = rest;
        let mut value: u64 = 0;
        for d in int_digits.bytes() {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(d - b'0')))
                .filter(|v| *v <= MAX_NANOS)
                .ok_or_else(invalid)?;
        }

        // Digits beyond what fits are dropped rather than rejected.
        let mut fraction: u64 = 0;
        let mut scale: f64 = 1.0;
        let mut frac_len = 0;
        if let Some(rest) = s.strip_prefix('.') {
            frac_len = rest.bytes().take_while(u8::is_ascii_digit).count();
            let (frac_digits, rest) = rest.split_at(frac_len);
            s = rest;
            let mut overflow = false;
            for d in frac_digits.bytes() {
                if overflow {
                    continue;
                }
                if fraction > (MAX_NANOS - 1) / 10 {
                    overflow = true;
                    continue;
                }
                let next = fraction * 10 + u64::from(d - b'0');
                if next > MAX_NANOS {
                    overflow = true;
                    continue;
                }
                fraction = next;
                scale *= 10.0;
            }
        }
        if int_len == 0 && frac_len == 0 {
            return Err(invalid());
        }

        let unit_len = s
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(s.len());
        if unit_len == 0 {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let (unit, rest) = s.split_at(unit_len);
        s = rest;
        let per_unit = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        if value > MAX_NANOS / per_unit {
            return Err(invalid());
        }
        value *= per_unit;
        if fraction > 0 {
            value += (fraction as f64 * (per_unit as f64 / scale)) as u64;
            if value > MAX_NANOS {
                return Err(invalid());
            }
        }
        total = total
            .checked_add(value)
            .filter(|t| *t <= MAX_NANOS)
            .ok_or_else(invalid)?;
    }

    if negative {
        // -2^63 is representable, so reinterpret before negating.
        return Ok(Duration::nanoseconds((total as i64).wrapping_neg()));
    }
    if total == MAX_NANOS {
        return Err(invalid());
    }
    Ok(Duration::nanoseconds(total as i64))
}
