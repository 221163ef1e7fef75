//! Parsing of poll intervals such as `30s`, `1m` or `1h30m`.

use std::time::Duration;

use crate::{Error, Result};

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Parse a duration made of one or more `<number><unit>` pairs.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`; numbers may carry a
/// decimal fraction. The result must be strictly positive.
pub fn parse_interval(input: &str) -> Result<Duration> {
    let invalid = |reason: String| Error::InvalidInterval {
        input: input.to_string(),
        reason,
    };

    let s = input.trim();
    if s.is_empty() {
        return Err(invalid("no duration given".to_string()));
    }
    if s.starts_with('-') {
        return Err(invalid("must be positive".to_string()));
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let mut total: u128 = 0;
    let mut rest = s;

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        if number.is_empty() || number == "." {
            return Err(invalid(format!("expected a number before '{}'", unit)));
        }

        let unit_nanos = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3600 * NANOS_PER_SEC,
            "" => return Err(invalid(format!("missing unit after '{}'", number))),
            other => return Err(invalid(format!("unknown unit '{}'", other))),
        };

        let nanos = component_nanos(number, unit_nanos)
            .ok_or_else(|| invalid(format!("invalid number '{}'", number)))?;
        total = total
            .checked_add(nanos)
            .ok_or_else(|| invalid("duration too large".to_string()))?;
    }

    if total == 0 {
        return Err(invalid("must be positive".to_string()));
    }

    let nanos = u64::try_from(total).map_err(|_| invalid("duration too large".to_string()))?;
    Ok(Duration::from_nanos(nanos))
}

/// Nanoseconds for one `<number><unit>` pair, `None` if the number is malformed
fn component_nanos(number: &str, unit_nanos: u128) -> Option<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if fraction.contains('.') {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(unit_nanos)?;

    // Digits past nanosecond precision of the largest unit can't change the result
    let fraction = &fraction[..fraction.len().min(18)];
    if !fraction.is_empty() {
        let digits: u128 = fraction.parse().ok()?;
        let scale = 10u128.pow(fraction.len() as u32);
        nanos = nanos.checked_add(digits * unit_nanos / scale)?;
    }

    Some(nanos)
}
