// src/config/duration.rs

use std::time::Duration;

/// Units accepted after the number, longest suffix first.
const UNITS: [(&str, u64); 4] = [("ms", 1), ("s", 1_000), ("m", 60_000), ("h", 3_600_000)];

/// Parse `<n>ms`, `<n>s`, `<n>m` or `<n>h` into a [`Duration`].
///
/// The unit is mandatory, so `"3000"` is rejected instead of being guessed.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (digits, millis_per_unit) = UNITS
        .iter()
        .find_map(|(suffix, factor)| s.strip_suffix(suffix).map(|rest| (rest.trim_end(), *factor)))
        .ok_or_else(|| format!("duration {s:?} needs a unit: ms, s, m or h"))?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("duration {s:?} must start with a whole number"));
    }
    let value: u64 = digits
        .parse()
        .map_err(|e| format!("duration {s:?} is out of range: {e}"))?;

    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration {s:?} is out of range"))
}
