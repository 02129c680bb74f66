//! Fixed-point parsing shared by the money types. Every amount is held as a whole number of hundredths.

/// Parses `123`, `123.4` or `123.45` into hundredths. Digits past the second decimal place must be zeros.
pub(crate) fn parse_hundredths(s: &str) -> Result<i64, String> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    let is_digits = |v: &str| v.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() || !is_digits(whole) || !is_digits(frac) {
        return Err(format!("'{s}' is not a decimal amount"));
    }
    if frac.len() > 2 && frac[2..].chars().any(|c| c != '0') {
        return Err(format!("'{s}' has more than two decimal places"));
    }
    let whole = whole.parse::<i64>().map_err(|e| format!("'{s}': {e}"))?;
    let cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|e| e.to_string())? * 10,
        _ => frac[..2].parse::<i64>().map_err(|e| e.to_string())?,
    };
    let value = whole.checked_mul(100).and_then(|v| v.checked_add(cents)).ok_or_else(|| format!("'{s}' is too large"))?;
    Ok(if negative { -value } else { value })
}

/// `1234` hundredths as `12.34`.
pub(crate) fn format_hundredths(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
