// Utility helpers for parsing and number formatting.
//
// This module centralizes all the "dirty" spreadsheet cell handling so the
// rest of the code can assume clean, typed values.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Text shown wherever a value is undefined.
pub const PLACEHOLDER: &str = "--";

/// Cell text the source uses for "not applicable" in percentage columns.
pub const NOT_APPLICABLE: &str = "--";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports (commas, spaces,
/// text).
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters, which also keeps
///   `inf` and `NaN` out.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a percentage cell such as `"23.5%"` into a fraction (`0.235`).
///
/// The trailing `%` is optional; the remainder is always divided by 100.
/// The not-applicable sentinel and anything unparseable yield `None`.
pub fn parse_percent(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s == NOT_APPLICABLE {
        return None;
    }
    let stripped = s.strip_suffix('%').unwrap_or(s);
    let fraction = parse_f64_safe(Some(stripped))? / 100.0;
    fraction.is_finite().then_some(fraction)
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Trimmed, non-empty text or `None`.
pub fn clean_text(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

pub fn average(v: &[f64]) -> Option<f64> {
    // Arithmetic mean; an empty slice has no mean.
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = group_thousands(int_part);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    // Values that round to zero print without a sign.
    if n.is_sign_negative() && s.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// Insert the locale separator every three digits of an unsigned digit
/// string. Works on the text so magnitudes beyond `i64` keep their digits.
fn group_thousands(digits: &str) -> String {
    let sep = Locale::en.separator();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * sep.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(sep);
        }
        out.push(ch);
    }
    out
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

/// Two-decimal percentage, e.g. `0.1234` -> `12.34%`.
pub fn format_percent(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{:.2}%", x * 100.0),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Thousands-separated value with zero decimals.
pub fn format_whole(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format_number(x, 0),
        _ => PLACEHOLDER.to_string(),
    }
}

/// One decimal place, used for cost-per-click.
pub fn format_one_decimal(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{:.1}", x),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn format_text(v: Option<&str>) -> String {
    v.map(str::to_string).unwrap_or_else(|| PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_with_separators() {
        assert_eq!(parse_f64_safe(Some(" 1,234.5 ")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("inf")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn percent_strips_marker_and_scales() {
        assert_eq!(parse_percent(Some("25%")), Some(0.25));
        assert_eq!(parse_percent(Some("12.5")), Some(0.125));
        assert_eq!(parse_percent(Some("--")), None);
        assert_eq!(parse_percent(Some(" -- ")), None);
        assert_eq!(parse_percent(Some("abc%")), None);
        assert_eq!(parse_percent(None), None);
    }

    #[test]
    fn parses_common_date_layouts() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_date_safe(Some("2024-01-05")), Some(d));
        assert_eq!(parse_date_safe(Some("2024/01/05")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-01-05 00:00:00")), Some(d));
        assert_eq!(parse_date_safe(Some("yesterday")), None);
        assert_eq!(parse_date_safe(Some("  ")), None);
    }

    #[test]
    fn formats_thousands_and_signs() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1234.4, 0), "-1,234");
        assert_eq!(format_number(-0.2, 0), "0");
        assert_eq!(format_whole(Some(98765.0)), "98,765");
        assert_eq!(format_whole(None), "--");
    }

    #[test]
    fn huge_magnitudes_keep_their_digits() {
        assert_eq!(format_whole(Some(1e19)), "10,000,000,000,000,000,000");
        assert_eq!(format_whole(Some(-1e19)), "-10,000,000,000,000,000,000");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1000.0, 0), "1,000");
    }

    #[test]
    fn percent_placeholder_for_undefined_and_non_finite() {
        assert_eq!(format_percent(Some(0.1234)), "12.34%");
        assert_eq!(format_percent(None), "--");
        assert_eq!(format_percent(Some(f64::INFINITY)), "--");
        assert_eq!(format_percent(Some(f64::NAN)), "--");
    }

    #[test]
    fn one_decimal_for_cpc() {
        assert_eq!(format_one_decimal(Some(45.26)), "45.3");
        assert_eq!(format_one_decimal(None), "--");
    }

    #[test]
    fn average_of_empty_is_none() {
        assert_eq!(average(&[]), None);
        assert_eq!(average(&[1.0, 2.0, 3.0]), Some(2.0));
    }
}
