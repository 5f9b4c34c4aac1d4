//! ISO 8601 instant formatting and parsing.
//!
//! Converts between epoch milliseconds and the date-time string format used
//! by `Date.prototype.toISOString`:
//! - `YYYY-MM-DDTHH:mm:ss.sssZ` for years 0 through 9999
//! - `±YYYYYY-MM-DDTHH:mm:ss.sssZ` (expanded years) outside that range
//!
//! Parsing accepts the date-only forms (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`),
//! optional time with minutes, seconds and fractions, and a `Z` or
//! `±HH:mm` offset. Strings without an offset are read as UTC.

const MILLISECONDS_PER_SECOND: i64 = 1_000;
const MILLISECONDS_PER_MINUTE: i64 = 60 * MILLISECONDS_PER_SECOND;
const MILLISECONDS_PER_HOUR: i64 = 60 * MILLISECONDS_PER_MINUTE;
const MILLISECONDS_PER_DAY: i64 = 24 * MILLISECONDS_PER_HOUR;

/// Error type for ISO 8601 parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    pub message: String,
}

impl std::fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateTimeParseError {}

fn invalid(input: &str, what: &str) -> DateTimeParseError {
    DateTimeParseError {
        message: format!("Invalid {} in date-time: {}", what, input),
    }
}

/// Parses a timezone offset string (Z, +HH:MM, -HH:MM) and returns offset in minutes.
fn parse_timezone_offset(offset: &str) -> Result<i64, DateTimeParseError> {
    if offset == "Z" || offset == "z" {
        return Ok(0);
    }

    if offset.len() != 6 || offset.as_bytes()[3] != b':' {
        return Err(DateTimeParseError {
            message: format!("Invalid timezone offset: {}", offset),
        });
    }

    let sign = match offset.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => {
            return Err(DateTimeParseError {
                message: format!("Invalid timezone offset: {}", offset),
            });
        }
    };

    let hours = parse_digits(&offset[1..3]).ok_or_else(|| DateTimeParseError {
        message: format!("Invalid timezone offset: {}", offset),
    })?;
    let minutes = parse_digits(&offset[4..6]).ok_or_else(|| DateTimeParseError {
        message: format!("Invalid timezone offset: {}", offset),
    })?;

    if hours > 23 || minutes > 59 {
        return Err(DateTimeParseError {
            message: format!("Invalid timezone offset: {}", offset),
        });
    }

    Ok(sign * (hours * 60 + minutes))
}

/// Parses a run of ASCII digits; rejects signs and empty input.
fn parse_digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Returns true if the given year is a leap year.
fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Calculates days since Unix epoch for a given date.
fn date_to_days(year: i64, month: u32, day: u32) -> i64 {
    // Howard Hinnant's days_from_civil
    let y = if month <= 2 { year - 1 } else { year };
    let m = if month <= 2 {
        month as i64 + 9
    } else {
        month as i64 - 3
    };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400; // year of era
    let doy = (153 * m + 2) / 5 + day as i64 - 1; // day of year
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // day of era

    era * 146097 + doe - 719468
}

/// Converts days since Unix epoch to (year, month, day).
fn days_to_date(days: i64) -> (i64, u32, u32) {
    // Howard Hinnant's civil_from_days
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097; // day of era
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // year of era
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // day of year
    let mp = (5 * doy + 2) / 153; // month index
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32; // day
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32; // month

    let year = if m <= 2 { y + 1 } else { y };
    (year, m, d)
}

/// Formats milliseconds since the Unix epoch as an ISO 8601 instant in UTC.
pub fn format_iso_instant(epoch_ms: i64) -> String {
    let days = epoch_ms.div_euclid(MILLISECONDS_PER_DAY);
    let ms_of_day = epoch_ms.rem_euclid(MILLISECONDS_PER_DAY);
    let (year, month, day) = days_to_date(days);

    let hours = ms_of_day / MILLISECONDS_PER_HOUR;
    let minutes = ms_of_day % MILLISECONDS_PER_HOUR / MILLISECONDS_PER_MINUTE;
    let seconds = ms_of_day % MILLISECONDS_PER_MINUTE / MILLISECONDS_PER_SECOND;
    let millis = ms_of_day % MILLISECONDS_PER_SECOND;

    let year = if (0..=9999).contains(&year) {
        format!("{:04}", year)
    } else if year < 0 {
        format!("-{:06}", -year)
    } else {
        format!("+{:06}", year)
    };

    format!(
        "{}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year, month, day, hours, minutes, seconds, millis
    )
}

/// Parses an ISO 8601 date or date-time string into milliseconds since the
/// Unix epoch.
pub fn parse_iso_instant(input: &str) -> Result<i64, DateTimeParseError> {
    let (year, rest) = match input.as_bytes().first() {
        Some(b'+') | Some(b'-') => {
            let digits = input
                .get(1..7)
                .and_then(parse_digits)
                .ok_or_else(|| invalid(input, "year"))?;
            if input.starts_with('-') && digits == 0 {
                return Err(invalid(input, "year"));
            }
            let year = if input.starts_with('-') { -digits } else { digits };
            (year, &input[7..])
        }
        _ => {
            let year = input
                .get(..4)
                .and_then(parse_digits)
                .ok_or_else(|| invalid(input, "year"))?;
            (year, &input[4..])
        }
    };

    let (month, rest) = take_field(rest, '-', input, "month")?;
    let (day, rest) = if month.is_some() {
        take_field(rest, '-', input, "day")?
    } else {
        (None, rest)
    };
    let month = month.unwrap_or(1) as u32;
    let day = day.unwrap_or(1) as u32;

    if !(1..=12).contains(&month) {
        return Err(invalid(input, "month"));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(invalid(input, "day"));
    }

    let mut time_ms = 0;
    let mut offset_min = 0;
    if let Some(time) = rest.strip_prefix('T').or_else(|| rest.strip_prefix('t')) {
        let (ms, tz) = parse_time(time, input)?;
        time_ms = ms;
        if !tz.is_empty() {
            offset_min = parse_timezone_offset(tz)?;
        }
    } else if !rest.is_empty() {
        return Err(invalid(input, "trailing text"));
    }

    Ok(date_to_days(year, month, day) * MILLISECONDS_PER_DAY + time_ms
        - offset_min * MILLISECONDS_PER_MINUTE)
}

/// Takes `sep` followed by two digits from the front of `rest`.
fn take_field<'a>(
    rest: &'a str,
    sep: char,
    input: &str,
    what: &str,
) -> Result<(Option<i64>, &'a str), DateTimeParseError> {
    let Some(after) = rest.strip_prefix(sep) else {
        return Ok((None, rest));
    };
    let digits = after.get(..2).ok_or_else(|| invalid(input, what))?;
    let value = parse_digits(digits).ok_or_else(|| invalid(input, what))?;
    Ok((Some(value), &after[2..]))
}

/// Parses `HH:mm[:ss[.sss]]` and returns milliseconds of day plus the
/// unparsed offset text.
fn parse_time<'a>(time: &'a str, input: &str) -> Result<(i64, &'a str), DateTimeParseError> {
    let hours = time
        .get(..2)
        .and_then(parse_digits)
        .ok_or_else(|| invalid(input, "hours"))?;
    let (minutes, rest) = take_field(&time[2..], ':', input, "minutes")?;
    let minutes = minutes.ok_or_else(|| invalid(input, "minutes"))?;
    let (seconds, mut rest) = take_field(rest, ':', input, "seconds")?;
    let seconds = seconds.unwrap_or(0);

    let mut millis = 0;
    if let Some(frac) = rest.strip_prefix('.') {
        let end = frac
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(frac.len());
        if end == 0 {
            return Err(invalid(input, "fraction"));
        }
        // Truncate or pad to milliseconds
        let mut padded = frac[..end.min(3)].to_string();
        while padded.len() < 3 {
            padded.push('0');
        }
        millis = parse_digits(&padded).ok_or_else(|| invalid(input, "fraction"))?;
        rest = &frac[end..];
    }

    if minutes > 59 || seconds > 59 {
        return Err(invalid(input, "time"));
    }
    // 24:00 is allowed only as the end of a day
    if hours > 24 || (hours == 24 && (minutes != 0 || seconds != 0 || millis != 0)) {
        return Err(invalid(input, "hours"));
    }

    let ms = hours * MILLISECONDS_PER_HOUR
        + minutes * MILLISECONDS_PER_MINUTE
        + seconds * MILLISECONDS_PER_SECOND
        + millis;
    Ok((ms, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_epoch() {
        assert_eq!(format_iso_instant(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(
            format_iso_instant(24 * 12 * 3_600_000),
            "1970-01-13T00:00:00.000Z"
        );
        assert_eq!(format_iso_instant(-1), "1969-12-31T23:59:59.999Z");
        assert_eq!(
            format_iso_instant(1_460_737_372_009),
            "2016-04-15T16:22:52.009Z"
        );
    }

    #[test]
    fn test_format_expanded_years() {
        assert_eq!(
            format_iso_instant(8_640_000_000_000_000),
            "+275760-09-13T00:00:00.000Z"
        );
        assert_eq!(
            format_iso_instant(-8_640_000_000_000_000),
            "-271821-04-20T00:00:00.000Z"
        );
        assert_eq!(
            format_iso_instant(-62_198_755_200_000),
            "-000001-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn test_parse_roundtrip() {
        for ms in [
            0i64,
            -1,
            1_460_737_372_009,
            951_782_400_000, // 2000-02-29
            8_640_000_000_000_000,
            -8_640_000_000_000_000,
            -62_198_755_200_000,
        ] {
            let text = format_iso_instant(ms);
            assert_eq!(parse_iso_instant(&text), Ok(ms), "failed for {}", text);
        }
    }

    #[test]
    fn test_parse_short_forms() {
        assert_eq!(parse_iso_instant("1970"), Ok(0));
        assert_eq!(parse_iso_instant("1970-01"), Ok(0));
        assert_eq!(parse_iso_instant("1970-01-02"), Ok(MILLISECONDS_PER_DAY));
        assert_eq!(parse_iso_instant("1970-01-01T01:00"), Ok(MILLISECONDS_PER_HOUR));
        assert_eq!(parse_iso_instant("1970-01-01T00:00:01.5Z"), Ok(1_500));
        assert_eq!(parse_iso_instant("1970-01-01T00:00:00.123456Z"), Ok(123));
        assert_eq!(parse_iso_instant("1970-01-01T24:00:00Z"), Ok(MILLISECONDS_PER_DAY));
    }

    #[test]
    fn test_parse_offsets() {
        assert_eq!(
            parse_iso_instant("1970-01-01T01:00:00+01:00"),
            Ok(0)
        );
        assert_eq!(
            parse_iso_instant("1970-01-01T00:00:00-00:30"),
            Ok(30 * MILLISECONDS_PER_MINUTE)
        );
    }

    #[test]
    fn test_parse_rejects() {
        for text in [
            "",
            "Invalid Date",
            "1970-13-01",
            "1970-02-30",
            "1970-01-01T25:00",
            "1970-01-01T24:00:01",
            "1970-01-01T00:60",
            "1970-01-01T00:00:00+1:00",
            "-000000-01-01T00:00:00.000Z",
            "1970-01-01 junk",
            "1970-01-01T00:00:00.Z",
        ] {
            assert!(parse_iso_instant(text).is_err(), "accepted {:?}", text);
        }
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
    }
}
