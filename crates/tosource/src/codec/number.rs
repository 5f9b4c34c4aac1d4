//! Canonical number text.
//!
//! Numbers are written the way `Number.prototype.toString` writes them: the
//! shortest digit string that round-trips, in positional notation for
//! exponents from -7 to 20 and `d.ddde+X` notation outside.

/// Formats a number as canonical literal text.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        // -0 prints as 0
        return "0".to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `1.2345e-7`.
    let scientific = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let mut out = String::with_capacity(digits.len() + 8);
    if value < 0.0 {
        out.push('-');
    }

    let k = digits.len() as i32;
    let n = exponent + 1;
    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat_n('0', (n - k) as usize));
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        out.push_str(int);
        out.push('.');
        out.push_str(frac);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', (-n) as usize));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        out.push('e');
        out.push(if n - 1 >= 0 { '+' } else { '-' });
        out.push_str(&(n - 1).abs().to_string());
    }
    out
}

/// Parses the text of a numeric literal token.
///
/// Accepts decimal literals with optional fraction and exponent, and
/// `0x`/`0o`/`0b` integers. Legacy octal (`017`), numeric separators and
/// BigInt suffixes are rejected.
pub fn parse_numeric_literal(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'0' {
        let radix = match bytes[1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return parse_radix(&text[2..], radix);
        }
    }

    let first = *bytes.first()?;
    if !(first.is_ascii_digit() || first == b'.') {
        return None;
    }
    if first == b'0' && bytes.get(1).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    if !bytes
        .iter()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }
    // a bare `.` or `1e` is rejected here
    text.parse::<f64>().ok()
}

fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    let mut value = 0f64;
    for c in digits.chars() {
        let digit = c.to_digit(radix)?;
        value = value * radix as f64 + digit as f64;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_special() {
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_format_integers() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-490.0), "-490");
        assert_eq!(format_number(10000000000.0), "10000000000");
        assert_eq!(format_number(2000000.0), "2000000");
        assert_eq!(format_number(123456789012345680000.0), "123456789012345680000");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-1.5e300), "-1.5e+300");
    }

    #[test]
    fn test_format_fractions() {
        assert_eq!(format_number(3.1414999961853027), "3.1414999961853027");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.25e-7), "1.25e-7");
        assert_eq!(format_number(123.456), "123.456");
        assert_eq!(format_number(f64::MIN_POSITIVE), "2.2250738585072014e-308");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_numeric_literal("0"), Some(0.0));
        assert_eq!(parse_numeric_literal("12.5"), Some(12.5));
        assert_eq!(parse_numeric_literal(".5"), Some(0.5));
        assert_eq!(parse_numeric_literal("1."), Some(1.0));
        assert_eq!(parse_numeric_literal("1e+21"), Some(1e21));
        assert_eq!(parse_numeric_literal("1E-7"), Some(1e-7));
        assert_eq!(parse_numeric_literal("0.000001"), Some(0.000001));
    }

    #[test]
    fn test_parse_radix() {
        assert_eq!(parse_numeric_literal("0xFF"), Some(255.0));
        assert_eq!(parse_numeric_literal("0o17"), Some(15.0));
        assert_eq!(parse_numeric_literal("0B101"), Some(5.0));
        assert_eq!(parse_numeric_literal("0x"), None);
        assert_eq!(parse_numeric_literal("0xG"), None);
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(parse_numeric_literal(""), None);
        assert_eq!(parse_numeric_literal("017"), None);
        assert_eq!(parse_numeric_literal("00"), None);
        assert_eq!(parse_numeric_literal("1n"), None);
        assert_eq!(parse_numeric_literal("1_000"), None);
        assert_eq!(parse_numeric_literal("inf"), None);
        assert_eq!(parse_numeric_literal("1e"), None);
        assert_eq!(parse_numeric_literal("."), None);
    }

    #[test]
    fn test_format_parse_agree() {
        for value in [0.1, 1e21, 1e-7, 5e-324, 1.7976931348623157e308, 42.0, 0.000123] {
            assert_eq!(parse_numeric_literal(&format_number(value)), Some(value));
        }
    }
}
