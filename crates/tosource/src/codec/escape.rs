//! String quoting and escaping for emitted literals.
//!
//! Safe mode produces string literals that stay inert when the generated
//! text is embedded in an HTML `<script>` block: every character that could
//! close the block or start markup is written as a `\uXXXX` escape. Unsafe
//! mode escapes only what literal syntax requires.

use std::borrow::Cow;

/// Escaping policy for emitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeMode {
    /// Neutralize markup-breaking characters.
    #[default]
    Safe,
    /// Escape only quote, backslash and line controls.
    Unsafe,
}

impl EscapeMode {
    /// Returns `Unsafe` when `unsafe_mode` is set, `Safe` otherwise.
    pub fn from_unsafe(unsafe_mode: bool) -> Self {
        if unsafe_mode {
            EscapeMode::Unsafe
        } else {
            EscapeMode::Safe
        }
    }
}

/// Returns the escape for `c` under `mode`, or `None` to copy it through.
#[inline]
fn escape_for(c: char, mode: EscapeMode) -> Option<&'static str> {
    match c {
        '"' => Some("\\\""),
        '\n' => Some("\\n"),
        '\r' => Some("\\r"),
        '\t' => Some("\\t"),
        '\\' => Some("\\u005C"),
        _ if mode == EscapeMode::Unsafe => None,
        '<' => Some("\\u003C"),
        '>' => Some("\\u003E"),
        '/' => Some("\\u002F"),
        '\u{2028}' => Some("\\u2028"),
        '\u{2029}' => Some("\\u2029"),
        _ => None,
    }
}

/// Appends `s` as a double-quoted string literal to `out`.
pub fn write_quoted(out: &mut String, s: &str, mode: EscapeMode) {
    out.reserve(s.len() + 2);
    out.push('"');
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if let Some(escape) = escape_for(c, mode) {
            out.push_str(&s[start..i]);
            out.push_str(escape);
            start = i + c.len_utf8();
        }
    }
    out.push_str(&s[start..]);
    out.push('"');
}

/// Quotes `s` as a string literal.
///
/// The empty string yields `""`.
pub fn quote_text(s: &str, mode: EscapeMode) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    write_quoted(&mut out, s, mode);
    out
}

/// Returns true if `key` can be written as a bare property name.
///
/// Matches `^[A-Za-z_$][A-Za-z_$0-9]+$`: at least two characters, so a
/// single-character key is always quoted.
pub fn is_bare_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.len() >= 2 && is_ident_start(bytes[0]) && bytes[1..].iter().all(|b| is_ident_part(*b))
}

/// Returns true if `name` can follow a `.` in an accessor path.
///
/// Unlike [`is_bare_key`], single-character names qualify.
pub fn is_path_identifier(name: &str) -> bool {
    let bytes = name.as_bytes();
    !bytes.is_empty() && is_ident_start(bytes[0]) && bytes[1..].iter().all(|b| is_ident_part(*b))
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

#[inline]
fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// Writes a property name, bare if possible, otherwise as a safe literal.
pub fn quote_key(key: &str) -> Cow<'_, str> {
    if is_bare_key(key) {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(quote_text(key, EscapeMode::Safe))
    }
}

/// Escapes tag-like sequences inside a function's source text.
///
/// In safe mode every `<` or `</` that starts a tag (`<` + optional `/` +
/// ASCII letter + anything up to the next `>`) gets its opening characters
/// written as `\u003C` / `\u002F`, so `</script>` inside a function body
/// cannot close an enclosing script block. All other characters are left
/// untouched, as the text is code rather than a string literal.
pub fn escape_callable_body(source: &str, mode: EscapeMode) -> Cow<'_, str> {
    if mode == EscapeMode::Unsafe || !source.contains('<') {
        return Cow::Borrowed(source);
    }

    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len() + 16);
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let slash = bytes.get(i + 1) == Some(&b'/');
        let name = if slash { i + 2 } else { i + 1 };
        let starts_tag = bytes.get(name).is_some_and(|b| b.is_ascii_alphabetic());
        let close = if starts_tag {
            source[name..].find('>').map(|off| name + off)
        } else {
            None
        };
        match close {
            Some(close) => {
                out.push_str(&source[copied..i]);
                out.push_str("\\u003C");
                if slash {
                    out.push_str("\\u002F");
                }
                out.push_str(&source[name..=close]);
                copied = close + 1;
                i = close + 1;
            }
            None => i += 1,
        }
    }
    out.push_str(&source[copied..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain() {
        assert_eq!(quote_text("", EscapeMode::Safe), "\"\"");
        assert_eq!(quote_text("hello", EscapeMode::Safe), "\"hello\"");
        assert_eq!(quote_text("unicode: \u{1F600}", EscapeMode::Safe), "\"unicode: \u{1F600}\"");
    }

    #[test]
    fn test_quote_string_with_quotes_and_newlines() {
        assert_eq!(
            quote_text("string's\n\"new\"   line", EscapeMode::Safe),
            r#""string's\n\"new\"   line""#
        );
    }

    #[test]
    fn test_quote_safe_markup() {
        assert_eq!(
            quote_text("<script>a>1</script>", EscapeMode::Safe),
            r#""\u003Cscript\u003Ea\u003E1\u003C\u002Fscript\u003E""#
        );
        assert_eq!(quote_text("\\", EscapeMode::Safe), r#""\u005C""#);
        assert_eq!(
            quote_text("\u{2028}\u{2029}", EscapeMode::Safe),
            r#""\u2028\u2029""#
        );
    }

    #[test]
    fn test_quote_unsafe_keeps_markup() {
        assert_eq!(
            quote_text("<script>a>1</script>", EscapeMode::Unsafe),
            "\"<script>a>1</script>\""
        );
        assert_eq!(
            quote_text("\t\"\\\u{2028}", EscapeMode::Unsafe),
            "\"\\t\\\"\\u005C\u{2028}\""
        );
    }

    #[test]
    fn test_full_unsafe_fixture() {
        let input = "<script type=\"application/javascript\">\u{2028}\u{2029}\nvar a = 0;\nvar b = 1; a > 1;\n</script>";
        assert_eq!(
            quote_text(input, EscapeMode::Safe),
            r#""\u003Cscript type=\"application\u002Fjavascript\"\u003E\u2028\u2029\nvar a = 0;\nvar b = 1; a \u003E 1;\n\u003C\u002Fscript\u003E""#
        );
        assert_eq!(
            quote_text(input, EscapeMode::Unsafe),
            "\"<script type=\\\"application/javascript\\\">\u{2028}\u{2029}\\nvar a = 0;\\nvar b = 1; a > 1;\\n</script>\""
        );
    }

    #[test]
    fn test_key_boundary() {
        assert_eq!(quote_key("four"), "four");
        assert_eq!(quote_key("$x"), "$x");
        assert_eq!(quote_key("_9"), "_9");
        assert_eq!(quote_key("5"), "\"5\"");
        assert_eq!(quote_key("a"), "\"a\"");
        assert_eq!(quote_key("se ven"), "\"se ven\"");
        assert_eq!(quote_key("thr-ee"), "\"thr-ee\"");
        assert_eq!(quote_key("4 four"), "\"4 four\"");
        assert_eq!(quote_key(""), "\"\"");
        assert_eq!(quote_key("caf\u{e9}"), "\"caf\u{e9}\"");
    }

    #[test]
    fn test_key_escaped_safely() {
        assert_eq!(
            quote_key("\\\": 0}; alert('xss')//"),
            r#""\u005C\": 0}; alert('xss')\u002F\u002F""#
        );
    }

    #[test]
    fn test_path_identifier() {
        assert!(is_path_identifier("a"));
        assert!(is_path_identifier("four"));
        assert!(!is_path_identifier("0"));
        assert!(!is_path_identifier("spa ce"));
        assert!(!is_path_identifier(""));
    }

    #[test]
    fn test_callable_body_escaping() {
        let src = "function xss () {\n const str = '</script><script>alert(\\'xss\\')//'\n}";
        assert_eq!(
            escape_callable_body(src, EscapeMode::Safe),
            "function xss () {\n const str = '\\u003C\\u002Fscript>\\u003Cscript>alert(\\'xss\\')//'\n}"
        );
        assert_eq!(escape_callable_body(src, EscapeMode::Unsafe), src);
    }

    #[test]
    fn test_callable_body_leaves_comparisons() {
        let src = "(a, b) => a < b && b > 0";
        assert_eq!(escape_callable_body(src, EscapeMode::Safe), src);
        let src = "(a) => a <b";
        assert_eq!(escape_callable_body(src, EscapeMode::Safe), src);
        let src = "(a) => a<b>c";
        assert_eq!(escape_callable_body(src, EscapeMode::Safe), "(a) => a\\u003Cb>c");
    }
}
