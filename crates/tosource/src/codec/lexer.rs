//! Tokenizer for literal text.
//!
//! Splits source text into identifiers, keywords, punctuators and literal
//! tokens. Tokenizing never fails: characters that start no token and
//! unterminated literals become [`TokenKind::Invalid`] tokens, which the
//! sanitizer passes through and the parser rejects.

/// Token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Punctuator,
    Numeric,
    String,
    Template,
    RegularExpression,
    Boolean,
    Null,
    Invalid,
}

/// A token borrowing its text from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the token in the source.
    pub offset: usize,
}

impl<'a> Token<'a> {
    /// Byte offset just past the token.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    pub fn is_punct(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punctuator && self.text == punct
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == keyword
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == name
    }
}

const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "finally", "for", "function", "if", "import",
    "in", "instanceof", "let", "new", "return", "super", "switch", "this", "throw", "try",
    "typeof", "var", "void", "while", "with", "yield",
];

/// Punctuators, longest first within each leading character.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "<<", ">>", "**", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn is_id_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

fn is_id_continue(c: char) -> bool {
    c == '$' || c == '_' || c == '\u{200C}' || c == '\u{200D}' || c.is_alphanumeric()
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Splits `source` into tokens, skipping whitespace and comments.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer {
        source,
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.run();
    lexer.tokens
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    tokens: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            text: &self.source[start..self.pos],
            offset: start,
        });
    }

    /// Advances past characters matching `pred`.
    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        let len = self
            .rest()
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map(|(i, _)| i)
            .unwrap_or(self.rest().len());
        self.pos += len;
    }

    fn run(&mut self) {
        while let Some(c) = self.peek() {
            let start = self.pos;
            if c.is_whitespace() || c == '\u{FEFF}' {
                self.pos += c.len_utf8();
            } else if self.rest().starts_with("//") {
                self.eat_while(|c| !is_line_terminator(c));
            } else if self.rest().starts_with("/*") {
                match self.rest()[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => {
                        self.pos = self.source.len();
                        self.push(TokenKind::Invalid, start);
                    }
                }
            } else if is_id_start(c) || c == '\\' {
                self.identifier(start);
            } else if c.is_ascii_digit() || (c == '.' && self.peek_second().is_some_and(|d| d.is_ascii_digit())) {
                self.number(start);
            } else if c == '"' || c == '\'' {
                self.string(start, c);
            } else if c == '`' {
                self.template(start);
            } else if c == '/' && self.regex_allowed() {
                self.regex(start);
            } else if let Some(punct) = PUNCTUATORS.iter().find(|p| self.rest().starts_with(**p)) {
                self.pos += punct.len();
                self.push(TokenKind::Punctuator, start);
            } else {
                self.pos += c.len_utf8();
                self.push(TokenKind::Invalid, start);
            }
        }
    }

    fn identifier(&mut self, start: usize) {
        loop {
            self.eat_while(is_id_continue);
            // `\uXXXX` escapes inside identifiers are kept verbatim
            if self.rest().starts_with("\\u") {
                self.pos += 2;
            } else if self.rest().starts_with('\\') {
                self.pos += 1;
                self.push(TokenKind::Invalid, start);
                return;
            } else {
                break;
            }
        }
        let word = &self.source[start..self.pos];
        let kind = match word {
            "true" | "false" => TokenKind::Boolean,
            "null" => TokenKind::Null,
            _ if is_keyword(word) => TokenKind::Keyword,
            _ => TokenKind::Identifier,
        };
        self.push(kind, start);
    }

    fn number(&mut self, start: usize) {
        let rest = self.rest().as_bytes();
        let radix_prefix = rest.len() > 1
            && rest[0] == b'0'
            && matches!(rest[1], b'x' | b'X' | b'o' | b'O' | b'b' | b'B');
        if radix_prefix {
            self.pos += 2;
        } else {
            self.eat_while(|c| c.is_ascii_digit());
            if self.peek() == Some('.') {
                self.pos += 1;
                self.eat_while(|c| c.is_ascii_digit());
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let mut chars = self.rest().chars().skip(1);
                let next = chars.next();
                let exponent_follows = match next {
                    Some('+' | '-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
                    Some(c) => c.is_ascii_digit(),
                    None => false,
                };
                if exponent_follows {
                    self.pos += if matches!(next, Some('+' | '-')) { 2 } else { 1 };
                    self.eat_while(|c| c.is_ascii_digit());
                }
            }
        }
        // trailing identifier characters (`1n`, `3in`, `0xFF`) stay in the
        // token so the parser can reject or read them
        self.eat_while(is_id_continue);
        self.push(TokenKind::Numeric, start);
    }

    fn string(&mut self, start: usize, quote: char) {
        self.pos += 1;
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, '\r')) = chars.next() {
                        if self.rest()[i + 2..].starts_with('\n') {
                            chars.next();
                        }
                    }
                }
                '\n' | '\r' => {
                    self.pos += i;
                    self.push(TokenKind::Invalid, start);
                    return;
                }
                c if c == quote => {
                    self.pos += i + 1;
                    self.push(TokenKind::String, start);
                    return;
                }
                _ => {}
            }
        }
        self.pos = self.source.len();
        self.push(TokenKind::Invalid, start);
    }

    fn template(&mut self, start: usize) {
        self.pos += 1;
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '`' => {
                    self.pos += i + 1;
                    self.push(TokenKind::Template, start);
                    return;
                }
                _ => {}
            }
        }
        self.pos = self.source.len();
        self.push(TokenKind::Invalid, start);
    }

    /// A `/` starts a regular expression unless it follows something that
    /// ends an operand.
    fn regex_allowed(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(prev) => match prev.kind {
                TokenKind::Punctuator => !matches!(prev.text, ")" | "]" | "}"),
                TokenKind::Keyword => !matches!(prev.text, "this" | "super"),
                TokenKind::Invalid => true,
                _ => false,
            },
        }
    }

    fn regex(&mut self, start: usize) {
        self.pos += 1;
        let mut in_class = false;
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if chars.next().is_some_and(|(_, e)| is_line_terminator(e)) {
                        self.pos += i;
                        self.push(TokenKind::Invalid, start);
                        return;
                    }
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    self.pos += i + 1;
                    self.eat_while(is_id_continue);
                    self.push(TokenKind::RegularExpression, start);
                    return;
                }
                c if is_line_terminator(c) => {
                    self.pos += i;
                    self.push(TokenKind::Invalid, start);
                    return;
                }
                _ => {}
            }
        }
        self.pos = self.source.len();
        self.push(TokenKind::Invalid, start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, &str)> {
        tokenize(source).into_iter().map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn test_basic_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("{a: [1, 'x'], \"b\": null, c: true}"),
            vec![
                (Punctuator, "{"),
                (Identifier, "a"),
                (Punctuator, ":"),
                (Punctuator, "["),
                (Numeric, "1"),
                (Punctuator, ","),
                (String, "'x'"),
                (Punctuator, "]"),
                (Punctuator, ","),
                (String, "\"b\""),
                (Punctuator, ":"),
                (Null, "null"),
                (Punctuator, ","),
                (Identifier, "c"),
                (Punctuator, ":"),
                (Boolean, "true"),
                (Punctuator, "}"),
            ]
        );
    }

    #[test]
    fn test_keywords_and_arrows() {
        use TokenKind::*;
        assert_eq!(
            kinds("new Function(x => x)"),
            vec![
                (Keyword, "new"),
                (Identifier, "Function"),
                (Punctuator, "("),
                (Identifier, "x"),
                (Punctuator, "=>"),
                (Identifier, "x"),
                (Punctuator, ")"),
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("{/*[Circular]*/} // trailing"),
            vec![(TokenKind::Punctuator, "{"), (TokenKind::Punctuator, "}")]
        );
    }

    #[test]
    fn test_numbers() {
        use TokenKind::*;
        assert_eq!(
            kinds("1e+21 .5 0xFF 3.25 1n"),
            vec![
                (Numeric, "1e+21"),
                (Numeric, ".5"),
                (Numeric, "0xFF"),
                (Numeric, "3.25"),
                (Numeric, "1n"),
            ]
        );
    }

    #[test]
    fn test_strings_and_templates() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"'it\'s' "a\"b" `t${x}`"#),
            vec![(String, r"'it\'s'"), (String, r#""a\"b""#), (Template, "`t${x}`")]
        );
    }

    #[test]
    fn test_unterminated_literals_are_invalid() {
        assert_eq!(kinds("'abc"), vec![(TokenKind::Invalid, "'abc")]);
        assert_eq!(
            kinds("\"ab\ncd\""),
            vec![
                (TokenKind::Invalid, "\"ab"),
                (TokenKind::Identifier, "cd"),
                (TokenKind::Invalid, "\""),
            ]
        );
        assert_eq!(kinds("/* open"), vec![(TokenKind::Invalid, "/* open")]);
    }

    #[test]
    fn test_regex_versus_division() {
        use TokenKind::*;
        assert_eq!(
            kinds("[/a[/]b/gi, x / 2]"),
            vec![
                (Punctuator, "["),
                (RegularExpression, "/a[/]b/gi"),
                (Punctuator, ","),
                (Identifier, "x"),
                (Punctuator, "/"),
                (Numeric, "2"),
                (Punctuator, "]"),
            ]
        );
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            kinds("a # b"),
            vec![
                (TokenKind::Identifier, "a"),
                (TokenKind::Invalid, "#"),
                (TokenKind::Identifier, "b"),
            ]
        );
    }

    #[test]
    fn test_offsets() {
        let tokens = tokenize("  [ 12 ]");
        assert_eq!(tokens[1].offset, 4);
        assert_eq!(tokens[1].end(), 6);
    }
}
