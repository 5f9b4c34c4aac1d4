//! Literal text to value graph.
//!
//! Decoding reads the literal subset the encoder produces, plus the common
//! hand-written variations of it (single quotes, holes, trailing commas,
//! regex literals, `new Buffer(..)`). Nothing is evaluated: identifiers
//! other than the handful of literal names are rejected, and function
//! literals are captured as source text.
//!
//! Unless unsafe mode is requested the text is passed through
//! [`sanitize`](crate::codec::sanitize::sanitize) first.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::debug;

use crate::codec::lexer::{Token, TokenKind, tokenize};
use crate::codec::number::{format_number, parse_numeric_literal};
use crate::codec::sanitize::sanitize;
use crate::error::DecodeError;
use crate::limits::{MAX_DECODE_DEPTH, MAX_SOURCE_LEN, MAX_TYPED_ARRAY_LEN};
use crate::model::{Document, ElementKind, Graph, Handle, JsDate, Pattern, TypedArray, Value};
use crate::util::parse_iso_instant;

/// Standard alphabet, padding optional.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes literal text into a value graph.
///
/// In safe mode (`unsafe_mode == false`) the text is sanitized before
/// parsing, which strips function keywords that follow punctuation and
/// empty call parentheses; function values therefore only survive an
/// unsafe decode.
pub fn decode(text: &str, unsafe_mode: bool) -> Result<Document, DecodeError> {
    if text.len() > MAX_SOURCE_LEN {
        return Err(DecodeError::SourceTooLarge {
            len: text.len(),
            max: MAX_SOURCE_LEN,
        });
    }

    let sanitized;
    let source = if unsafe_mode {
        text
    } else {
        sanitized = sanitize(text);
        sanitized.as_str()
    };

    let result = parse_literal(source);
    if let Err(err) = &result {
        debug!(code = err.code().code(), %err, unsafe_mode, "decode failed");
    }
    result
}

/// Parses literal text as-is, without sanitizing it first.
pub fn parse_literal(source: &str) -> Result<Document, DecodeError> {
    if source.len() > MAX_SOURCE_LEN {
        return Err(DecodeError::SourceTooLarge {
            len: source.len(),
            max: MAX_SOURCE_LEN,
        });
    }
    Parser::new(source).parse_document()
}

fn unexpected(token: Token<'_>, expected: &'static str) -> DecodeError {
    if token.kind == TokenKind::Invalid {
        return DecodeError::InvalidToken {
            text: token.text.to_string(),
            offset: token.offset,
        };
    }
    DecodeError::UnexpectedToken {
        found: token.text.to_string(),
        expected,
        offset: token.offset,
    }
}

fn is_open(token: &Token<'_>) -> bool {
    token.kind == TokenKind::Punctuator && matches!(token.text, "(" | "[" | "{")
}

fn is_close(token: &Token<'_>) -> bool {
    token.kind == TokenKind::Punctuator && matches!(token.text, ")" | "]" | "}")
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    depth: usize,
    graph: Graph,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        let tokens = tokenize(source);
        Self {
            source,
            graph: Graph::with_capacity(tokens.len() / 2),
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn parse_document(mut self) -> Result<Document, DecodeError> {
        let root = self.parse_value()?;
        self.eat_punct(";");
        if let Some(token) = self.peek() {
            return Err(DecodeError::TrailingInput {
                found: token.text.to_string(),
                offset: token.offset,
            });
        }
        Ok(Document {
            graph: self.graph,
            root,
        })
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_at(&self, index: usize) -> Option<Token<'a>> {
        self.tokens.get(index).copied()
    }

    /// Consumes the next token, failing at the end of input or on an
    /// invalid token.
    fn next_token(&mut self, expected: &'static str) -> Result<Token<'a>, DecodeError> {
        let token = self
            .peek()
            .ok_or(DecodeError::UnexpectedEnd { expected })?;
        if token.kind == TokenKind::Invalid {
            return Err(unexpected(token, expected));
        }
        self.pos += 1;
        Ok(token)
    }

    fn expect_punct(
        &mut self,
        punct: &str,
        expected: &'static str,
    ) -> Result<Token<'a>, DecodeError> {
        let token = self.next_token(expected)?;
        if !token.is_punct(punct) {
            return Err(unexpected(token, expected));
        }
        Ok(token)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Index of the bracket closing the one at `open`, without consuming.
    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(open) {
            if is_open(token) {
                depth += 1;
            } else if is_close(token) {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
        }
        None
    }

    /// Consumes tokens up to and including the bracket closing one that was
    /// just consumed. Returns the end offset of the closing bracket.
    fn skip_balanced(&mut self) -> Result<usize, DecodeError> {
        let mut depth = 1usize;
        loop {
            let token = self
                .tokens
                .get(self.pos)
                .copied()
                .ok_or(DecodeError::UnexpectedEnd {
                    expected: "closing bracket",
                })?;
            self.pos += 1;
            if is_open(&token) {
                depth += 1;
            } else if is_close(&token) {
                depth -= 1;
                if depth == 0 {
                    return Ok(token.end());
                }
            }
        }
    }

    // =========================================================================
    // Values
    // =========================================================================

    fn parse_value(&mut self) -> Result<Handle, DecodeError> {
        self.depth += 1;
        if self.depth > MAX_DECODE_DEPTH {
            return Err(DecodeError::DepthExceeded {
                max: MAX_DECODE_DEPTH,
            });
        }
        let result = self.parse_primary();
        self.depth -= 1;
        result
    }

    fn parse_primary(&mut self) -> Result<Handle, DecodeError> {
        let token = self.next_token("value")?;
        match token.kind {
            TokenKind::Numeric => {
                let value = parse_number(token)?;
                Ok(self.graph.number(value))
            }
            TokenKind::String => {
                let text = cook_string(token)?;
                Ok(self.graph.text(text))
            }
            TokenKind::Template => {
                let text = cook_template(token)?;
                Ok(self.graph.text(text))
            }
            TokenKind::RegularExpression => {
                let pattern = parse_regex_literal(token)?;
                Ok(self.graph.insert(Value::Pattern(pattern)))
            }
            TokenKind::Null => Ok(self.graph.null()),
            TokenKind::Boolean => Ok(self.graph.bool(token.text == "true")),
            TokenKind::Identifier => self.parse_identifier(token),
            TokenKind::Keyword => match token.text {
                "new" => self.parse_new(),
                "function" => self.parse_function(token.offset),
                _ => Err(unexpected(token, "value")),
            },
            TokenKind::Punctuator => match token.text {
                "[" => {
                    let elements = self.parse_elements()?;
                    Ok(self.graph.insert(Value::Array(elements)))
                }
                "{" => self.parse_record(),
                "(" if self.arrow_at(self.pos - 1) => self.parse_arrow(token.offset, self.pos - 1),
                "(" => {
                    let inner = self.parse_value()?;
                    self.expect_punct(")", "`)`")?;
                    Ok(inner)
                }
                "-" | "+" => self.parse_signed(token),
                _ => Err(unexpected(token, "value")),
            },
            TokenKind::Invalid => Err(unexpected(token, "value")),
        }
    }

    fn parse_signed(&mut self, sign: Token<'a>) -> Result<Handle, DecodeError> {
        let operand = self.next_token("number")?;
        let value = match operand.kind {
            TokenKind::Numeric => parse_number(operand)?,
            TokenKind::Identifier if operand.text == "Infinity" => f64::INFINITY,
            TokenKind::Identifier if operand.text == "NaN" => f64::NAN,
            _ => {
                return Err(DecodeError::UnsupportedExpression {
                    context: "unary operator on a non-numeric operand",
                    offset: sign.offset,
                });
            }
        };
        let value = if sign.text == "-" { -value } else { value };
        Ok(self.graph.number(value))
    }

    fn parse_identifier(&mut self, token: Token<'a>) -> Result<Handle, DecodeError> {
        match token.text {
            "undefined" => return Ok(self.graph.undefined()),
            "NaN" => return Ok(self.graph.number(f64::NAN)),
            "Infinity" => return Ok(self.graph.number(f64::INFINITY)),
            "Buffer" => {
                self.expect_punct(".", "`.from`")?;
                let method = self.next_token("`from`")?;
                if !method.is_identifier("from") {
                    return Err(unexpected(method, "`from`"));
                }
                return self.construct_bytes(token.offset);
            }
            "async" => {
                if let Some(next) = self.peek() {
                    if next.is_keyword("function") {
                        self.pos += 1;
                        return self.parse_function(token.offset);
                    }
                    if self.arrow_at(self.pos) {
                        return self.parse_arrow(token.offset, self.pos);
                    }
                }
            }
            _ => {}
        }
        if self.arrow_at(self.pos - 1) {
            return self.parse_arrow(token.offset, self.pos - 1);
        }
        Err(DecodeError::UnknownIdentifier {
            name: token.text.to_string(),
            offset: token.offset,
        })
    }

    /// Parses array elements after the opening `[`.
    fn parse_elements(&mut self) -> Result<Vec<Option<Handle>>, DecodeError> {
        let mut elements = Vec::new();
        loop {
            let token = self.peek().ok_or(DecodeError::UnexpectedEnd {
                expected: "`]`",
            })?;
            if token.is_punct("]") {
                self.pos += 1;
                return Ok(elements);
            }
            if token.is_punct(",") {
                self.pos += 1;
                elements.push(None);
                continue;
            }
            elements.push(Some(self.parse_value()?));
            let token = self.next_token("`,` or `]`")?;
            if token.is_punct("]") {
                return Ok(elements);
            }
            if !token.is_punct(",") {
                return Err(unexpected(token, "`,` or `]`"));
            }
        }
    }

    /// Parses record members after the opening `{`.
    fn parse_record(&mut self) -> Result<Handle, DecodeError> {
        let record = self.graph.record();
        loop {
            let token = self.next_token("property name or `}`")?;
            if token.is_punct("}") {
                return Ok(record);
            }
            let key = property_key(token)?;
            self.expect_punct(":", "`:`")?;
            let value = self.parse_value()?;
            self.graph.set_member(record, key, value);

            let token = self.next_token("`,` or `}`")?;
            if token.is_punct("}") {
                return Ok(record);
            }
            if !token.is_punct(",") {
                return Err(unexpected(token, "`,` or `}`"));
            }
        }
    }

    // =========================================================================
    // Callables
    // =========================================================================

    /// Returns true if an arrow function's parameters start at token `index`.
    fn arrow_at(&self, index: usize) -> bool {
        let Some(token) = self.peek_at(index) else {
            return false;
        };
        let after = if token.is_punct("(") {
            match self.matching_close(index) {
                Some(close) => close + 1,
                None => return false,
            }
        } else if token.kind == TokenKind::Identifier {
            index + 1
        } else {
            return false;
        };
        self.peek_at(after).is_some_and(|t| t.is_punct("=>"))
    }

    /// Captures a `function` literal; the keyword has been consumed.
    fn parse_function(&mut self, start: usize) -> Result<Handle, DecodeError> {
        let mut parens = 0usize;
        loop {
            let token = self.next_token("function body")?;
            if token.is_punct("(") {
                parens += 1;
            } else if token.is_punct(")") {
                parens = parens.saturating_sub(1);
            } else if token.is_punct("{") && parens == 0 {
                break;
            }
        }
        let end = self.skip_balanced()?;
        Ok(self.graph.callable(&self.source[start..end]))
    }

    /// Captures an arrow function whose parameters start at token `params`.
    fn parse_arrow(&mut self, start: usize, params: usize) -> Result<Handle, DecodeError> {
        self.pos = params;
        let first = self.next_token("arrow parameters")?;
        if first.is_punct("(") {
            self.skip_balanced()?;
        }
        self.expect_punct("=>", "`=>`")?;

        let end = if self.eat_punct("{") {
            self.skip_balanced()?
        } else {
            self.skip_expression_body()?
        };
        Ok(self.graph.callable(&self.source[start..end]))
    }

    /// Consumes a concise arrow body up to the first unbalanced delimiter.
    fn skip_expression_body(&mut self) -> Result<usize, DecodeError> {
        let mut depth = 0usize;
        let mut end = None;
        while let Some(token) = self.peek() {
            if depth == 0
                && token.kind == TokenKind::Punctuator
                && matches!(token.text, "," | ")" | "]" | "}" | ";")
            {
                break;
            }
            if is_open(&token) {
                depth += 1;
            } else if is_close(&token) {
                depth -= 1;
            }
            end = Some(token.end());
            self.pos += 1;
        }
        end.ok_or(DecodeError::UnexpectedEnd {
            expected: "arrow function body",
        })
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    fn parse_new(&mut self) -> Result<Handle, DecodeError> {
        let name = self.next_token("constructor name")?;
        if name.kind != TokenKind::Identifier {
            return Err(unexpected(name, "constructor name"));
        }
        match name.text {
            "Date" => self.construct_date(name.offset),
            "RegExp" => self.construct_pattern(name.offset),
            "Error" => self.construct_error(name.offset),
            "Set" => self.construct_set(),
            "Map" => self.construct_map(),
            "Buffer" => self.construct_bytes(name.offset),
            other => match ElementKind::from_constructor_name(other) {
                Some(kind) => self.construct_typed_array(kind, name.offset),
                None => Err(DecodeError::UnsupportedConstructor {
                    name: other.to_string(),
                    offset: name.offset,
                }),
            },
        }
    }

    /// Parses a constructor argument list. A missing list (`new Error`) is
    /// an empty one.
    fn parse_arguments(&mut self) -> Result<Vec<Handle>, DecodeError> {
        let mut args = Vec::new();
        if !self.eat_punct("(") {
            return Ok(args);
        }
        loop {
            if self.eat_punct(")") {
                return Ok(args);
            }
            args.push(self.parse_value()?);
            let token = self.next_token("`,` or `)`")?;
            if token.is_punct(")") {
                return Ok(args);
            }
            if !token.is_punct(",") {
                return Err(unexpected(token, "`,` or `)`"));
            }
        }
    }

    fn arg(&self, args: &[Handle], index: usize) -> Option<&Value> {
        args.get(index).and_then(|h| self.graph.get(*h))
    }

    fn construct_date(&mut self, offset: usize) -> Result<Handle, DecodeError> {
        let mark = self.graph.len();
        let args = self.parse_arguments()?;
        let date = match (args.len(), self.arg(&args, 0)) {
            (0, _) => {
                return Err(DecodeError::UnsupportedExpression {
                    context: "`new Date` without arguments reads the clock",
                    offset,
                });
            }
            (1, Some(Value::Text(text))) => parse_iso_instant(text)
                .map(JsDate::from_epoch_ms)
                .unwrap_or_else(|_| JsDate::invalid()),
            (1, Some(Value::Number(time))) => JsDate::from_time_value(*time),
            (1, Some(Value::DateTime(date))) => *date,
            (1, _) => {
                return Err(DecodeError::InvalidArgument {
                    constructor: "Date",
                    reason: "expected a string, a number or a date",
                    offset,
                });
            }
            _ => {
                return Err(DecodeError::UnsupportedExpression {
                    context: "`new Date` with calendar fields depends on the local time zone",
                    offset,
                });
            }
        };
        self.graph.truncate(mark);
        Ok(self.graph.date(date))
    }

    fn construct_pattern(&mut self, offset: usize) -> Result<Handle, DecodeError> {
        let mark = self.graph.len();
        let args = self.parse_arguments()?;
        let (source, inherited) = match self.arg(&args, 0) {
            Some(Value::Text(text)) => (text.clone(), None),
            Some(Value::Pattern(pattern)) => (pattern.source.clone(), Some(pattern.flags.clone())),
            _ => {
                return Err(DecodeError::InvalidArgument {
                    constructor: "RegExp",
                    reason: "expected a pattern string",
                    offset,
                });
            }
        };
        let flags = match self.arg(&args, 1) {
            Some(Value::Text(flags)) => flags.clone(),
            None | Some(Value::Undefined) => inherited.unwrap_or_default(),
            Some(_) => {
                return Err(DecodeError::InvalidArgument {
                    constructor: "RegExp",
                    reason: "expected a flags string",
                    offset,
                });
            }
        };
        validate_flags(&flags, offset)?;
        self.graph.truncate(mark);
        Ok(self.graph.insert(Value::Pattern(Pattern::new(source, flags))))
    }

    fn construct_error(&mut self, offset: usize) -> Result<Handle, DecodeError> {
        let mark = self.graph.len();
        let args = self.parse_arguments()?;
        let message = match self.arg(&args, 0) {
            None | Some(Value::Undefined) => None,
            Some(Value::Text(text)) => Some(text.clone()),
            Some(Value::Number(n)) => Some(format_number(*n)),
            Some(Value::Bool(b)) => Some(b.to_string()),
            Some(Value::Null) => Some("null".to_string()),
            Some(_) => {
                return Err(DecodeError::InvalidArgument {
                    constructor: "Error",
                    reason: "expected a message string",
                    offset,
                });
            }
        };
        self.graph.truncate(mark);
        Ok(self.graph.error(message.as_deref()))
    }

    fn construct_typed_array(&mut self, kind: ElementKind, offset: usize) -> Result<Handle, DecodeError> {
        let invalid = |reason| DecodeError::InvalidArgument {
            constructor: kind.constructor_name(),
            reason,
            offset,
        };

        let mark = self.graph.len();
        let args = self.parse_arguments()?;
        let elements = match self.arg(&args, 0) {
            None | Some(Value::Undefined) => Vec::new(),
            Some(Value::Number(len)) => {
                let len = *len;
                if len < 0.0 || len.fract() != 0.0 || len > MAX_TYPED_ARRAY_LEN as f64 {
                    return Err(invalid("invalid typed array length"));
                }
                vec![0.0; len as usize]
            }
            Some(Value::Array(items)) => {
                if items.len() > MAX_TYPED_ARRAY_LEN {
                    return Err(invalid("too many elements"));
                }
                items
                    .iter()
                    .map(|item| match item.and_then(|h| self.graph.get(h)) {
                        None | Some(Value::Undefined) => Ok(f64::NAN),
                        Some(Value::Null) => Ok(0.0),
                        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
                        Some(Value::Number(n)) => Ok(*n),
                        Some(_) => Err(invalid("elements must be numbers")),
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            Some(Value::TypedArray(source)) => source.elements().to_vec(),
            Some(_) => return Err(invalid("expected an array of numbers or a length")),
        };
        self.graph.truncate(mark);
        Ok(self.graph.insert(Value::TypedArray(TypedArray::new(kind, elements))))
    }

    fn construct_bytes(&mut self, offset: usize) -> Result<Handle, DecodeError> {
        let invalid = |reason| DecodeError::InvalidArgument {
            constructor: "Buffer",
            reason,
            offset,
        };

        let mark = self.graph.len();
        let args = self.parse_arguments()?;
        let encoding = match self.arg(&args, 1) {
            None | Some(Value::Undefined) => "utf8".to_string(),
            Some(Value::Text(encoding)) => encoding.to_ascii_lowercase(),
            Some(_) => return Err(invalid("expected an encoding name")),
        };
        let bytes = match self.arg(&args, 0) {
            Some(Value::Text(text)) => match encoding.as_str() {
                "base64" => {
                    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                    BASE64
                        .decode(compact)
                        .map_err(|err| DecodeError::InvalidBase64 {
                            message: err.to_string(),
                            offset,
                        })?
                }
                "utf8" | "utf-8" => text.as_bytes().to_vec(),
                "hex" => decode_hex(text).ok_or_else(|| invalid("malformed hex payload"))?,
                "latin1" | "binary" => text.chars().map(|c| (c as u32 & 0xFF) as u8).collect(),
                _ => return Err(invalid("unsupported encoding")),
            },
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item.and_then(|h| self.graph.get(h)) {
                    Some(Value::Number(n)) => ElementKind::Uint8.coerce(*n) as u8,
                    _ => 0,
                })
                .collect(),
            Some(Value::Bytes(bytes)) => bytes.clone(),
            _ => return Err(invalid("expected a string, an array of bytes or a buffer")),
        };
        self.graph.truncate(mark);
        Ok(self.graph.bytes(bytes))
    }

    fn construct_set(&mut self) -> Result<Handle, DecodeError> {
        let items = self.parse_collection_argument(Self::parse_elements)?;
        let set = self.graph.set();
        for item in items.into_iter().flatten() {
            let member = match item {
                Some(handle) => handle,
                None => self.graph.undefined(),
            };
            self.graph.set_add(set, member);
        }
        Ok(set)
    }

    fn construct_map(&mut self) -> Result<Handle, DecodeError> {
        let entries = self.parse_collection_argument(Self::parse_entries)?;
        let map = self.graph.map();
        for (key, value) in entries.into_iter().flatten() {
            self.graph.map_insert(map, key, value);
        }
        Ok(map)
    }

    /// Parses the optional single array-literal argument of `new Set` and
    /// `new Map` with `items`, which runs after the opening `[`.
    fn parse_collection_argument<T>(
        &mut self,
        items: fn(&mut Self) -> Result<Vec<T>, DecodeError>,
    ) -> Result<Option<Vec<T>>, DecodeError> {
        if !self.eat_punct("(") {
            return Ok(None);
        }
        if self.eat_punct(")") {
            return Ok(None);
        }
        let token = self.next_token("array literal")?;
        let parsed = if token.is_punct("[") {
            Some(items(self)?)
        } else if token.kind == TokenKind::Null || token.is_identifier("undefined") {
            None
        } else {
            return Err(DecodeError::InvalidArgument {
                constructor: "Set or Map",
                reason: "expected an array literal",
                offset: token.offset,
            });
        };
        self.eat_punct(",");
        self.expect_punct(")", "`)`")?;
        Ok(parsed)
    }

    /// Parses `[key, value]` pairs after the opening `[` of a map argument.
    fn parse_entries(&mut self) -> Result<Vec<(Handle, Handle)>, DecodeError> {
        let mut entries = Vec::new();
        loop {
            if self.eat_punct("]") {
                return Ok(entries);
            }
            self.depth += 1;
            let entry = self.parse_entry();
            self.depth -= 1;
            entries.push(entry?);

            let token = self.next_token("`,` or `]`")?;
            if token.is_punct("]") {
                return Ok(entries);
            }
            if !token.is_punct(",") {
                return Err(unexpected(token, "`,` or `]`"));
            }
        }
    }

    fn parse_entry(&mut self) -> Result<(Handle, Handle), DecodeError> {
        self.expect_punct("[", "`[key, value]` entry")?;
        let key = self.parse_value()?;
        let token = self.next_token("`,` or `]`")?;
        if token.is_punct("]") {
            return Ok((key, self.graph.undefined()));
        }
        if !token.is_punct(",") {
            return Err(unexpected(token, "`,` or `]`"));
        }
        if self.eat_punct("]") {
            return Ok((key, self.graph.undefined()));
        }
        let value = self.parse_value()?;
        self.eat_punct(",");
        self.expect_punct("]", "`]`")?;
        Ok((key, value))
    }
}

// =============================================================================
// Literal tokens
// =============================================================================

fn parse_number(token: Token<'_>) -> Result<f64, DecodeError> {
    parse_numeric_literal(token.text).ok_or_else(|| DecodeError::InvalidNumber {
        text: token.text.to_string(),
        offset: token.offset,
    })
}

fn property_key(token: Token<'_>) -> Result<String, DecodeError> {
    match token.kind {
        TokenKind::Identifier | TokenKind::Keyword | TokenKind::Boolean | TokenKind::Null => {
            Ok(token.text.to_string())
        }
        TokenKind::String => cook_string(token),
        TokenKind::Numeric => parse_number(token).map(format_number),
        TokenKind::Punctuator if token.text == "[" => Err(DecodeError::UnsupportedExpression {
            context: "computed property name",
            offset: token.offset,
        }),
        _ => Err(unexpected(token, "property name")),
    }
}

fn cook_string(token: Token<'_>) -> Result<String, DecodeError> {
    // the lexer only emits strings with matching quotes at both ends
    let body = &token.text[1..token.text.len() - 1];
    unescape(body, token.offset + 1, false)
}

fn cook_template(token: Token<'_>) -> Result<String, DecodeError> {
    let body = &token.text[1..token.text.len() - 1];
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '$' if !escaped && body[i + 1..].starts_with('{') => {
                return Err(DecodeError::UnsupportedExpression {
                    context: "template literal with substitutions",
                    offset: token.offset + 1 + i,
                });
            }
            _ => escaped = false,
        }
    }
    unescape(body, token.offset + 1, true)
}

/// Resolves escape sequences in a string or template body.
///
/// Escapes are collected as UTF-16 code units so that surrogate pairs
/// written as two `\u` escapes combine; a lone surrogate becomes U+FFFD.
fn unescape(body: &str, offset: usize, template: bool) -> Result<String, DecodeError> {
    if !body.contains('\\') && !(template && body.contains('\r')) {
        return Ok(body.to_string());
    }

    let mut units: Vec<u16> = Vec::with_capacity(body.len());
    let mut buf = [0u16; 2];
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\r' && template {
            // raw CRLF and CR in templates read as LF
            if chars.peek().is_some_and(|(_, n)| *n == '\n') {
                chars.next();
            }
            units.push(u16::from(b'\n'));
            continue;
        }
        if c != '\\' {
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }

        let invalid = DecodeError::InvalidEscape { offset: offset + i };
        let Some((_, escape)) = chars.next() else {
            return Err(invalid);
        };
        let unit = match escape {
            'n' => u16::from(b'\n'),
            't' => u16::from(b'\t'),
            'r' => u16::from(b'\r'),
            'b' => 0x08,
            'f' => 0x0C,
            'v' => 0x0B,
            '0' if !chars.peek().is_some_and(|(_, n)| n.is_ascii_digit()) => 0,
            '0'..='9' => return Err(invalid),
            'x' => read_hex(&mut chars, 2).ok_or(invalid)? as u16,
            'u' => {
                if chars.peek().is_some_and(|(_, n)| *n == '{') {
                    chars.next();
                    let mut code = 0u32;
                    let mut digits = 0;
                    loop {
                        let (_, d) = chars.next().ok_or(invalid.clone())?;
                        if d == '}' {
                            break;
                        }
                        code = code * 16 + d.to_digit(16).ok_or(invalid.clone())?;
                        digits += 1;
                        if code > 0x10FFFF {
                            return Err(invalid);
                        }
                    }
                    if digits == 0 {
                        return Err(invalid);
                    }
                    match char::from_u32(code) {
                        Some(ch) => units.extend_from_slice(ch.encode_utf16(&mut buf)),
                        // lone surrogate code point
                        None => units.push(code as u16),
                    }
                    continue;
                }
                read_hex(&mut chars, 4).ok_or(invalid)? as u16
            }
            '\r' => {
                if chars.peek().is_some_and(|(_, n)| *n == '\n') {
                    chars.next();
                }
                continue;
            }
            '\n' | '\u{2028}' | '\u{2029}' => continue,
            other => {
                units.extend_from_slice(other.encode_utf16(&mut buf));
                continue;
            }
        };
        units.push(unit);
    }
    Ok(String::from_utf16_lossy(&units))
}

fn read_hex(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    count: usize,
) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..count {
        let (_, c) = chars.next()?;
        value = value * 16 + c.to_digit(16)?;
    }
    Some(value)
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    text.as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some((hi * 16 + lo) as u8)
        })
        .collect()
}

fn parse_regex_literal(token: Token<'_>) -> Result<Pattern, DecodeError> {
    let close = token.text.rfind('/').unwrap_or(0);
    if close == 0 {
        return Err(unexpected(token, "regular expression"));
    }
    let pattern = Pattern::new(&token.text[1..close], &token.text[close + 1..]);
    validate_flags(&pattern.flags, token.offset)?;
    Ok(pattern)
}

fn validate_flags(flags: &str, offset: usize) -> Result<(), DecodeError> {
    let mut seen = [false; 8];
    for c in flags.chars() {
        let slot = "dgimsuvy".find(c);
        match slot {
            Some(slot) if !seen[slot] => seen[slot] = true,
            _ => {
                return Err(DecodeError::InvalidPatternFlags {
                    flags: flags.to_string(),
                    offset,
                });
            }
        }
    }
    // `u` and `v` are mutually exclusive
    if seen[5] && seen[6] {
        return Err(DecodeError::InvalidPatternFlags {
            flags: flags.to_string(),
            offset,
        });
    }
    Ok(())
}
