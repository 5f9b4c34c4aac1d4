//! Value types for literal encoding.
//!
//! A [`Value`] is one node of a [`Graph`](crate::model::Graph). Containers
//! refer to their members by [`Handle`], which doubles as the value's
//! identity: two handles are the same instance iff they are equal.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Stable arena index of a value inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub(crate) u32);

impl Handle {
    /// Returns the raw arena index.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Insertion-ordered property table of a record.
pub type Members = IndexMap<String, Handle, FxBuildHasher>;

/// Value kinds, in the order the encoder tests them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Array,
    Callable,
    DateTime,
    Pattern,
    Error,
    Bytes,
    TypedArray,
    Set,
    Map,
    Record,
    Text,
    Bool,
    Number,
    Undefined,
}

impl ValueKind {
    /// Returns true for kinds that have object identity.
    ///
    /// Only object-like values take part in reference tracking.
    pub fn is_object_like(self) -> bool {
        matches!(
            self,
            ValueKind::Array
                | ValueKind::DateTime
                | ValueKind::Pattern
                | ValueKind::Error
                | ValueKind::Bytes
                | ValueKind::TypedArray
                | ValueKind::Set
                | ValueKind::Map
                | ValueKind::Record
        )
    }

    /// Returns true for kinds whose encoding recurses into members.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            ValueKind::Array | ValueKind::Record | ValueKind::Set | ValueKind::Map
        )
    }

    /// Human readable name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Array => "array",
            ValueKind::Callable => "callable",
            ValueKind::DateTime => "date",
            ValueKind::Pattern => "regexp",
            ValueKind::Error => "error",
            ValueKind::Bytes => "buffer",
            ValueKind::TypedArray => "typed array",
            ValueKind::Set => "set",
            ValueKind::Map => "map",
            ValueKind::Record => "object",
            ValueKind::Text => "string",
            ValueKind::Bool => "boolean",
            ValueKind::Number => "number",
            ValueKind::Undefined => "undefined",
        }
    }
}

/// Element type of a typed numeric array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl ElementKind {
    /// All element kinds.
    pub const ALL: [ElementKind; 9] = [
        ElementKind::Int8,
        ElementKind::Uint8,
        ElementKind::Uint8Clamped,
        ElementKind::Int16,
        ElementKind::Uint16,
        ElementKind::Int32,
        ElementKind::Uint32,
        ElementKind::Float32,
        ElementKind::Float64,
    ];

    /// Returns the constructor name, e.g. `Uint8ClampedArray`.
    pub fn constructor_name(self) -> &'static str {
        match self {
            ElementKind::Int8 => "Int8Array",
            ElementKind::Uint8 => "Uint8Array",
            ElementKind::Uint8Clamped => "Uint8ClampedArray",
            ElementKind::Int16 => "Int16Array",
            ElementKind::Uint16 => "Uint16Array",
            ElementKind::Int32 => "Int32Array",
            ElementKind::Uint32 => "Uint32Array",
            ElementKind::Float32 => "Float32Array",
            ElementKind::Float64 => "Float64Array",
        }
    }

    /// Looks up an element kind by constructor name.
    pub fn from_constructor_name(name: &str) -> Option<ElementKind> {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.constructor_name() == name)
    }

    /// Converts a number the way storing it into an array of this kind does.
    ///
    /// Integer kinds truncate and wrap modulo their width (non-finite values
    /// become 0), `Uint8Clamped` clamps to 0..=255 rounding ties to even,
    /// `Float32` rounds to single precision.
    pub fn coerce(self, value: f64) -> f64 {
        match self {
            ElementKind::Int8 => wrap_integer(value, 8, true),
            ElementKind::Uint8 => wrap_integer(value, 8, false),
            ElementKind::Int16 => wrap_integer(value, 16, true),
            ElementKind::Uint16 => wrap_integer(value, 16, false),
            ElementKind::Int32 => wrap_integer(value, 32, true),
            ElementKind::Uint32 => wrap_integer(value, 32, false),
            ElementKind::Uint8Clamped => {
                if value.is_nan() || value <= 0.0 {
                    0.0
                } else if value >= 255.0 {
                    255.0
                } else {
                    value.round_ties_even()
                }
            }
            ElementKind::Float32 => (value as f32) as f64,
            ElementKind::Float64 => value,
        }
    }
}

fn wrap_integer(value: f64, bits: i32, signed: bool) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let modulus = 2f64.powi(bits);
    let mut wrapped = value.trunc().rem_euclid(modulus);
    if signed && wrapped >= modulus / 2.0 {
        wrapped -= modulus;
    }
    // normalizes -0
    wrapped + 0.0
}

/// Typed numeric array: element kind plus normalized elements.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedArray {
    kind: ElementKind,
    elements: Vec<f64>,
}

impl TypedArray {
    /// Creates a typed array, coercing every element to `kind`.
    pub fn new(kind: ElementKind, elements: impl IntoIterator<Item = f64>) -> Self {
        Self {
            kind,
            elements: elements.into_iter().map(|e| kind.coerce(e)).collect(),
        }
    }

    /// Returns the element kind.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Returns the stored elements.
    pub fn elements(&self) -> &[f64] {
        &self.elements
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Largest magnitude of a valid date, in milliseconds from the epoch.
pub const MAX_EPOCH_MS: i64 = 8_640_000_000_000_000;

/// A date instant with millisecond precision, or an invalid date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JsDate {
    epoch_ms: Option<i64>,
}

impl JsDate {
    /// Creates a date from milliseconds since the Unix epoch.
    ///
    /// Instants beyond +/-8.64e15 ms are invalid dates.
    pub fn from_epoch_ms(epoch_ms: i64) -> Self {
        if epoch_ms.unsigned_abs() > MAX_EPOCH_MS as u64 {
            return Self::invalid();
        }
        Self {
            epoch_ms: Some(epoch_ms),
        }
    }

    /// Creates a date from a time value the way the `Date` constructor does.
    pub fn from_time_value(time: f64) -> Self {
        if !time.is_finite() || time.abs() > MAX_EPOCH_MS as f64 {
            return Self::invalid();
        }
        Self::from_epoch_ms(time.trunc() as i64)
    }

    /// The invalid date.
    pub fn invalid() -> Self {
        Self { epoch_ms: None }
    }

    /// Milliseconds since the epoch, `None` for an invalid date.
    pub fn epoch_ms(&self) -> Option<i64> {
        self.epoch_ms
    }

    /// Returns true for the invalid date.
    pub fn is_invalid(&self) -> bool {
        self.epoch_ms.is_none()
    }
}

/// Regular expression value: source text plus flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub source: String,
    pub flags: String,
}

impl Pattern {
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            flags: flags.into(),
        }
    }
}

/// A function-like value carried as its literal source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Callable {
    /// Literal source text of the function.
    pub source: String,
    /// Written with arrow syntax (`(a) => a + 1`).
    pub arrow: bool,
    /// Has a declared name (`function log() {}`, `key(a) {}`).
    ///
    /// Informational only: the encoder decides on the `function` prefix
    /// from the source text, and structural equality compares sources.
    pub named: bool,
}

impl Callable {
    /// Creates a callable, classifying its syntax from the source text.
    pub fn from_source(source: impl Into<String>) -> Self {
        let source = source.into();
        let (arrow, named) = classify_callable(&source);
        Self {
            source,
            arrow,
            named,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

/// Returns `(arrow, named)` for a function source text.
fn classify_callable(source: &str) -> (bool, bool) {
    let mut rest = source.trim_start();
    if let Some(after) = strip_word(rest, "async") {
        rest = after.trim_start();
    }
    if let Some(after) = strip_word(rest, "function") {
        let after = after.trim_start();
        let after = after.strip_prefix('*').unwrap_or(after).trim_start();
        let named = after.chars().next().is_some_and(is_ident_start);
        return (false, named);
    }
    if rest.starts_with('(') {
        return (true, false);
    }
    // `a => a + 1` versus shorthand method `key(a) { .. }`
    let ident_len = rest
        .char_indices()
        .find(|(_, c)| !is_ident_continue(*c))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    if ident_len > 0 && rest[ident_len..].trim_start().starts_with("=>") {
        return (true, false);
    }
    (false, ident_len > 0)
}

/// Strips `word` from the front of `text` when it is a whole word.
pub(crate) fn strip_word<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let after = text.strip_prefix(word)?;
    match after.chars().next() {
        Some(c) if is_ident_continue(c) => None,
        _ => Some(after),
    }
}

/// A value node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    /// The "no value" marker, distinct from `Null`.
    Undefined,

    Bool(bool),

    /// IEEE 754 double, including NaN and the infinities.
    Number(f64),

    Text(String),

    /// Ordered elements; `None` is a hole.
    Array(Vec<Option<Handle>>),

    /// Properties in insertion order.
    Record(Members),

    Callable(Callable),

    DateTime(JsDate),

    Pattern(Pattern),

    /// Error object with an optional message.
    Error(Option<String>),

    /// Raw byte buffer.
    Bytes(Vec<u8>),

    TypedArray(TypedArray),

    /// Insertion-ordered unique members.
    Set(Vec<Handle>),

    /// Insertion-ordered entries with unique keys.
    Map(Vec<(Handle, Handle)>),
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Undefined => ValueKind::Undefined,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
            Value::Array(_) => ValueKind::Array,
            Value::Record(_) => ValueKind::Record,
            Value::Callable(_) => ValueKind::Callable,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Pattern(_) => ValueKind::Pattern,
            Value::Error(_) => ValueKind::Error,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::TypedArray(_) => ValueKind::TypedArray,
            Value::Set(_) => ValueKind::Set,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Returns true if this value has object identity.
    pub fn is_object_like(&self) -> bool {
        self.kind().is_object_like()
    }

    /// Creates an empty record.
    pub fn record() -> Self {
        Value::Record(Members::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_kind_names() {
        for kind in ElementKind::ALL {
            assert_eq!(
                ElementKind::from_constructor_name(kind.constructor_name()),
                Some(kind)
            );
        }
        assert_eq!(ElementKind::from_constructor_name("BigInt64Array"), None);
    }

    #[test]
    fn test_integer_coercion_wraps() {
        assert_eq!(ElementKind::Int8.coerce(127.0), 127.0);
        assert_eq!(ElementKind::Int8.coerce(128.0), -128.0);
        assert_eq!(ElementKind::Int8.coerce(-129.0), 127.0);
        assert_eq!(ElementKind::Uint8.coerce(-1.0), 255.0);
        assert_eq!(ElementKind::Uint8.coerce(256.5), 0.0);
        assert_eq!(ElementKind::Uint16.coerce(65536.0 + 3.0), 3.0);
        assert_eq!(ElementKind::Int32.coerce(2147483648.0), -2147483648.0);
        assert_eq!(ElementKind::Uint32.coerce(-1.0), 4294967295.0);
        assert_eq!(ElementKind::Int16.coerce(f64::NAN), 0.0);
        assert_eq!(ElementKind::Int16.coerce(f64::INFINITY), 0.0);
        assert!(ElementKind::Int8.coerce(-0.5).is_sign_positive());
    }

    #[test]
    fn test_clamped_coercion() {
        assert_eq!(ElementKind::Uint8Clamped.coerce(-5.0), 0.0);
        assert_eq!(ElementKind::Uint8Clamped.coerce(300.0), 255.0);
        assert_eq!(ElementKind::Uint8Clamped.coerce(1.5), 2.0);
        assert_eq!(ElementKind::Uint8Clamped.coerce(2.5), 2.0);
        assert_eq!(ElementKind::Uint8Clamped.coerce(2.6), 3.0);
        assert_eq!(ElementKind::Uint8Clamped.coerce(f64::NAN), 0.0);
    }

    #[test]
    fn test_float_coercion() {
        assert_eq!(ElementKind::Float32.coerce(3.1415), 3.1414999961853027);
        assert_eq!(ElementKind::Float64.coerce(3.1415), 3.1415);
        assert!(ElementKind::Float32.coerce(f64::NAN).is_nan());
    }

    #[test]
    fn test_date_range() {
        assert!(!JsDate::from_epoch_ms(MAX_EPOCH_MS).is_invalid());
        assert!(JsDate::from_epoch_ms(MAX_EPOCH_MS + 1).is_invalid());
        assert!(JsDate::from_time_value(f64::NAN).is_invalid());
        assert_eq!(JsDate::from_time_value(1.9).epoch_ms(), Some(1));
    }

    #[test]
    fn test_callable_classification() {
        let c = Callable::from_source("function log (arg) { return arg }");
        assert!(!c.arrow);
        assert!(c.named);

        let c = Callable::from_source("function (a) {}");
        assert!(!c.named);

        let c = Callable::from_source("(a) => a + 1");
        assert!(c.arrow);

        let c = Callable::from_source("a => a + 1");
        assert!(c.arrow);

        let c = Callable::from_source("async (a) => a");
        assert!(c.arrow);

        let c = Callable::from_source("key(a) { return a + 1 }");
        assert!(!c.arrow);
        assert!(c.named);

        let c = Callable::from_source("functional() {}");
        assert!(!c.arrow);
        assert!(c.named);
    }

    #[test]
    fn test_object_like() {
        assert!(ValueKind::Record.is_object_like());
        assert!(ValueKind::DateTime.is_object_like());
        assert!(!ValueKind::Callable.is_object_like());
        assert!(!ValueKind::Text.is_object_like());
        assert!(!ValueKind::DateTime.is_container());
        assert!(ValueKind::Map.is_container());
    }
}
