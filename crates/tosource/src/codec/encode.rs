//! Value graph to literal text.
//!
//! The encoder walks the graph depth-first and writes a single expression
//! that evaluates back to an equivalent value. Containers on the current
//! recursion stack are tracked so that cycles are detected instead of
//! recursing forever.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::codec::escape::{EscapeMode, escape_callable_body, quote_key, write_quoted};
use crate::codec::number::format_number;
use crate::codec::reference::{ReferenceTracker, Segment};
use crate::error::EncodeError;
use crate::model::{Callable, Graph, Handle, JsDate, Members, Pattern, TypedArray, Value, ValueKind};
use crate::model::value::strip_word;
use crate::util::format_iso_instant;

/// Options for encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Emit each object-like value once and record later occurrences as
    /// references instead of repeating them.
    pub reference_mode: bool,

    /// Write a placeholder for a cyclic edge instead of failing.
    pub ignore_circular: bool,

    /// Escape only what literal syntax requires.
    ///
    /// The output of an unsafe encoding must not be embedded in HTML.
    pub unsafe_mode: bool,
}

impl EncodeOptions {
    /// Creates default options: safe escaping, no references, cycles fail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options with reference mode enabled.
    pub fn references() -> Self {
        Self {
            reference_mode: true,
            ..Self::default()
        }
    }

    /// Creates options that replace cyclic edges with placeholders.
    pub fn ignore_circular() -> Self {
        Self {
            ignore_circular: true,
            ..Self::default()
        }
    }

    /// Creates options with minimal escaping.
    pub fn unsafe_output() -> Self {
        Self {
            unsafe_mode: true,
            ..Self::default()
        }
    }

    /// Returns the escaping policy for strings and function bodies.
    pub fn escape_mode(&self) -> EscapeMode {
        EscapeMode::from_unsafe(self.unsafe_mode)
    }
}

/// Encodes the value at `root` as literal text.
///
/// In reference mode the recorded references are discarded; use
/// [`encode_with_references`] to keep them.
pub fn encode(graph: &Graph, root: Handle, options: &EncodeOptions) -> Result<String, EncodeError> {
    let mut tracker = ReferenceTracker::new();
    encode_with_references(graph, root, options, &mut tracker)
}

/// Encodes the value at `root`, recording shared references in `tracker`.
///
/// References are only recorded when `options.reference_mode` is set.
pub fn encode_with_references(
    graph: &Graph,
    root: Handle,
    options: &EncodeOptions,
    tracker: &mut ReferenceTracker,
) -> Result<String, EncodeError> {
    let root_value = graph.get(root).ok_or(EncodeError::UnknownHandle {
        handle: root.index(),
    })?;
    if options.reference_mode && root_value.is_object_like() {
        tracker.observe(root);
    }

    let mut encoder = Encoder {
        graph,
        options,
        mode: options.escape_mode(),
        tracker,
        visited: FxHashSet::default(),
        opaque: 0,
        out: String::with_capacity(64),
    };
    encoder.encode_value(root)?;
    Ok(encoder.out)
}

/// Placeholder written in place of a cyclic edge.
fn circular_placeholder(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Array => "[/*[Circular]*/]",
        ValueKind::Set => "new Set([/*[Circular]*/])",
        ValueKind::Map => "new Map([/*[Circular]*/])",
        _ => "{/*[Circular]*/}",
    }
}

struct Encoder<'a> {
    graph: &'a Graph,
    options: &'a EncodeOptions,
    mode: EscapeMode,
    tracker: &'a mut ReferenceTracker,
    /// Containers on the current recursion stack.
    visited: FxHashSet<Handle>,
    /// Nesting depth inside set and map members, where no accessor path
    /// exists.
    opaque: usize,
    out: String,
}

impl<'a> Encoder<'a> {
    fn value(&self, handle: Handle) -> Result<&'a Value, EncodeError> {
        let graph = self.graph;
        graph.get(handle).ok_or(EncodeError::UnknownHandle {
            handle: handle.index(),
        })
    }

    fn encode_value(&mut self, handle: Handle) -> Result<(), EncodeError> {
        match self.value(handle)? {
            Value::Null => self.out.push_str("null"),
            Value::Array(elements) => {
                self.enter(handle, ValueKind::Array, |enc| enc.encode_array(elements))?
            }
            Value::Callable(callable) => self.encode_callable(callable),
            Value::DateTime(date) => self.encode_date(date),
            Value::Pattern(pattern) => self.encode_pattern(pattern),
            Value::Error(message) => self.encode_error(message.as_deref()),
            Value::Bytes(bytes) => {
                self.out.push_str("Buffer.from('");
                self.out.push_str(&STANDARD.encode(bytes));
                self.out.push_str("', 'base64')");
            }
            Value::TypedArray(array) => self.encode_typed_array(array),
            Value::Set(members) => {
                self.enter(handle, ValueKind::Set, |enc| enc.encode_set(members))?
            }
            Value::Map(entries) => {
                self.enter(handle, ValueKind::Map, |enc| enc.encode_map(entries))?
            }
            Value::Record(members) => {
                self.enter(handle, ValueKind::Record, |enc| enc.encode_record(members))?
            }
            Value::Text(text) => write_quoted(&mut self.out, text, self.mode),
            Value::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => self.out.push_str(&format_number(*n)),
            Value::Undefined => self.out.push_str("undefined"),
        }
        Ok(())
    }

    /// Runs `body` with `handle` on the recursion stack, or writes the
    /// circular placeholder if it already is.
    fn enter<F>(&mut self, handle: Handle, kind: ValueKind, body: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodeError>,
    {
        if self.visited.contains(&handle) {
            let path = self.tracker.current_path();
            if self.options.ignore_circular {
                debug!(%path, kind = kind.name(), "replaced circular edge with placeholder");
                self.out.push_str(circular_placeholder(kind));
                return Ok(());
            }
            return Err(EncodeError::CircularStructure {
                path: path.to_string(),
            });
        }

        trace!(%handle, kind = kind.name(), "entering container");
        self.visited.insert(handle);
        let result = body(self);
        self.visited.remove(&handle);
        result
    }

    /// Runs `body` with `segment` appended to the current path.
    fn at<F>(&mut self, segment: Segment, body: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodeError>,
    {
        if self.opaque > 0 {
            return body(self);
        }
        self.tracker.push(segment);
        let result = body(self);
        self.tracker.pop();
        result
    }

    /// Runs `body` inside a set or map, where no accessor path exists.
    fn in_collection<F>(&mut self, body: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodeError>,
    {
        self.opaque += 1;
        let result = body(self);
        self.opaque -= 1;
        result
    }

    /// Returns true if the value at `handle` takes part in reference
    /// tracking at the current position.
    fn tracks(&self, handle: Handle) -> Result<bool, EncodeError> {
        Ok(self.options.reference_mode && self.opaque == 0 && self.value(handle)?.is_object_like())
    }

    fn encode_array(&mut self, elements: &'a [Option<Handle>]) -> Result<(), EncodeError> {
        self.out.push('[');
        for (index, element) in elements.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            let Some(element) = *element else {
                self.out.push_str("undefined");
                continue;
            };
            let tracked = self.tracks(element)?;
            self.at(Segment::Index(index), |enc| {
                if tracked && enc.tracker.mark_referenced(element) {
                    enc.out.push_str("undefined");
                    return Ok(());
                }
                enc.encode_value(element)
            })?;
        }
        self.out.push(']');
        Ok(())
    }

    fn encode_record(&mut self, members: &'a Members) -> Result<(), EncodeError> {
        self.out.push('{');
        let mut first = true;
        for (key, &member) in members {
            let tracked = self.tracks(member)?;
            self.at(Segment::for_key(key), |enc| {
                if tracked && enc.tracker.mark_referenced(member) {
                    return Ok(());
                }
                if !first {
                    enc.out.push_str(", ");
                }
                first = false;
                enc.out.push_str(&quote_key(key));
                enc.out.push_str(": ");
                enc.encode_value(member)
            })?;
        }
        self.out.push('}');
        Ok(())
    }

    fn encode_set(&mut self, members: &'a [Handle]) -> Result<(), EncodeError> {
        self.out.push_str("new Set([");
        self.in_collection(|enc| {
            for (i, &member) in members.iter().enumerate() {
                if i > 0 {
                    enc.out.push_str(", ");
                }
                enc.encode_value(member)?;
            }
            Ok(())
        })?;
        self.out.push_str("])");
        Ok(())
    }

    fn encode_map(&mut self, entries: &'a [(Handle, Handle)]) -> Result<(), EncodeError> {
        self.out.push_str("new Map([");
        self.in_collection(|enc| {
            for (i, &(key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    enc.out.push_str(", ");
                }
                enc.out.push('[');
                enc.encode_value(key)?;
                enc.out.push_str(", ");
                enc.encode_value(value)?;
                enc.out.push(']');
            }
            Ok(())
        })?;
        self.out.push_str("])");
        Ok(())
    }

    fn encode_callable(&mut self, callable: &Callable) {
        let body = escape_callable_body(&callable.source, self.mode);
        let text = body.trim_start();
        if callable.arrow || strip_word(text, "function").is_some() || text.starts_with('(') {
            self.out.push_str(&body);
            return;
        }
        match strip_word(text, "async") {
            Some(rest) => {
                let rest = rest.trim_start();
                if strip_word(rest, "function").is_some() || rest.starts_with('(') {
                    self.out.push_str(&body);
                } else {
                    // async shorthand method
                    self.out.push_str("async function ");
                    self.out.push_str(rest);
                }
            }
            None => {
                self.out.push_str("function ");
                self.out.push_str(&body);
            }
        }
    }

    fn encode_date(&mut self, date: &JsDate) {
        self.out.push_str("new Date(");
        match date.epoch_ms() {
            Some(ms) => write_quoted(&mut self.out, &format_iso_instant(ms), self.mode),
            None => self.out.push_str("\"Invalid Date\""),
        }
        self.out.push(')');
    }

    fn encode_pattern(&mut self, pattern: &Pattern) {
        self.out.push_str("new RegExp(");
        write_quoted(&mut self.out, &pattern.source, self.mode);
        self.out.push_str(", ");
        write_quoted(&mut self.out, &pattern.flags, self.mode);
        self.out.push(')');
    }

    fn encode_error(&mut self, message: Option<&str>) {
        match message {
            Some(message) if !message.is_empty() => {
                self.out.push_str("new Error(");
                write_quoted(&mut self.out, message, self.mode);
                self.out.push(')');
            }
            _ => self.out.push_str("new Error()"),
        }
    }

    fn encode_typed_array(&mut self, array: &TypedArray) {
        self.out.push_str("new ");
        self.out.push_str(array.kind().constructor_name());
        self.out.push_str("([");
        for (i, element) in array.elements().iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(&format_number(*element));
        }
        self.out.push_str("])");
    }
}
