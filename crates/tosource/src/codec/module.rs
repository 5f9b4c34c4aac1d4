//! CommonJS module output.
//!
//! Wraps an encoded literal in a module body:
//!
//! ```text
//! /* comment */
//! var m = module.exports = {a: {x: 1}};
//! m.b = m.a;
//! ```
//!
//! The trailing assignments restore shared references and cycles recorded
//! in reference mode.

use crate::codec::encode::{EncodeOptions, encode_with_references};
use crate::codec::reference::ReferenceTracker;
use crate::error::EncodeError;
use crate::model::{Graph, Handle};

/// Indentation settings handed to a [`Beautifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub indent_size: usize,
    pub indent_char: char,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_size: 1,
            indent_char: '\t',
        }
    }
}

impl FormatOptions {
    /// Returns one level of indentation.
    pub fn indent(&self) -> String {
        std::iter::repeat_n(self.indent_char, self.indent_size).collect()
    }
}

/// Pretty-printer applied to module text when formatting is requested.
pub trait Beautifier {
    fn beautify(&self, text: &str, options: &FormatOptions) -> String;
}

/// Beautifier that returns the text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Beautifier for PassThrough {
    fn beautify(&self, text: &str, _options: &FormatOptions) -> String {
        text.to_string()
    }
}

impl<F> Beautifier for F
where
    F: Fn(&str, &FormatOptions) -> String,
{
    fn beautify(&self, text: &str, options: &FormatOptions) -> String {
        self(text, options)
    }
}

/// Options for module output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleOptions {
    /// Emit shared values once and wire them with trailing assignments.
    pub reference_mode: bool,
    /// Write a placeholder for a cyclic edge instead of failing.
    pub ignore_circular: bool,
    /// Escape only what literal syntax requires.
    pub unsafe_mode: bool,
    /// Text of a leading `/* .. */` comment.
    pub comment: Option<String>,
    /// Run the beautifier with these settings.
    pub formatted: Option<FormatOptions>,
}

impl ModuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables reference mode.
    pub fn references(mut self) -> Self {
        self.reference_mode = true;
        self
    }

    /// Replaces cyclic edges with placeholders.
    pub fn ignore_circular(mut self) -> Self {
        self.ignore_circular = true;
        self
    }

    /// Uses minimal escaping.
    pub fn unsafe_output(mut self) -> Self {
        self.unsafe_mode = true;
        self
    }

    /// Sets the leading comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Requests formatting with `options`.
    pub fn formatted(mut self, options: FormatOptions) -> Self {
        self.formatted = Some(options);
        self
    }

    fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            reference_mode: self.reference_mode,
            ignore_circular: self.ignore_circular,
            unsafe_mode: self.unsafe_mode,
        }
    }
}

/// Encodes the value at `root` as a CommonJS module.
pub fn encode_as_module(
    graph: &Graph,
    root: Handle,
    options: &ModuleOptions,
) -> Result<String, EncodeError> {
    encode_as_module_with(graph, root, options, &PassThrough)
}

/// Encodes the value at `root` as a CommonJS module, formatting the result
/// with `beautifier` when `options.formatted` is set.
pub fn encode_as_module_with(
    graph: &Graph,
    root: Handle,
    options: &ModuleOptions,
    beautifier: &dyn Beautifier,
) -> Result<String, EncodeError> {
    let mut tracker = ReferenceTracker::new();
    let literal = encode_with_references(graph, root, &options.encode_options(), &mut tracker)?;

    let mut out = String::with_capacity(literal.len() + 64);
    if let Some(comment) = &options.comment {
        out.push_str("/* ");
        // keep the comment from closing early
        out.push_str(&comment.replace("*/", "* /"));
        out.push_str(" */\n");
    }
    out.push_str("var m = module.exports = ");
    out.push_str(&literal);
    out.push_str(";\n");
    for reference in tracker.references() {
        out.push('m');
        out.push_str(&reference.origin.to_string());
        out.push_str(" = m");
        out.push_str(&reference.target.to_string());
        out.push_str(";\n");
    }

    match &options.formatted {
        Some(format) => Ok(beautifier.beautify(&out, format)),
        None => Ok(out),
    }
}
