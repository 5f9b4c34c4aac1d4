//! Literal text encoding and decoding.
//!
//! Encoding turns a value graph into JavaScript literal source; decoding
//! reads that source back without evaluating it.

pub mod decode;
pub mod encode;
pub mod escape;
pub mod lexer;
pub mod module;
pub mod number;
pub mod reference;
pub mod sanitize;

pub use decode::{decode, parse_literal};
pub use encode::{EncodeOptions, encode, encode_with_references};
pub use escape::{EscapeMode, escape_callable_body, quote_key, quote_text};
pub use lexer::{Token, TokenKind, tokenize};
pub use module::{
    Beautifier, FormatOptions, ModuleOptions, PassThrough, encode_as_module, encode_as_module_with,
};
pub use number::{format_number, parse_numeric_literal};
pub use reference::{Path, Reference, ReferenceTracker, Segment};
pub use sanitize::sanitize;
