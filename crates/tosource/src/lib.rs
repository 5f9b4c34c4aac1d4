//! tosource: value graphs to JavaScript literal source and back.
//!
//! This crate writes in-memory value graphs as the source text of a single
//! JavaScript expression, and reads such text back without evaluating it.
//!
//! # Overview
//!
//! The encoder covers the values a literal can express and a few that need
//! constructor calls:
//! - **Primitives**: `null`, `undefined`, booleans, numbers (NaN and the
//!   infinities included) and strings
//! - **Containers**: arrays with holes, insertion-ordered records, sets and
//!   maps
//! - **Special objects**: dates, regular expressions, errors, byte buffers
//!   and typed numeric arrays
//! - **Functions**: carried as their source text
//!
//! # Quick Start
//!
//! ```rust
//! use tosource::codec::{decode, encode, EncodeOptions};
//! use tosource::model::Graph;
//!
//! let mut graph = Graph::new();
//! let root = graph.build_record(|r| r
//!     .text("name", "Alice")
//!     .number("age", 42.0)
//!     .array("tags", |a| a.text("admin").text("ops"))
//! );
//!
//! let text = encode(&graph, root, &EncodeOptions::new()).unwrap();
//! assert_eq!(text, r#"{name: "Alice", age: 42, tags: ["admin", "ops"]}"#);
//!
//! let doc = decode(&text, false).unwrap();
//! assert!(graph.structurally_eq(root, &doc.graph, doc.root));
//! ```
//!
//! # Modules
//!
//! - [`model`]: Value graph types (Value, Graph, Handle, builders)
//! - [`codec`]: Encoder, module writer, sanitizer and decoder
//! - [`util`]: ISO 8601 instant formatting and parsing
//! - [`error`]: Error types
//! - [`limits`]: Security limits for decoding
//!
//! # Security
//!
//! Output is safe to embed in an HTML `<script>` block by default: string
//! literals escape every character that could end the block, and tag-like
//! sequences inside function bodies are broken up. Unsafe output drops
//! those escapes and must not be embedded.
//!
//! The decoder never evaluates its input. Only the literal subset is
//! accepted, nesting depth and input size are bounded, and in safe mode
//! the text is sanitized before it is parsed.
//!
//! # Shared values and cycles
//!
//! A cycle fails to encode unless placeholders are requested. Reference
//! mode emits each object once and records the remaining occurrences as
//! `[origin, target]` path pairs; module output turns those into
//! assignments that restore both sharing and cycles.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod util;

// Re-export commonly used types at crate root
pub use codec::{
    EncodeOptions, ModuleOptions, ReferenceTracker, decode, encode, encode_as_module,
    encode_with_references, sanitize,
};
pub use error::{DecodeError, EncodeError, ErrorCode};
pub use model::{Document, ElementKind, Graph, Handle, JsDate, Value, ValueKind};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
