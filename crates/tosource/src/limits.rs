//! Security limits for decoding.
//!
//! Decoding accepts untrusted text; these bounds keep the recursive
//! literal parser from exhausting the stack or memory. Encoding has no
//! limits of its own: its recursion depth is the depth of the graph the
//! caller built.

/// Maximum nesting depth of arrays, objects and constructor calls.
pub const MAX_DECODE_DEPTH: usize = 128;

/// Maximum length of decodable source text (64 MiB).
pub const MAX_SOURCE_LEN: usize = 64 * 1024 * 1024;

/// Maximum number of elements a single typed array literal may hold.
pub const MAX_TYPED_ARRAY_LEN: usize = 16 * 1024 * 1024;
