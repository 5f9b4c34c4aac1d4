//! Data model types for literal encoding.
//!
//! This module contains the value graph the codec works on:
//! - Values (the tagged variant of every supported kind)
//! - Graphs (the arena owning values, addressed by handle)
//! - Builders (ergonomic construction)

pub mod builder;
pub mod graph;
pub mod value;

pub use builder::{ArrayBuilder, RecordBuilder};
pub use graph::{Document, Graph};
pub use value::{
    Callable, ElementKind, Handle, JsDate, MAX_EPOCH_MS, Members, Pattern, TypedArray, Value,
    ValueKind,
};
