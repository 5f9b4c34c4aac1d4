//! Builder API for ergonomic graph construction.
//!
//! Provides a fluent interface for building records and arrays inside a
//! [`Graph`].
//!
//! # Example
//!
//! ```rust
//! use tosource::model::Graph;
//!
//! let mut graph = Graph::new();
//! let root = graph.build_record(|r| r
//!     .text("name", "Alice")
//!     .number("age", 42.0)
//!     .array("tags", |a| a.text("admin").text("ops"))
//!     .record("address", |addr| addr.text("city", "Berlin"))
//! );
//! ```

use crate::model::{ElementKind, Graph, Handle, JsDate, Value};

impl Graph {
    /// Builds a record with a builder function and returns its handle.
    pub fn build_record<F>(&mut self, f: F) -> Handle
    where
        F: for<'b> FnOnce(RecordBuilder<'b>) -> RecordBuilder<'b>,
    {
        f(RecordBuilder::new(self)).build()
    }

    /// Builds an array with a builder function and returns its handle.
    pub fn build_array<F>(&mut self, f: F) -> Handle
    where
        F: for<'b> FnOnce(ArrayBuilder<'b>) -> ArrayBuilder<'b>,
    {
        f(ArrayBuilder::new(self)).build()
    }
}

/// Builder for a record's members, in insertion order.
#[derive(Debug)]
pub struct RecordBuilder<'g> {
    graph: &'g mut Graph,
    members: Vec<(String, Handle)>,
}

impl<'g> RecordBuilder<'g> {
    /// Creates a builder that inserts into `graph`.
    pub fn new(graph: &'g mut Graph) -> Self {
        Self {
            graph,
            members: Vec::new(),
        }
    }

    /// Adds a member pointing at an existing handle (shares the value).
    pub fn member(mut self, key: impl Into<String>, value: Handle) -> Self {
        self.members.push((key.into(), value));
        self
    }

    /// Adds a member holding a new value.
    pub fn value(mut self, key: impl Into<String>, value: Value) -> Self {
        let handle = self.graph.insert(value);
        self.members.push((key.into(), handle));
        self
    }

    pub fn null(self, key: impl Into<String>) -> Self {
        self.value(key, Value::Null)
    }

    pub fn undefined(self, key: impl Into<String>) -> Self {
        self.value(key, Value::Undefined)
    }

    pub fn bool(self, key: impl Into<String>, value: bool) -> Self {
        self.value(key, Value::Bool(value))
    }

    pub fn number(self, key: impl Into<String>, value: f64) -> Self {
        self.value(key, Value::Number(value))
    }

    pub fn text(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.value(key, Value::Text(value.into()))
    }

    pub fn date(self, key: impl Into<String>, date: JsDate) -> Self {
        self.value(key, Value::DateTime(date))
    }

    /// Adds a nested record built by `f`.
    pub fn record<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: for<'b> FnOnce(RecordBuilder<'b>) -> RecordBuilder<'b>,
    {
        let handle = f(RecordBuilder::new(&mut *self.graph)).build();
        self.members.push((key.into(), handle));
        self
    }

    /// Adds a nested array built by `f`.
    pub fn array<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: for<'b> FnOnce(ArrayBuilder<'b>) -> ArrayBuilder<'b>,
    {
        let handle = f(ArrayBuilder::new(&mut *self.graph)).build();
        self.members.push((key.into(), handle));
        self
    }

    /// Adds a typed numeric array.
    pub fn typed_array(
        mut self,
        key: impl Into<String>,
        kind: ElementKind,
        elements: impl IntoIterator<Item = f64>,
    ) -> Self {
        let handle = self.graph.typed_array(kind, elements);
        self.members.push((key.into(), handle));
        self
    }

    /// Inserts the record and returns its handle.
    pub fn build(self) -> Handle {
        self.graph.record_from(self.members)
    }
}

/// Builder for an array's elements.
#[derive(Debug)]
pub struct ArrayBuilder<'g> {
    graph: &'g mut Graph,
    elements: Vec<Option<Handle>>,
}

impl<'g> ArrayBuilder<'g> {
    /// Creates a builder that inserts into `graph`.
    pub fn new(graph: &'g mut Graph) -> Self {
        Self {
            graph,
            elements: Vec::new(),
        }
    }

    /// Appends an existing handle (shares the value).
    pub fn element(mut self, value: Handle) -> Self {
        self.elements.push(Some(value));
        self
    }

    /// Appends a hole.
    pub fn hole(mut self) -> Self {
        self.elements.push(None);
        self
    }

    /// Appends a new value.
    pub fn value(mut self, value: Value) -> Self {
        let handle = self.graph.insert(value);
        self.elements.push(Some(handle));
        self
    }

    pub fn null(self) -> Self {
        self.value(Value::Null)
    }

    pub fn undefined(self) -> Self {
        self.value(Value::Undefined)
    }

    pub fn bool(self, value: bool) -> Self {
        self.value(Value::Bool(value))
    }

    pub fn number(self, value: f64) -> Self {
        self.value(Value::Number(value))
    }

    pub fn text(self, value: impl Into<String>) -> Self {
        self.value(Value::Text(value.into()))
    }

    /// Appends a nested record built by `f`.
    pub fn record<F>(mut self, f: F) -> Self
    where
        F: for<'b> FnOnce(RecordBuilder<'b>) -> RecordBuilder<'b>,
    {
        let handle = f(RecordBuilder::new(&mut *self.graph)).build();
        self.elements.push(Some(handle));
        self
    }

    /// Appends a nested array built by `f`.
    pub fn array<F>(mut self, f: F) -> Self
    where
        F: for<'b> FnOnce(ArrayBuilder<'b>) -> ArrayBuilder<'b>,
    {
        let handle = f(ArrayBuilder::new(&mut *self.graph)).build();
        self.elements.push(Some(handle));
        self
    }

    /// Inserts the array and returns its handle.
    pub fn build(self) -> Handle {
        self.graph.insert(Value::Array(self.elements))
    }
}
