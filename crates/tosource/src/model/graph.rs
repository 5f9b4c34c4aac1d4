//! Arena-backed value graphs.
//!
//! Every value is stored once in a [`Graph`] and addressed by [`Handle`].
//! Sharing a sub-object means storing the same handle in two places; a
//! cycle is a container whose members lead back to itself. Neither needs
//! interior mutability: members are wired after insertion with
//! [`Graph::set_member`], [`Graph::push_element`] and friends.

use rustc_hash::FxHashSet;

use crate::model::{Callable, ElementKind, Handle, JsDate, Members, Pattern, TypedArray, Value};

/// Arena of values.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Value>,
}

/// A graph together with its root value.
#[derive(Debug, Clone)]
pub struct Document {
    pub graph: Graph,
    pub root: Handle,
}

impl Document {
    /// Returns the root value.
    pub fn root_value(&self) -> Option<&Value> {
        self.graph.get(self.root)
    }
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Number of values in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph holds no values.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Stores a value and returns its handle.
    pub fn insert(&mut self, value: Value) -> Handle {
        let handle = Handle(self.nodes.len() as u32);
        self.nodes.push(value);
        handle
    }

    /// Returns the value behind `handle`.
    pub fn get(&self, handle: Handle) -> Option<&Value> {
        self.nodes.get(handle.0 as usize)
    }

    /// Returns the value behind `handle` mutably.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Value> {
        self.nodes.get_mut(handle.0 as usize)
    }

    /// Returns true if `handle` was issued by this graph.
    pub fn contains(&self, handle: Handle) -> bool {
        (handle.0 as usize) < self.nodes.len()
    }

    /// Iterates over every value with its handle, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Value)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, value)| (Handle(i as u32), value))
    }

    /// Drops every value inserted after the first `len`.
    ///
    /// Handles at or past `len` become dangling; callers use this only for
    /// scratch values nothing else refers to.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn null(&mut self) -> Handle {
        self.insert(Value::Null)
    }

    pub fn undefined(&mut self) -> Handle {
        self.insert(Value::Undefined)
    }

    pub fn bool(&mut self, value: bool) -> Handle {
        self.insert(Value::Bool(value))
    }

    pub fn number(&mut self, value: f64) -> Handle {
        self.insert(Value::Number(value))
    }

    pub fn text(&mut self, value: impl Into<String>) -> Handle {
        self.insert(Value::Text(value.into()))
    }

    /// Inserts a dense array of existing handles.
    pub fn array(&mut self, elements: impl IntoIterator<Item = Handle>) -> Handle {
        self.insert(Value::Array(elements.into_iter().map(Some).collect()))
    }

    /// Inserts an empty record.
    pub fn record(&mut self) -> Handle {
        self.insert(Value::record())
    }

    /// Inserts a record with the given members, in order.
    pub fn record_from<K: Into<String>>(
        &mut self,
        members: impl IntoIterator<Item = (K, Handle)>,
    ) -> Handle {
        let members: Members = members.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.insert(Value::Record(members))
    }

    pub fn callable(&mut self, source: impl Into<String>) -> Handle {
        self.insert(Value::Callable(Callable::from_source(source)))
    }

    pub fn date(&mut self, date: JsDate) -> Handle {
        self.insert(Value::DateTime(date))
    }

    pub fn pattern(&mut self, source: impl Into<String>, flags: impl Into<String>) -> Handle {
        self.insert(Value::Pattern(Pattern::new(source, flags)))
    }

    pub fn error(&mut self, message: Option<&str>) -> Handle {
        self.insert(Value::Error(message.map(str::to_string)))
    }

    pub fn bytes(&mut self, bytes: impl Into<Vec<u8>>) -> Handle {
        self.insert(Value::Bytes(bytes.into()))
    }

    pub fn typed_array(
        &mut self,
        kind: ElementKind,
        elements: impl IntoIterator<Item = f64>,
    ) -> Handle {
        self.insert(Value::TypedArray(TypedArray::new(kind, elements)))
    }

    /// Inserts an empty set.
    pub fn set(&mut self) -> Handle {
        self.insert(Value::Set(Vec::new()))
    }

    /// Inserts an empty map.
    pub fn map(&mut self) -> Handle {
        self.insert(Value::Map(Vec::new()))
    }

    // =========================================================================
    // Wiring
    // =========================================================================

    /// Sets `record[key] = value`, keeping the key's original position if
    /// it already exists. Returns false if `record` is not a record.
    pub fn set_member(&mut self, record: Handle, key: impl Into<String>, value: Handle) -> bool {
        match self.get_mut(record) {
            Some(Value::Record(members)) => {
                members.insert(key.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Appends an element (or a hole) to an array.
    pub fn push_element(&mut self, array: Handle, element: Option<Handle>) -> bool {
        match self.get_mut(array) {
            Some(Value::Array(elements)) => {
                elements.push(element);
                true
            }
            _ => false,
        }
    }

    /// Adds `value` to a set unless an equal member is present.
    ///
    /// Returns true if the set grew.
    pub fn set_add(&mut self, set: Handle, value: Handle) -> bool {
        let present = match self.get(set) {
            Some(Value::Set(members)) => members.iter().any(|m| self.same_value_zero(*m, value)),
            _ => return false,
        };
        if present {
            return false;
        }
        if let Some(Value::Set(members)) = self.get_mut(set) {
            members.push(value);
        }
        true
    }

    /// Sets `map[key] = value`, replacing the value of an equal key in place.
    pub fn map_insert(&mut self, map: Handle, key: Handle, value: Handle) -> bool {
        let position = match self.get(map) {
            Some(Value::Map(entries)) => entries
                .iter()
                .position(|(k, _)| self.same_value_zero(*k, key)),
            _ => return false,
        };
        if let Some(Value::Map(entries)) = self.get_mut(map) {
            match position {
                Some(i) => entries[i].1 = value,
                None => entries.push((key, value)),
            }
        }
        true
    }

    /// SameValueZero: identity for objects and callables, value equality for
    /// primitives with NaN equal to itself.
    pub fn same_value_zero(&self, a: Handle, b: Handle) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Some(Value::Null), Some(Value::Null)) => true,
            (Some(Value::Undefined), Some(Value::Undefined)) => true,
            (Some(Value::Bool(x)), Some(Value::Bool(y))) => x == y,
            (Some(Value::Number(x)), Some(Value::Number(y))) => {
                x == y || (x.is_nan() && y.is_nan())
            }
            (Some(Value::Text(x)), Some(Value::Text(y))) => x == y,
            _ => false,
        }
    }

    // =========================================================================
    // Structural equality
    // =========================================================================

    /// Compares the value at `a` in `self` with the value at `b` in `other`.
    ///
    /// Identity is ignored: shared and copied sub-objects compare equal.
    /// NaN equals NaN, a hole equals `Undefined`, an error without message
    /// equals one with an empty message. Revisiting a pair under comparison
    /// counts as equal, so cyclic graphs compare without diverging.
    pub fn structurally_eq(&self, a: Handle, other: &Graph, b: Handle) -> bool {
        let mut assumed = FxHashSet::default();
        self.eq_at(a, other, b, &mut assumed)
    }

    fn eq_at(
        &self,
        a: Handle,
        other: &Graph,
        b: Handle,
        assumed: &mut FxHashSet<(Handle, Handle)>,
    ) -> bool {
        let (Some(x), Some(y)) = (self.get(a), other.get(b)) else {
            return false;
        };
        if x.kind().is_container() && !assumed.insert((a, b)) {
            return true;
        }
        match (x, y) {
            (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(p), Value::Bool(q)) => p == q,
            (Value::Number(p), Value::Number(q)) => p == q || (p.is_nan() && q.is_nan()),
            (Value::Text(p), Value::Text(q)) => p == q,
            (Value::Array(p), Value::Array(q)) => {
                p.len() == q.len()
                    && p.iter().zip(q).all(|(e, f)| match (e, f) {
                        (Some(e), Some(f)) => self.eq_at(*e, other, *f, assumed),
                        (None, None) => true,
                        (Some(e), None) => matches!(self.get(*e), Some(Value::Undefined)),
                        (None, Some(f)) => matches!(other.get(*f), Some(Value::Undefined)),
                    })
            }
            (Value::Record(p), Value::Record(q)) => {
                p.len() == q.len()
                    && p.iter().zip(q).all(|((pk, pv), (qk, qv))| {
                        pk == qk && self.eq_at(*pv, other, *qv, assumed)
                    })
            }
            (Value::Callable(p), Value::Callable(q)) => p.source == q.source,
            (Value::DateTime(p), Value::DateTime(q)) => p == q,
            (Value::Pattern(p), Value::Pattern(q)) => p == q,
            (Value::Error(p), Value::Error(q)) => {
                p.as_deref().unwrap_or("") == q.as_deref().unwrap_or("")
            }
            (Value::Bytes(p), Value::Bytes(q)) => p == q,
            (Value::TypedArray(p), Value::TypedArray(q)) => {
                p.kind() == q.kind()
                    && p.len() == q.len()
                    && p.elements()
                        .iter()
                        .zip(q.elements())
                        .all(|(e, f)| e == f || (e.is_nan() && f.is_nan()))
            }
            (Value::Set(p), Value::Set(q)) => {
                p.len() == q.len()
                    && p.iter()
                        .zip(q)
                        .all(|(e, f)| self.eq_at(*e, other, *f, assumed))
            }
            (Value::Map(p), Value::Map(q)) => {
                p.len() == q.len()
                    && p.iter().zip(q).all(|((pk, pv), (qk, qv))| {
                        self.eq_at(*pk, other, *qk, assumed) && self.eq_at(*pv, other, *qv, assumed)
                    })
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueKind;

    #[test]
    fn test_insert_and_get() {
        let mut graph = Graph::new();
        let h = graph.text("hello");
        assert_eq!(graph.get(h), Some(&Value::Text("hello".to_string())));
        assert!(graph.contains(h));
        assert!(!graph.contains(Handle(42)));
        assert_eq!(graph.get(Handle(42)), None);
    }

    #[test]
    fn test_iter_in_insertion_order() {
        let mut graph = Graph::new();
        let a = graph.bool(true);
        let b = graph.null();
        let seen: Vec<(Handle, ValueKind)> = graph.iter().map(|(h, v)| (h, v.kind())).collect();
        assert_eq!(seen, [(a, ValueKind::Bool), (b, ValueKind::Null)]);
    }

    #[test]
    fn test_set_member_keeps_position() {
        let mut graph = Graph::new();
        let record = graph.record();
        let one = graph.number(1.0);
        let two = graph.number(2.0);
        graph.set_member(record, "b", one);
        graph.set_member(record, "a", one);
        graph.set_member(record, "b", two);

        let Some(Value::Record(members)) = graph.get(record) else {
            panic!("expected record");
        };
        let keys: Vec<&str> = members.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(members["b"], two);
    }

    #[test]
    fn test_wiring_rejects_wrong_kind() {
        let mut graph = Graph::new();
        let text = graph.text("x");
        let one = graph.number(1.0);
        assert!(!graph.set_member(text, "a", one));
        assert!(!graph.push_element(text, Some(one)));
        assert!(!graph.set_add(text, one));
        assert!(!graph.map_insert(text, one, one));
    }

    #[test]
    fn test_set_uniqueness() {
        let mut graph = Graph::new();
        let set = graph.set();
        let a = graph.number(f64::NAN);
        let b = graph.number(f64::NAN);
        let r1 = graph.record();
        let r2 = graph.record();
        assert!(graph.set_add(set, a));
        assert!(!graph.set_add(set, b));
        assert!(graph.set_add(set, r1));
        assert!(graph.set_add(set, r2));
        assert!(!graph.set_add(set, r1));
        assert!(matches!(graph.get(set), Some(Value::Set(m)) if m.len() == 3));
    }

    #[test]
    fn test_map_replaces_value() {
        let mut graph = Graph::new();
        let map = graph.map();
        let k1 = graph.text("k");
        let k2 = graph.text("k");
        let v1 = graph.number(1.0);
        let v2 = graph.number(2.0);
        graph.map_insert(map, k1, v1);
        graph.map_insert(map, k2, v2);
        assert_eq!(graph.get(map), Some(&Value::Map(vec![(k1, v2)])));
    }

    #[test]
    fn test_structural_equality_ignores_sharing() {
        let mut left = Graph::new();
        let shared = left.record();
        let one = left.number(1.0);
        left.set_member(shared, "x", one);
        let root_l = left.record_from([("a", shared), ("b", shared)]);

        let mut right = Graph::new();
        let one = right.number(1.0);
        let first = right.record_from([("x", one)]);
        let one = right.number(1.0);
        let second = right.record_from([("x", one)]);
        let root_r = right.record_from([("a", first), ("b", second)]);

        assert!(left.structurally_eq(root_l, &right, root_r));
    }

    #[test]
    fn test_structural_equality_order_matters() {
        let mut graph = Graph::new();
        let one = graph.number(1.0);
        let two = graph.number(2.0);
        let ab = graph.record_from([("a", one), ("b", two)]);
        let ba = graph.record_from([("b", two), ("a", one)]);
        assert!(!graph.structurally_eq(ab, &graph, ba));
    }

    #[test]
    fn test_structural_equality_cycles() {
        let mut graph = Graph::new();
        let a = graph.record();
        graph.set_member(a, "self", a);
        let b = graph.record();
        graph.set_member(b, "self", b);
        assert!(graph.structurally_eq(a, &graph, b));
    }

    #[test]
    fn test_structural_equality_holes() {
        let mut graph = Graph::new();
        let undef = graph.undefined();
        let sparse = graph.insert(Value::Array(vec![None]));
        let dense = graph.array([undef]);
        assert!(graph.structurally_eq(sparse, &graph, dense));
    }

    #[test]
    fn test_structural_equality_errors() {
        let mut graph = Graph::new();
        let none = graph.error(None);
        let empty = graph.error(Some(""));
        let msg = graph.error(Some("boom"));
        assert!(graph.structurally_eq(none, &graph, empty));
        assert!(!graph.structurally_eq(none, &graph, msg));
    }
}
