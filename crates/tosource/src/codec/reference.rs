//! Accessor paths and shared-reference bookkeeping.
//!
//! In reference mode the encoder emits each object-like value once, at the
//! first path where it is met. Later occurrences are left out of the literal
//! and recorded as [`Reference`]s so that a post-processing step can wire
//! them up again (`m.b = m.a;`).

use std::fmt;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::codec::escape::{EscapeMode, is_path_identifier, write_quoted};
use crate::model::Handle;

/// One step of an accessor path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// `.name`
    Identifier(String),
    /// `["key"]`
    Key(String),
    /// `[3]`
    Index(usize),
}

impl Segment {
    /// Returns the segment addressing record member `key`.
    pub fn for_key(key: &str) -> Self {
        if is_path_identifier(key) {
            Segment::Identifier(key.to_string())
        } else {
            Segment::Key(key.to_string())
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Identifier(name) => write!(f, ".{name}"),
            Segment::Key(key) => {
                let mut quoted = String::with_capacity(key.len() + 4);
                quoted.push('[');
                write_quoted(&mut quoted, key, EscapeMode::Safe);
                quoted.push(']');
                f.write_str(&quoted)
            }
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Accessor path from the root; the empty path is the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Returns the root path.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// A deferred assignment: the value at `origin` is the value at `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub origin: Path,
    pub target: Path,
}

impl Reference {
    /// Returns the `[origin, target]` path strings.
    pub fn to_pair(&self) -> [String; 2] {
        [self.origin.to_string(), self.target.to_string()]
    }
}

/// Current path, first-seen paths and recorded references for one
/// encoding run.
#[derive(Debug, Default)]
pub struct ReferenceTracker {
    path: Vec<Segment>,
    seen: FxHashMap<Handle, Path>,
    references: Vec<Reference>,
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descends into `segment`.
    pub fn push(&mut self, segment: Segment) {
        self.path.push(segment);
    }

    /// Returns to the parent path.
    pub fn pop(&mut self) {
        self.path.pop();
    }

    /// Number of segments in the current path.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Returns a copy of the current path.
    pub fn current_path(&self) -> Path {
        Path::from(self.path.clone())
    }

    /// Registers `handle` at the current path, or records a reference if it
    /// was registered before.
    ///
    /// Returns true if a reference was recorded, in which case the caller
    /// must not emit the value again.
    pub fn mark_referenced(&mut self, handle: Handle) -> bool {
        match self.seen.get(&handle) {
            Some(target) => {
                let reference = Reference {
                    origin: self.current_path(),
                    target: target.clone(),
                };
                debug!(
                    origin = %reference.origin,
                    target = %reference.target,
                    "recorded shared reference"
                );
                self.references.push(reference);
                true
            }
            None => {
                self.seen.insert(handle, self.current_path());
                false
            }
        }
    }

    /// Registers `handle` at the current path unless already registered.
    pub fn observe(&mut self, handle: Handle) {
        if !self.seen.contains_key(&handle) {
            let path = self.current_path();
            self.seen.insert(handle, path);
        }
    }

    /// Returns the references recorded so far, in encounter order.
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Returns the references as `[origin, target]` string pairs.
    pub fn reference_pairs(&self) -> Vec<[String; 2]> {
        self.references.iter().map(Reference::to_pair).collect()
    }

    /// Consumes the tracker, returning the recorded references.
    pub fn into_references(self) -> Vec<Reference> {
        self.references
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_display() {
        assert_eq!(Segment::for_key("a").to_string(), ".a");
        assert_eq!(Segment::for_key("four").to_string(), ".four");
        assert_eq!(Segment::for_key("0").to_string(), "[\"0\"]");
        assert_eq!(Segment::for_key("spa ce").to_string(), "[\"spa ce\"]");
        assert_eq!(
            Segment::for_key("</x>").to_string(),
            r#"["\u003C\u002Fx\u003E"]"#
        );
        assert_eq!(Segment::Index(3).to_string(), "[3]");
    }

    #[test]
    fn test_path_display() {
        let path = Path::from(vec![
            Segment::for_key("a"),
            Segment::for_key("4 four"),
            Segment::Index(0),
        ]);
        assert_eq!(path.to_string(), ".a[\"4 four\"][0]");
        assert_eq!(Path::root().to_string(), "");
        assert!(Path::root().is_root());
    }

    #[test]
    fn test_mark_referenced() {
        let mut tracker = ReferenceTracker::new();
        let shared = Handle(7);

        tracker.push(Segment::for_key("a"));
        assert!(!tracker.mark_referenced(shared));
        tracker.pop();

        tracker.push(Segment::for_key("b"));
        assert!(tracker.mark_referenced(shared));
        tracker.pop();

        assert_eq!(tracker.depth(), 0);
        assert_eq!(
            tracker.reference_pairs(),
            vec![[".b".to_string(), ".a".to_string()]]
        );
    }

    #[test]
    fn test_observe_root() {
        let mut tracker = ReferenceTracker::new();
        let root = Handle(0);
        tracker.observe(root);
        tracker.push(Segment::for_key("self"));
        assert!(tracker.mark_referenced(root));
        tracker.pop();

        let references = tracker.into_references();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].origin.to_string(), ".self");
        assert!(references[0].target.is_root());
    }
}
