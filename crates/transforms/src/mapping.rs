//! Record of where bytes were spliced into a stream.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Offsets at which bytes were inserted and how many, in final-stream coordinates.
///
/// Recording a new insertion moves every earlier record at or after its offset, so the map
/// always describes the stream as it is now.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsertionMap(BTreeMap<usize, usize>);

impl InsertionMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `len` bytes spliced in at `at`.
    pub fn record(&mut self, at: usize, len: usize) {
        if len == 0 {
            return;
        }
        let moved = self.0.split_off(&at);
        self.0
            .extend(moved.into_iter().map(|(offset, l)| (offset + len, l)));
        self.0.insert(at, len);
    }

    /// Iterates `(offset, length)` pairs in offset order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().map(|(&at, &len)| (at, len))
    }

    /// Number of separate insertions recorded.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was inserted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of inserted bytes.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Returns the offset where the byte originally at `old` ends up.
    pub fn translate(&self, old: usize) -> usize {
        self.iter()
            .fold(old, |pos, (at, len)| if at <= pos { pos + len } else { pos })
    }
}
