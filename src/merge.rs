//! k-way ordered merge of matching-kind sub-streams (§4.6), keyed on
//! `(tags, time)`. Generalizes the teacher's two-way `MergeOrderedKeyStream`
//! lookahead merge to N inputs via a binary heap of single-item lookaheads,
//! so memory stays O(number of live sub-streams) rather than O(total size).

use crate::{
    error::EngineError,
    point::{Kind, Point},
    stream::{BoxStream, PointStream},
};
use std::cmp::Ordering;

struct Lookahead {
    index: usize,
    point: Point,
}

impl PartialEq for Lookahead {
    fn eq(&self, other: &Self) -> bool {
        self.point.order_key() == other.point.order_key()
    }
}
impl Eq for Lookahead {}

impl PartialOrd for Lookahead {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Lookahead {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want the smallest (tags, time) first,
        // so reverse the comparison.
        other.point.order_key().cmp(&self.point.order_key())
    }
}

///
/// MergeStream
///
/// Merges `N` already (tags, time)-ordered point streams of the same kind
/// into one. Each input contributes at most one buffered lookahead point at
/// a time.
///

pub struct MergeStream {
    kind: Kind,
    inputs: Vec<BoxStream>,
    heap: std::collections::BinaryHeap<Lookahead>,
    primed: bool,
}

impl MergeStream {
    /// # Errors
    /// Returns an error if `inputs` is empty or the inputs disagree on kind.
    pub fn new(inputs: Vec<BoxStream>) -> Result<Self, EngineError> {
        let kind = inputs
            .first()
            .map(PointStream::kind)
            .ok_or_else(|| EngineError::factory("merge: at least one input stream is required"))?;

        if inputs.iter().any(|s| s.kind() != kind) {
            return Err(EngineError::factory("merge: input streams disagree on kind"));
        }

        Ok(Self {
            kind,
            inputs,
            heap: std::collections::BinaryHeap::new(),
            primed: false,
        })
    }

    fn prime(&mut self) -> Result<(), EngineError> {
        if self.primed {
            return Ok(());
        }
        self.primed = true;

        for index in 0..self.inputs.len() {
            self.pull(index)?;
        }
        Ok(())
    }

    fn pull(&mut self, index: usize) -> Result<(), EngineError> {
        if let Some(point) = self.inputs[index].next()? {
            self.heap.push(Lookahead { index, point });
        }
        Ok(())
    }
}

impl PointStream for MergeStream {
    fn kind(&self) -> Kind {
        self.kind
    }

    fn next(&mut self) -> Result<Option<Point>, EngineError> {
        self.prime()?;

        let Some(Lookahead { index, point }) = self.heap.pop() else {
            return Ok(None);
        };

        self.pull(index)?;
        Ok(Some(point))
    }

    fn close(&mut self) {
        for input in &mut self.inputs {
            input.close();
        }
        self.heap.clear();
    }
}
