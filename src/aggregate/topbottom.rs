//! `top`/`bottom` selectors (§4.3): the bounded, original-timestamp-preserving
//! family, plus the tagged variant's paired secondary output stream.
//!
//! The tagged form (`top(value, host, 3)`) must additionally emit a second,
//! time-aligned stream carrying the partitioning tag's value at each
//! selected point. [`top_bottom_paired`] tees a [`CallIterator`] into that
//! pair without duplicating the windowing state machine, mirroring the
//! teacher's `OrderedPairState` lookahead-buffering idiom generalized from
//! two inputs merging to one output, to one input fanning to two outputs.
//!
//! The partitioning tag itself is read *before* `demux` runs: demux (§4.5)
//! projects every point's tags onto the `GROUP BY` dimensions, which may not
//! include the partitioning tag at all (`top(value, host, N)` with `GROUP BY
//! region`). [`TagLiftStream`] copies the tag's value into `aux` while it is
//! still available, the same way the compiler lifts constants for binary
//! expressions (§4.8) — by synthesizing an aligned companion value rather
//! than threading a second field through every downstream combinator.

use super::{call::CallIterator, Aggregator, SelectionItem};
use crate::{
    error::EngineError,
    point::{Kind, Point, Tags, Value},
    stream::{BoxStream, PointStream, TerminalErrorGuard},
};
use std::{cell::RefCell, collections::BTreeMap, collections::VecDeque, rc::Rc};

///
/// TagLiftStream
///
/// Appends the named tag's value (or an empty string if absent) to every
/// point's `aux` vector, ahead of whatever `demux` will later do to `tags`.
///

pub(crate) struct TagLiftStream {
    inner: BoxStream,
    tag_key: String,
    guard: TerminalErrorGuard,
}

impl TagLiftStream {
    pub(crate) fn new(tag_key: String, inner: BoxStream) -> Self {
        Self {
            inner,
            tag_key,
            guard: TerminalErrorGuard::new(),
        }
    }
}

impl PointStream for TagLiftStream {
    fn kind(&self) -> Kind {
        self.inner.kind()
    }

    fn next(&mut self) -> Result<Option<Point>, EngineError> {
        let pulled = self.inner.next();
        let Some(mut point) = self.guard.guard(pulled)? else {
            return Ok(None);
        };

        let tag_value = point.tags.get(&self.tag_key).unwrap_or("").to_string();
        point.aux.push(Value::String(tag_value));
        Ok(Some(point))
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TopBottomMode {
    Top,
    Bottom,
}

///
/// TopBottomAgg
///
/// Materializes the window, ranks by value (ties broken by earlier time,
/// since `sort_by` is stable and input arrives time-ascending).
///
/// Untagged form: keeps the best `n` input points, then re-orders the kept
/// set by original timestamp for output (§4.3's "untagged variant" order).
///
/// Tagged form (`tag` is `Some`): first restricts to at most one
/// representative per distinct value of the partitioning tag (the extreme
/// within that partition), then picks the best `n` across partitions,
/// leaving the output in sorted-value order (§4.3's "tagged variant" order)
/// and pairing each selected point with its partition tag's value as a
/// companion output.
///

pub(super) struct TopBottomAgg {
    kind: Kind,
    mode: TopBottomMode,
    n: usize,
    tag: Option<String>,
    points: Vec<Point>,
}

impl TopBottomAgg {
    pub(super) fn new(kind: Kind, mode: TopBottomMode, n: usize, tag: Option<String>) -> Self {
        Self {
            kind,
            mode,
            n,
            tag,
            points: Vec::new(),
        }
    }

    fn better(&self, a: &Point, b: &Point) -> bool {
        let cmp = a.value.cmp_same_kind(&b.value);
        match self.mode {
            TopBottomMode::Top => cmp.is_gt(),
            TopBottomMode::Bottom => cmp.is_lt(),
        }
    }

    fn rank_order(&self, a: &Point, b: &Point) -> std::cmp::Ordering {
        let cmp = a.value.cmp_same_kind(&b.value).then_with(|| a.time.cmp(&b.time));
        match self.mode {
            TopBottomMode::Top => cmp.reverse(),
            TopBottomMode::Bottom => cmp,
        }
    }
}

impl Aggregator for TopBottomAgg {
    fn push(&mut self, point: &Point) {
        if point.nil {
            return;
        }
        self.points.push(point.clone());
    }

    fn finish(mut self: Box<Self>, name: &str, tags: &Tags, _window_start: i64) -> Vec<SelectionItem> {
        if self.points.is_empty() {
            return Vec::new();
        }

        if self.tag.is_none() {
            self.points.sort_by(|a, b| self.rank_order(a, b));
            self.points.truncate(self.n);
            self.points.sort_by_key(|p| p.time);

            return self
                .points
                .into_iter()
                .map(|mut p| {
                    p.name = name.to_string();
                    p.tags = tags.clone();
                    SelectionItem::plain(p)
                })
                .collect();
        }

        // Restrict to one representative (the extreme) per distinct tag value.
        // The value was lifted into `aux` by `TagLiftStream` before `demux`
        // could strip it from `tags`.
        let mut by_partition: BTreeMap<String, Point> = BTreeMap::new();
        for point in &self.points {
            let Some(tag_value) = point.aux.last().and_then(Value::as_str) else {
                continue;
            };
            match by_partition.get(tag_value) {
                Some(existing) if !self.better(point, existing) => {}
                _ => {
                    by_partition.insert(tag_value.to_string(), point.clone());
                }
            }
        }

        let mut representatives: Vec<(String, Point)> = by_partition.into_iter().collect();
        representatives.sort_by(|a, b| self.rank_order(&a.1, &b.1));
        representatives.truncate(self.n);

        representatives
            .into_iter()
            .map(|(tag_value, mut point)| {
                point.name = name.to_string();
                point.tags = tags.clone();
                SelectionItem {
                    point,
                    companion: Some(Value::String(tag_value)),
                }
            })
            .collect()
    }
}

struct TeeState {
    inner: CallIterator,
    primary: VecDeque<Point>,
    companion: VecDeque<Point>,
}

impl TeeState {
    fn pull(&mut self) -> Result<bool, EngineError> {
        let Some(item) = self.inner.next_item()? else {
            return Ok(false);
        };

        let mut companion_point = Point::new(
            item.point.name.clone(),
            item.point.tags.clone(),
            item.point.time,
            item.companion.clone().unwrap_or(Value::String(String::new())),
        );
        companion_point.nil = item.companion.is_none();

        self.primary.push_back(item.point);
        self.companion.push_back(companion_point);
        Ok(true)
    }
}

struct PrimaryTee {
    kind: Kind,
    shared: Rc<RefCell<TeeState>>,
}

impl PointStream for PrimaryTee {
    fn kind(&self) -> Kind {
        self.kind
    }

    fn next(&mut self) -> Result<Option<Point>, EngineError> {
        loop {
            let mut state = self.shared.borrow_mut();
            if let Some(point) = state.primary.pop_front() {
                return Ok(Some(point));
            }
            if !state.pull()? {
                return Ok(None);
            }
        }
    }
}

struct CompanionTee {
    shared: Rc<RefCell<TeeState>>,
}

impl PointStream for CompanionTee {
    fn kind(&self) -> Kind {
        Kind::String
    }

    fn next(&mut self) -> Result<Option<Point>, EngineError> {
        loop {
            let mut state = self.shared.borrow_mut();
            if let Some(point) = state.companion.pop_front() {
                return Ok(Some(point));
            }
            if !state.pull()? {
                return Ok(None);
            }
        }
    }
}

/// Split a tagged `top`/`bottom` call's output into `(value stream,
/// companion-tag stream)`, time-aligned point for point.
#[must_use]
pub fn top_bottom_paired(call_iter: CallIterator) -> (BoxStream, BoxStream) {
    let kind = call_iter.kind();
    let shared = Rc::new(RefCell::new(TeeState {
        inner: call_iter,
        primary: VecDeque::new(),
        companion: VecDeque::new(),
    }));

    let primary: BoxStream = Box::new(PrimaryTee {
        kind,
        shared: Rc::clone(&shared),
    });
    let companion: BoxStream = Box::new(CompanionTee { shared });

    (primary, companion)
}
