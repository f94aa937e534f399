//! The call iterator: drives one [`Aggregator`] per live `(series, window)`
//! pair over an upstream point stream, flushing each aggregator as its
//! window closes. Upstream must already be ordered by `(tags, time)` (the
//! demux/merge combinators guarantee this) — but that ordering is
//! series-major, not window-major, and output must be the reverse: spec.md
//! §8's S1 scenario and the original system's `TestSelect_Min` both require
//! output ordered by `(window_start, tags)` so that every live series'
//! output for one window boundary is emitted together before the next
//! window starts (`host=A@0`, `host=B@0`, `host=A@10`, `host=A@30` — never
//! `host=A@0`, `host=A@10`, `host=A@30`, `host=B@0`).
//!
//! Producing that order from series-major input requires seeing every
//! series before the first output point can be emitted, so this iterator
//! fully drains upstream, closes one aggregator per `(name, tags, window)`
//! key as each key's run of points ends, then stable-sorts the accumulated
//! output by `(window_start, tags)` — the same full-materialization trade
//! `demux` and `fill` already make downstream of a series-major stream.

use super::{make_aggregator, make_percentile_aggregator, AggregateFn, Aggregator, SelectionItem};
use crate::{
    error::EngineError,
    point::{Kind, Point, Tags},
    stream::{BoxStream, PointStream, TerminalErrorGuard},
    window::window_start,
};
use std::collections::VecDeque;

pub struct CallIterator {
    inner: BoxStream,
    func: AggregateFn,
    output_kind: Kind,
    input_kind: Kind,
    lo: i64,
    offset: i64,
    interval: i64,
    limit: Option<u32>,
    percentile_p: Option<f64>,
    /// Partitioning tag key for the tagged `top`/`bottom` form (§4.3); `None`
    /// for every other function and for the untagged selector form.
    tag: Option<String>,
    pending: VecDeque<SelectionItem>,
    guard: TerminalErrorGuard,
    materialized: bool,
}

impl CallIterator {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        inner: BoxStream,
        func: AggregateFn,
        output_kind: Kind,
        lo: i64,
        offset: i64,
        interval: i64,
        limit: Option<u32>,
        percentile_p: Option<f64>,
        tag: Option<String>,
    ) -> Self {
        let input_kind = inner.kind();
        Self {
            inner,
            func,
            output_kind,
            input_kind,
            lo,
            offset,
            interval,
            limit,
            percentile_p,
            tag,
            pending: VecDeque::new(),
            guard: TerminalErrorGuard::new(),
            materialized: false,
        }
    }

    fn new_aggregator(&self) -> Box<dyn Aggregator> {
        match self.percentile_p {
            Some(p) => make_percentile_aggregator(self.input_kind, p),
            None => make_aggregator(self.func, self.input_kind, self.limit, self.tag.as_deref()),
        }
    }

    fn bucket(&self, point: &Point) -> i64 {
        if self.interval > 0 {
            window_start(point.time, self.lo, self.offset, self.interval)
        } else {
            self.lo
        }
    }

    /// Returns the next item in `(window_start, tags)` order, materializing
    /// every `(series, window)` output on the first call.
    ///
    /// # Errors
    /// Propagates any upstream error; the error is surfaced once and then
    /// this iterator behaves as exhausted (§7).
    pub(crate) fn next_item(&mut self) -> Result<Option<SelectionItem>, EngineError> {
        if !self.materialized {
            self.materialized = true;
            if let Err(err) = self.materialize() {
                return Err(err);
            }
        }
        Ok(self.pending.pop_front())
    }

    /// Drains upstream fully, closing one aggregator per `(name, tags,
    /// window)` key as its run of points ends, then stable-sorts every
    /// produced item by `(window_start, tags)` so output matches the
    /// cross-series window-major order §8's S1 scenario requires, rather
    /// than the series-major order upstream arrives in.
    fn materialize(&mut self) -> Result<(), EngineError> {
        let mut current: Option<(String, Tags, i64, Box<dyn Aggregator>)> = None;
        let mut items: Vec<(i64, Tags, SelectionItem)> = Vec::new();

        loop {
            let pulled = self.inner.next();
            let point = match self.guard.guard(pulled)? {
                Some(point) => point,
                None => {
                    if let Some((name, tags, window, agg)) = current.take() {
                        items.extend(agg.finish(&name, &tags, window).into_iter().map(|item| (window, tags.clone(), item)));
                    }
                    break;
                }
            };

            let window = self.bucket(&point);
            let same_key = current
                .as_ref()
                .is_some_and(|(name, tags, w, _)| *name == point.name && *tags == point.tags && *w == window);

            if !same_key {
                if let Some((name, tags, w, agg)) = current.take() {
                    log::trace!(
                        "flushing window {} for {name}{{{tags}}} at {}",
                        crate::window::format_nanos(w),
                        w
                    );
                    items.extend(agg.finish(&name, &tags, w).into_iter().map(|item| (w, tags.clone(), item)));
                }
                current = Some((point.name.clone(), point.tags.clone(), window, self.new_aggregator()));
            }

            if let Some((_, _, _, agg)) = current.as_mut() {
                agg.push(&point);
            }
        }

        items.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        self.pending = items.into_iter().map(|(_, _, item)| item).collect();
        Ok(())
    }
}

impl PointStream for CallIterator {
    fn kind(&self) -> Kind {
        self.output_kind
    }

    fn next(&mut self) -> Result<Option<Point>, EngineError> {
        Ok(self.next_item()?.map(|item| item.point))
    }

    fn close(&mut self) {
        self.inner.close();
        self.pending.clear();
        self.materialized = true;
    }
}
