//! Single-series derivative transform (§4.7): the rate of change between
//! consecutive non-null points in the same series, scaled to a unit
//! duration. Always emits `float`, regardless of the input kind.

use crate::{
    error::EngineError,
    point::{Kind, Point, Tags, Value},
    stream::{BoxStream, PointStream, TerminalErrorGuard},
};

///
/// DerivativeStream
///
/// Upstream must already be ordered by `(tags, time)`. The first point of
/// each series has no predecessor to derive against and is consumed
/// silently, matching the spec's "one fewer output point per series" rule
/// rather than emitting a leading nil.
///

pub struct DerivativeStream {
    inner: BoxStream,
    unit_nanos: i64,
    prev: Option<Point>,
    guard: TerminalErrorGuard,
}

impl DerivativeStream {
    /// `unit_nanos` is the duration the rate is expressed per (e.g.
    /// `1_000_000_000` for "per second").
    #[must_use]
    pub fn new(inner: BoxStream, unit_nanos: i64) -> Self {
        Self {
            inner,
            unit_nanos: unit_nanos.max(1),
            prev: None,
            guard: TerminalErrorGuard::new(),
        }
    }
}

impl PointStream for DerivativeStream {
    fn kind(&self) -> Kind {
        Kind::Float
    }

    fn next(&mut self) -> Result<Option<Point>, EngineError> {
        loop {
            let pulled = self.inner.next();
            let point = match self.guard.guard(pulled)? {
                Some(point) => point,
                None => return Ok(None),
            };

            let is_new_series = self.prev.as_ref().is_none_or(|p| p.tags != point.tags);
            if is_new_series {
                self.prev = Some(point);
                continue;
            }

            let prev = self.prev.take().expect("checked above");
            let dt = point.time - prev.time;
            self.prev = Some(point.clone());

            if dt == 0 {
                continue;
            }

            let (Some(v0), Some(v1)) = (prev.value.as_f64(), point.value.as_f64()) else {
                continue;
            };

            let rate = (v1 - v0) / dt as f64 * self.unit_nanos as f64;
            return Ok(Some(Point::new(point.name, point.tags, point.time, Value::Float(rate))));
        }
    }

    fn close(&mut self) {
        self.inner.close();
        self.prev = None;
    }
}
