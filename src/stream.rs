//! The point stream contract (§4.1) and the handful of concrete streams
//! every combinator is built from.
//!
//! Shaped directly on the teacher's `OrderedKeyStream`: a pull-based trait
//! returning `Result<Option<T>, Error>`, never an exception for end-of-stream,
//! with `Box<dyn Trait>` as the default object-safe wrapper.

use crate::{context::CancellationToken, error::EngineError, point::{Kind, Point}};
use std::rc::Rc;

///
/// PointStream
///
/// `next()` is idempotent after exhaustion: once it returns `Ok(None)` it
/// keeps returning `Ok(None)`. A factory error is cached and replayed as
/// `Ok(None)` on every subsequent call after the first `Err` (§7).
///

pub trait PointStream {
    /// The single kind every point this stream emits carries.
    fn kind(&self) -> Kind;

    fn next(&mut self) -> Result<Option<Point>, EngineError>;

    /// Release upstream resources. Safe to call more than once; further
    /// `next()` calls return `Ok(None)`.
    fn close(&mut self) {}
}

pub type BoxStream = Box<dyn PointStream>;

impl PointStream for BoxStream {
    fn kind(&self) -> Kind {
        self.as_ref().kind()
    }

    fn next(&mut self) -> Result<Option<Point>, EngineError> {
        self.as_mut().next()
    }

    fn close(&mut self) {
        self.as_mut().close();
    }
}

///
/// TerminalErrorGuard
///
/// Wraps the "surface the factory error once, then EOF forever" rule (§7)
/// so every combinator that owns a raw factory stream doesn't have to
/// reimplement it.
///

#[derive(Default)]
pub(crate) struct TerminalErrorGuard {
    poisoned: bool,
}

impl TerminalErrorGuard {
    pub(crate) const fn new() -> Self {
        Self { poisoned: false }
    }

    pub(crate) fn guard(
        &mut self,
        result: Result<Option<Point>, EngineError>,
    ) -> Result<Option<Point>, EngineError> {
        if self.poisoned {
            return Ok(None);
        }

        if result.is_err() {
            self.poisoned = true;
        }

        result
    }

    pub(crate) const fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}

///
/// VecPointStream
///
/// Adapter exposing one materialized, already-ordered point vector through
/// `PointStream`. Used by combinators that must fully consume and re-sort
/// their input (demux) and by tests standing in for canned factory output.
///

pub struct VecPointStream {
    kind: Kind,
    points: std::vec::IntoIter<Point>,
    closed: bool,
}

impl VecPointStream {
    #[must_use]
    pub fn new(kind: Kind, points: Vec<Point>) -> Self {
        Self {
            kind,
            points: points.into_iter(),
            closed: false,
        }
    }
}

impl PointStream for VecPointStream {
    fn kind(&self) -> Kind {
        self.kind
    }

    fn next(&mut self) -> Result<Option<Point>, EngineError> {
        if self.closed {
            return Ok(None);
        }

        Ok(self.points.next())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

///
/// CancellableStream
///
/// Outermost wrapper `compile()` places around every output stream (§6, §7):
/// checks the token once per `next()` call — a window boundary's worth of
/// work upstream of here at most — and, the first time it observes
/// cancellation, surfaces `EngineError::cancelled()` exactly once before
/// settling into the same "replay `None` forever" contract every other
/// terminal state in this engine follows.
///

pub struct CancellableStream {
    inner: BoxStream,
    context: Rc<dyn CancellationToken>,
    poisoned: bool,
}

impl CancellableStream {
    #[must_use]
    pub fn new(inner: BoxStream, context: Rc<dyn CancellationToken>) -> Self {
        Self {
            inner,
            context,
            poisoned: false,
        }
    }
}

impl PointStream for CancellableStream {
    fn kind(&self) -> Kind {
        self.inner.kind()
    }

    fn next(&mut self) -> Result<Option<Point>, EngineError> {
        if self.poisoned {
            return Ok(None);
        }

        if self.context.is_cancelled() {
            self.poisoned = true;
            return Err(EngineError::cancelled());
        }

        self.inner.next()
    }

    fn close(&mut self) {
        self.inner.close();
        self.poisoned = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::FlagCancellationToken, point::{Tags, Value}};

    #[test]
    fn vec_point_stream_exhausts_then_stays_exhausted() {
        let mut s = VecPointStream::new(
            Kind::Float,
            vec![Point::new("cpu", Tags::new(), 0, Value::Float(1.0))],
        );
        assert!(s.next().unwrap().is_some());
        assert!(s.next().unwrap().is_none());
        assert!(s.next().unwrap().is_none());
    }

    #[test]
    fn close_makes_next_return_none() {
        let mut s = VecPointStream::new(
            Kind::Float,
            vec![Point::new("cpu", Tags::new(), 0, Value::Float(1.0))],
        );
        s.close();
        assert!(s.next().unwrap().is_none());
    }

    #[test]
    fn terminal_error_guard_replays_none_after_error() {
        let mut guard = TerminalErrorGuard::new();
        let err = Err(EngineError::factory("boom"));
        assert!(guard.guard(err).is_err());
        assert!(guard.is_poisoned());
        assert_eq!(guard.guard(Ok(None)), Ok(None));
    }

    #[test]
    fn cancellable_stream_surfaces_error_once_then_exhausts() {
        let token = FlagCancellationToken::new();
        let inner: BoxStream = Box::new(VecPointStream::new(
            Kind::Float,
            vec![Point::new("cpu", Tags::new(), 0, Value::Float(1.0)), Point::new("cpu", Tags::new(), 1, Value::Float(2.0))],
        ));
        let mut wrapped = CancellableStream::new(inner, Rc::new(token.clone()));

        assert!(wrapped.next().unwrap().is_some());
        token.cancel();
        assert!(wrapped.next().is_err());
        assert!(wrapped.next().unwrap().is_none());
    }
}
