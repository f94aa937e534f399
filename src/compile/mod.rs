//! The compiler (§4.9): turns one parsed `SELECT` statement into one or two
//! typed point streams by wiring the factory call through the combinator
//! pipeline — demux → (call iterator, if a function call) → fill → binary
//! expression → derivative — mirroring the teacher's long-lived
//! `ExecutionKernel` wrapping per-call state rather than a bare free function.
//!
//! This module only ever sees the already-parsed, already-typed statement
//! shape below; lexing/parsing a query string is out of scope (§1).

mod options;
mod statement;

pub use options::CompileOptions;
pub use statement::{BinaryExprSpec, DerivativeUnit, FieldCall, SelectStatement};

use crate::{
    aggregate::{top_bottom_paired, AggregateFn, CallIterator, TagLiftStream},
    binary_expr::BinaryExprStream,
    context::{CancellationToken, NeverCancelled},
    demux::demux,
    derivative::DerivativeStream,
    error::EngineError,
    factory::StreamFactory,
    fill,
    request::FillPolicy,
    stream::{BoxStream, CancellableStream, PointStream},
};
use std::rc::Rc;

/// The result of compiling one statement: most calls yield a single stream,
/// but a tagged `top`/`bottom` call (§4.3) yields a value stream paired with
/// a time-aligned companion stream carrying the partitioning tag's value.
pub enum CompiledSelect {
    Single(BoxStream),
    Tagged(BoxStream, BoxStream),
}

impl CompiledSelect {
    /// Unwraps the common case; panics if this is a tagged result. Callers
    /// that don't know in advance should match on the enum instead.
    #[must_use]
    pub fn into_single(self) -> BoxStream {
        match self {
            Self::Single(stream) => stream,
            Self::Tagged(stream, _) => stream,
        }
    }
}

///
/// Select
///
/// A reusable compiler bound to one [`StreamFactory`] and one
/// [`CompileOptions`]. Constructed once per connection scope and reused
/// across statements.
///

pub struct Select<'f> {
    factory: &'f dyn StreamFactory,
    options: CompileOptions,
    context: Rc<dyn CancellationToken>,
}

impl<'f> Select<'f> {
    /// Builds a compiler that never observes cancellation — the right choice
    /// for a host that has no deadline/cancel concept of its own, or for
    /// tests. Use [`Select::with_context`] to wire in a real token.
    #[must_use]
    pub fn new(factory: &'f dyn StreamFactory, options: CompileOptions) -> Self {
        Self::with_context(factory, options, Rc::new(NeverCancelled))
    }

    /// Builds a compiler whose compiled streams check `context` on every
    /// pull (§6, §7); see [`CancellableStream`].
    #[must_use]
    pub fn with_context(
        factory: &'f dyn StreamFactory,
        options: CompileOptions,
        context: Rc<dyn CancellationToken>,
    ) -> Self {
        Self { factory, options, context }
    }

    /// # Errors
    /// Returns an `EngineError` with `ErrorOrigin::Compile` for any
    /// statement the factory's declared field kind cannot satisfy (unknown
    /// function, arity mismatch, type mismatch), and propagates
    /// `ErrorOrigin::Factory` errors raised while producing the raw stream.
    pub fn compile(&self, stmt: &SelectStatement) -> Result<CompiledSelect, EngineError> {
        let request = stmt.to_request();
        let raw = self.factory.create(&request)?;

        // A tagged top/bottom's partitioning tag (§4.3) need not be a GROUP BY
        // dimension, but `demux` below collapses every point's tags down to
        // just the dimension set. Lift the partitioning tag's value into the
        // point's aux slot first so it survives the collapse.
        let raw: BoxStream = match &stmt.field {
            FieldCall::Aggregate {
                func,
                tag: Some(tag_key),
                ..
            } if matches!(func, AggregateFn::Top | AggregateFn::Bottom) => {
                Box::new(TagLiftStream::new(tag_key.clone(), raw))
            }
            _ => raw,
        };

        let demuxed = demux(&stmt.dimensions, raw)?;

        match &stmt.field {
            FieldCall::Plain(_) => {
                let pipeline = self.apply_tail(stmt, demuxed)?;
                Ok(CompiledSelect::Single(pipeline))
            }
            FieldCall::Aggregate {
                func,
                limit,
                percentile,
                tag,
                ..
            } => {
                let input_kind = demuxed.kind();
                let output_kind = func.output_kind(input_kind)?;
                let call_iter = CallIterator::new(
                    demuxed,
                    *func,
                    output_kind,
                    stmt.time_lo,
                    stmt.offset,
                    stmt.interval,
                    *limit,
                    *percentile,
                    tag.clone(),
                );

                let is_tagged_selector =
                    matches!(func, AggregateFn::Top | AggregateFn::Bottom) && tag.is_some();

                if is_tagged_selector {
                    let (primary, companion) = top_bottom_paired(call_iter);
                    let primary = self.apply_tail(stmt, primary)?;
                    let companion: BoxStream =
                        Box::new(CancellableStream::new(companion, Rc::clone(&self.context)));
                    return Ok(CompiledSelect::Tagged(primary, companion));
                }

                let boxed: BoxStream = Box::new(call_iter);
                let pipeline = self.apply_tail(stmt, boxed)?;
                Ok(CompiledSelect::Single(pipeline))
            }
        }
    }

    /// Applies the stages common to every field shape: fill, binary
    /// expression, derivative, then the cancellation check — in that order,
    /// per `SPEC_FULL.md` §4.9.
    fn apply_tail(&self, stmt: &SelectStatement, stream: BoxStream) -> Result<BoxStream, EngineError> {
        let filled = if matches!(stmt.fill, FillPolicy::None) && !stmt.is_windowed() {
            stream
        } else {
            fill::fill(&stmt.fill, stmt.time_lo, stmt.time_hi, stmt.offset, stmt.interval, stream)?
        };

        let with_expr = match &stmt.binary {
            Some(expr) => Box::new(BinaryExprStream::new(
                filled,
                expr.op,
                expr.lhs.clone(),
                expr.rhs.clone(),
                expr.output_kind,
            )) as BoxStream,
            None => filled,
        };

        let with_derivative = match stmt.derivative {
            Some(DerivativeUnit::Explicit(unit)) => Box::new(DerivativeStream::new(with_expr, unit)) as BoxStream,
            Some(DerivativeUnit::Default) => {
                Box::new(DerivativeStream::new(with_expr, self.options.derivative_default_unit_nanos)) as BoxStream
            }
            None => with_expr,
        };

        Ok(Box::new(CancellableStream::new(with_derivative, Rc::clone(&self.context))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        point::{Kind, Point, Tags, Value},
        request::RequestDescriptor,
        stream::VecPointStream,
    };

    struct CannedFactory {
        kind: Kind,
        points: Vec<Point>,
    }

    impl StreamFactory for CannedFactory {
        fn create(&self, _request: &RequestDescriptor) -> Result<BoxStream, EngineError> {
            Ok(Box::new(VecPointStream::new(self.kind, self.points.clone())))
        }
    }

    #[test]
    fn compiles_a_windowed_min_over_a_single_series() {
        let factory = CannedFactory {
            kind: Kind::Float,
            points: vec![
                Point::new("cpu", Tags::from_pairs([("host", "A")]), 0, Value::Float(5.0)),
                Point::new("cpu", Tags::from_pairs([("host", "A")]), 5, Value::Float(2.0)),
                Point::new("cpu", Tags::from_pairs([("host", "A")]), 11, Value::Float(9.0)),
            ],
        };

        let mut stmt = SelectStatement::new("cpu", FieldCall::Aggregate {
            func: AggregateFn::Min,
            field: "value".to_string(),
            limit: None,
            percentile: None,
            tag: None,
        });
        stmt.interval = 10;
        stmt.time_lo = 0;
        stmt.time_hi = 20;
        stmt.dimensions = vec!["host".to_string()];
        stmt.fill = FillPolicy::None;

        let select = Select::new(&factory, CompileOptions::default());
        let mut out = select.compile(&stmt).unwrap().into_single();

        let mut got = Vec::new();
        while let Some(pt) = out.next().unwrap() {
            got.push((pt.time, pt.value.as_f64().unwrap()));
        }
        assert_eq!(got, vec![(0, 2.0), (10, 9.0)]);
    }

    #[test]
    fn tagged_top_lifts_the_partitioning_tag_across_demux() {
        // host isn't a GROUP BY dimension (region is), so only TagLiftStream
        // running ahead of demux keeps it alive for TopBottomAgg to read.
        let factory = CannedFactory {
            kind: Kind::Float,
            points: vec![
                Point::new(
                    "cpu",
                    Tags::from_pairs([("host", "A"), ("region", "east")]),
                    0,
                    Value::Float(1.0),
                ),
                Point::new(
                    "cpu",
                    Tags::from_pairs([("host", "A"), ("region", "east")]),
                    10,
                    Value::Float(20.0),
                ),
                Point::new(
                    "cpu",
                    Tags::from_pairs([("host", "B"), ("region", "east")]),
                    5,
                    Value::Float(9.0),
                ),
            ],
        };

        let mut stmt = SelectStatement::new("cpu", FieldCall::Aggregate {
            func: AggregateFn::Top,
            field: "value".to_string(),
            limit: Some(2),
            percentile: None,
            tag: Some("host".to_string()),
        });
        stmt.interval = 0;
        stmt.time_lo = 0;
        stmt.time_hi = 20;
        stmt.dimensions = vec!["region".to_string()];
        stmt.fill = FillPolicy::None;

        let select = Select::new(&factory, CompileOptions::default());
        let compiled = select.compile(&stmt).unwrap();
        let CompiledSelect::Tagged(mut primary, mut companion) = compiled else {
            panic!("expected a tagged result");
        };

        let mut values = Vec::new();
        while let Some(pt) = primary.next().unwrap() {
            values.push(pt.value.as_f64().unwrap());
        }
        assert_eq!(values, vec![20.0, 9.0]);

        let mut tags = Vec::new();
        while let Some(pt) = companion.next().unwrap() {
            tags.push(pt.value);
        }
        assert_eq!(tags, vec![Value::String("A".to_string()), Value::String("B".to_string())]);
    }

    #[test]
    fn cancelling_the_context_surfaces_an_error_mid_stream() {
        use crate::context::FlagCancellationToken;

        let factory = CannedFactory {
            kind: Kind::Float,
            points: vec![
                Point::new("cpu", Tags::new(), 0, Value::Float(1.0)),
                Point::new("cpu", Tags::new(), 1, Value::Float(2.0)),
            ],
        };

        let token = FlagCancellationToken::new();
        let select = Select::with_context(&factory, CompileOptions::default(), Rc::new(token.clone()));

        let mut stmt = SelectStatement::new("cpu", FieldCall::Plain("value".to_string()));
        stmt.fill = FillPolicy::None;

        let mut out = select.compile(&stmt).unwrap().into_single();
        assert!(out.next().unwrap().is_some());
        token.cancel();
        let err = out.next().unwrap_err();
        assert!(err.is_cancelled());
        assert!(out.next().unwrap().is_none());
    }
}
