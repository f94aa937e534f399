//! The aggregate/selector core (§4.2) and its call iterator driver.
//!
//! `Aggregator` is the per-(series, window) accumulator contract; `CallIterator`
//! is the windowing state machine that drives one aggregator instance per
//! live `(tags, window)` pair, flushing on every boundary crossing exactly as
//! `spec.md` §4.2's "single streaming pass" algorithm describes.

mod call;
mod distinct;
mod numeric;
mod percentile;
mod topbottom;

pub use call::CallIterator;
pub(crate) use topbottom::TagLiftStream;
pub use topbottom::{top_bottom_paired, TopBottomMode};

use crate::{
    error::EngineError,
    point::{Kind, Point, Tags, Value},
};

/// One selected/aggregated output. `companion` is populated only by the
/// tagged `top`/`bottom` family (§4.3), carrying the partitioning tag's
/// value so the compiler can split it into a second output stream.
pub(crate) struct SelectionItem {
    pub point: Point,
    pub companion: Option<Value>,
}

impl SelectionItem {
    pub(crate) const fn plain(point: Point) -> Self {
        Self {
            point,
            companion: None,
        }
    }
}

/// Per-(series, window) accumulator. A fresh instance is created for each
/// live window; `finish` consumes it and yields zero or more output items.
pub(crate) trait Aggregator {
    fn push(&mut self, point: &Point);

    fn finish(
        self: Box<Self>,
        name: &str,
        tags: &Tags,
        window_start: i64,
    ) -> Vec<SelectionItem>;
}

/// Function name → aggregator-kind table (§4.2). Resolves the call name the
/// compiler extracted from the outermost function in a field expression.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregateFn {
    Count,
    Sum,
    Min,
    Max,
    First,
    Last,
    Mean,
    Median,
    Stddev,
    Spread,
    Distinct,
    Percentile,
    Top,
    Bottom,
}

impl AggregateFn {
    /// # Errors
    /// Returns `EngineError::unknown_function` for any other identifier.
    pub fn parse(name: &str) -> Result<Self, EngineError> {
        Ok(match name {
            "count" => Self::Count,
            "sum" => Self::Sum,
            "min" => Self::Min,
            "max" => Self::Max,
            "first" => Self::First,
            "last" => Self::Last,
            "mean" => Self::Mean,
            "median" => Self::Median,
            "stddev" => Self::Stddev,
            "spread" => Self::Spread,
            "distinct" => Self::Distinct,
            "percentile" => Self::Percentile,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            other => return Err(EngineError::unknown_function(other)),
        })
    }

    /// The statically known output kind for this call, given the input
    /// stream's kind (§4.2's table; `count` is always integer, `mean`/
    /// `median`/`percentile` output a float over numeric input).
    ///
    /// # Errors
    /// Returns `EngineError::type_mismatch` for a kind/function combination
    /// the table forbids (e.g. `mean` over a string stream).
    pub fn output_kind(self, input_kind: Kind) -> Result<Kind, EngineError> {
        use Kind::{Boolean, Float, Integer, String};

        match self {
            Self::Count => Ok(Integer),
            Self::Mean | Self::Median => match input_kind {
                Float | Integer => Ok(Float),
                String | Boolean => Err(EngineError::type_mismatch(format!(
                    "{self:?} is not supported over {input_kind} fields"
                ))),
            },
            Self::Stddev => Ok(input_kind),
            Self::Percentile => match input_kind {
                Float | Integer => Ok(input_kind),
                String | Boolean => Err(EngineError::type_mismatch(format!(
                    "percentile is not supported over {input_kind} fields"
                ))),
            },
            Self::Sum | Self::Spread => match input_kind {
                Float | Integer => Ok(input_kind),
                String | Boolean => Err(EngineError::type_mismatch(format!(
                    "{self:?} is not supported over {input_kind} fields"
                ))),
            },
            Self::Min | Self::Max | Self::First | Self::Last | Self::Distinct | Self::Top | Self::Bottom => {
                Ok(input_kind)
            }
        }
    }
}

/// Construct the per-window aggregator for `func` over `input_kind`. `limit`
/// is the selector `N` for `top`/`bottom`; `tag` is the optional partitioning
/// tag key for the tagged `top`/`bottom` form (§4.3); both are ignored by
/// every other function.
pub(crate) fn make_aggregator(
    func: AggregateFn,
    input_kind: Kind,
    limit: Option<u32>,
    tag: Option<&str>,
) -> Box<dyn Aggregator> {
    match func {
        AggregateFn::Count => Box::new(numeric::CountAgg::default()),
        AggregateFn::Sum => Box::new(numeric::SumAgg::new(input_kind)),
        AggregateFn::Min => Box::new(numeric::ExtremaAgg::new(input_kind, numeric::Extreme::Min)),
        AggregateFn::Max => Box::new(numeric::ExtremaAgg::new(input_kind, numeric::Extreme::Max)),
        AggregateFn::First => Box::new(numeric::FirstLastAgg::new(input_kind, numeric::Edge::First)),
        AggregateFn::Last => Box::new(numeric::FirstLastAgg::new(input_kind, numeric::Edge::Last)),
        AggregateFn::Mean => Box::new(numeric::MeanAgg::default()),
        AggregateFn::Median => Box::new(numeric::MedianAgg::default()),
        AggregateFn::Stddev => Box::new(numeric::StddevAgg::new(input_kind)),
        AggregateFn::Spread => Box::new(numeric::SpreadAgg::new(input_kind)),
        AggregateFn::Distinct => Box::new(distinct::DistinctAgg::default()),
        AggregateFn::Percentile => Box::new(percentile::PercentileAgg::new(input_kind, 50.0)),
        AggregateFn::Top => Box::new(topbottom::TopBottomAgg::new(
            input_kind,
            topbottom::TopBottomMode::Top,
            limit.unwrap_or(1).max(1) as usize,
            tag.map(ToString::to_string),
        )),
        AggregateFn::Bottom => Box::new(topbottom::TopBottomAgg::new(
            input_kind,
            topbottom::TopBottomMode::Bottom,
            limit.unwrap_or(1).max(1) as usize,
            tag.map(ToString::to_string),
        )),
    }
}

/// Same as [`make_aggregator`] but for `percentile(p)`, where `p` is a
/// compile-time constant extracted from the call's second argument.
pub(crate) fn make_percentile_aggregator(input_kind: Kind, p: f64) -> Box<dyn Aggregator> {
    Box::new(percentile::PercentileAgg::new(input_kind, p))
}
