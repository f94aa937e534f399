//! The request descriptor handed to a [`crate::factory::StreamFactory`],
//! and the fill policy it carries.

use crate::point::Value;

///
/// FillPolicy
///
/// Per-field policy for synthesizing output points in empty windows.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FillPolicy {
    /// Emit nothing for an empty window.
    None,
    /// Emit one `nil=true` point at the window start.
    Null,
    /// Emit a fixed literal value.
    Number(Value),
    /// Emit the last non-null output value seen in the same series so far;
    /// `nil=true` if there is none yet.
    Previous,
    /// Linearly interpolate between the nearest surrounding non-null output
    /// points in the same series; `nil=true` when there is no bracket.
    Linear,
}

impl Default for FillPolicy {
    fn default() -> Self {
        Self::Null
    }
}

///
/// RequestDescriptor
///
/// Immutable description of one raw read the compiler asks the stream
/// factory to satisfy.
///

#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub measurement: String,
    /// The primary field or aggregate-call name driving this read. The
    /// factory may pre-aggregate (pushdown) when it recognizes the call;
    /// otherwise it returns raw points and the engine's own call iterator
    /// performs the aggregation.
    pub expr: String,
    /// Auxiliary field names, positional, aligned with each point's `aux`
    /// vector.
    pub aux_fields: Vec<String>,
    /// Half-open time range `[lo, hi)`, nanoseconds since epoch.
    pub time_lo: i64,
    pub time_hi: i64,
    /// Window duration in nanoseconds; `0` means no windowing.
    pub interval: i64,
    /// Start-of-window phase offset, nanoseconds.
    pub offset: i64,
    /// Tag keys retained in output (`GROUP BY` tag dimensions).
    pub dimensions: Vec<String>,
    pub fill: FillPolicy,
    pub ascending: bool,
    /// Selector limit `N`, for `top`/`bottom`.
    pub limit: Option<u32>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(measurement: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            expr: expr.into(),
            aux_fields: Vec::new(),
            time_lo: i64::MIN,
            time_hi: i64::MAX,
            interval: 0,
            offset: 0,
            dimensions: Vec::new(),
            fill: FillPolicy::default(),
            ascending: true,
            limit: None,
        }
    }

    #[must_use]
    pub const fn is_windowed(&self) -> bool {
        self.interval > 0
    }
}
