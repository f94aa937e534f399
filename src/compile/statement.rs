//! The already-parsed, already-typed statement shape the compiler consumes.
//! Parsing a query string into this shape is out of scope (§1) — a host
//! builds one of these directly, the way a hand-written test fixture would.

use crate::{
    aggregate::AggregateFn,
    binary_expr::{BinaryOp, Operand},
    point::Kind,
    request::{FillPolicy, RequestDescriptor},
};

/// The field expression a `SELECT` projects: either a bare field read, or a
/// call naming the aggregate/selector function, the field it reads, and
/// that function's optional arguments (`top`/`bottom`'s `N` and partition
/// tag, `percentile`'s `p`).
#[derive(Clone, Debug)]
pub enum FieldCall {
    Plain(String),
    Aggregate {
        func: AggregateFn,
        field: String,
        limit: Option<u32>,
        percentile: Option<f64>,
        /// Partition tag for the tagged `top`/`bottom` form (§4.3); `None`
        /// selects the plain, untagged form.
        tag: Option<String>,
    },
}

impl FieldCall {
    fn field_name(&self) -> &str {
        match self {
            Self::Plain(name) | Self::Aggregate { field: name, .. } => name,
        }
    }

    const fn limit(&self) -> Option<u32> {
        match self {
            Self::Plain(_) => None,
            Self::Aggregate { limit, .. } => *limit,
        }
    }
}

/// A binary expression applied after fill, combining two operands drawn
/// from a point's primary value and/or its `aux` slots (§4.8).
#[derive(Clone, Debug)]
pub struct BinaryExprSpec {
    pub op: BinaryOp,
    pub lhs: Operand,
    pub rhs: Operand,
    pub output_kind: Kind,
}

/// The scaling unit a `derivative()` tail stage (§4.7) applies. `Explicit`
/// carries a caller-supplied duration in nanoseconds (`derivative(value,
/// 1s)`); `Default` defers to the compiler's configured
/// `derivative_default_unit_nanos` (§4.7's "default: 1 second").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DerivativeUnit {
    Explicit(i64),
    Default,
}

///
/// SelectStatement
///
/// Fields mirror `spec.md` §3's request descriptor plus the transform stages
/// §4.7/§4.8 layer on top of it.
///

#[derive(Clone, Debug)]
pub struct SelectStatement {
    pub measurement: String,
    pub field: FieldCall,
    pub aux_fields: Vec<String>,
    pub time_lo: i64,
    pub time_hi: i64,
    pub interval: i64,
    pub offset: i64,
    pub dimensions: Vec<String>,
    pub fill: FillPolicy,
    pub binary: Option<BinaryExprSpec>,
    pub derivative: Option<DerivativeUnit>,
    pub ascending: bool,
}

impl SelectStatement {
    #[must_use]
    pub fn new(measurement: impl Into<String>, field: FieldCall) -> Self {
        Self {
            measurement: measurement.into(),
            field,
            aux_fields: Vec::new(),
            time_lo: i64::MIN,
            time_hi: i64::MAX,
            interval: 0,
            offset: 0,
            dimensions: Vec::new(),
            fill: FillPolicy::default(),
            binary: None,
            derivative: None,
            ascending: true,
        }
    }

    #[must_use]
    pub const fn is_windowed(&self) -> bool {
        self.interval > 0
    }

    #[must_use]
    pub fn to_request(&self) -> RequestDescriptor {
        let mut request = RequestDescriptor::new(self.measurement.clone(), self.field.field_name());
        request.aux_fields.clone_from(&self.aux_fields);
        request.time_lo = self.time_lo;
        request.time_hi = self.time_hi;
        request.interval = self.interval;
        request.offset = self.offset;
        request.dimensions.clone_from(&self.dimensions);
        request.fill = self.fill.clone();
        request.ascending = self.ascending;
        request.limit = self.field.limit();
        request
    }
}
