//! Binary expression evaluation over aligned auxiliary fields (§4.8): the
//! one point-at-a-time transform that combines a point's primary value with
//! one of its co-read `aux` fields (or two aux fields against each other)
//! under `+`, `-`, `*`, `/`.

use crate::{
    error::EngineError,
    point::{Kind, Point, Tags, Value},
    stream::{BoxStream, PointStream, TerminalErrorGuard},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Which slot of a point an operand reads from. A bare literal (`2 - value`)
/// is represented as `Constant` rather than a second factory-backed stream:
/// it behaves exactly like the spec's "constant-valued aligned companion"
/// (same value at every point) without the bookkeeping of a literal stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Primary,
    Aux(usize),
    Constant(Value),
}

fn operand_value(point: &Point, operand: &Operand) -> Option<Value> {
    match operand {
        Operand::Primary => Some(point.value.clone()),
        Operand::Aux(index) => point.aux.get(*index).cloned(),
        Operand::Constant(value) => Some(value.clone()),
    }
}

///
/// BinaryExprStream
///
/// Null propagates: a `nil` input point, a missing aux slot, or (for `/`) a
/// zero divisor all produce a `nil` output point rather than an error —
/// this transform never fails at runtime once constructed. Integer output
/// truncates toward zero, matching the point model's integer semantics.
///

pub struct BinaryExprStream {
    inner: BoxStream,
    op: BinaryOp,
    lhs: Operand,
    rhs: Operand,
    output_kind: Kind,
    guard: TerminalErrorGuard,
}

impl BinaryExprStream {
    #[must_use]
    pub fn new(inner: BoxStream, op: BinaryOp, lhs: Operand, rhs: Operand, output_kind: Kind) -> Self {
        Self {
            inner,
            op,
            lhs,
            rhs,
            output_kind,
            guard: TerminalErrorGuard::new(),
        }
    }

    fn nil_at(&self, point: &Point) -> Point {
        Point::nil_at(point.name.clone(), point.tags.clone(), point.time, self.output_kind)
    }
}

impl PointStream for BinaryExprStream {
    fn kind(&self) -> Kind {
        self.output_kind
    }

    fn next(&mut self) -> Result<Option<Point>, EngineError> {
        let pulled = self.inner.next();
        let Some(point) = self.guard.guard(pulled)? else {
            return Ok(None);
        };

        if point.nil {
            return Ok(Some(self.nil_at(&point)));
        }

        let lhs = operand_value(&point, &self.lhs).and_then(|v| v.as_f64());
        let rhs = operand_value(&point, &self.rhs).and_then(|v| v.as_f64());
        let (Some(l), Some(r)) = (lhs, rhs) else {
            return Ok(Some(self.nil_at(&point)));
        };

        if self.op == BinaryOp::Div && r == 0.0 {
            return Ok(Some(self.nil_at(&point)));
        }

        let result = match self.op {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => l / r,
        };

        let value = match self.output_kind {
            Kind::Integer => Value::Integer(result.trunc() as i64),
            Kind::Float | Kind::String | Kind::Boolean => Value::Float(result),
        };

        Ok(Some(Point::new(point.name, point.tags, point.time, value)))
    }

    fn close(&mut self) {
        self.inner.close();
    }
}
