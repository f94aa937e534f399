//! Numeric and type-preserving aggregators: `count`, `sum`, `min`/`max`,
//! `first`/`last`, `mean`, `median`, `stddev`, `spread` (§4.2).

use super::{Aggregator, SelectionItem};
use crate::point::{Kind, Point, Tags, Value};

fn output_point(name: &str, tags: &Tags, time: i64, value: Value) -> SelectionItem {
    SelectionItem::plain(Point::new(name, tags.clone(), time, value))
}

fn nil_point(name: &str, tags: &Tags, time: i64, kind: Kind) -> SelectionItem {
    SelectionItem::plain(Point::nil_at(name, tags.clone(), time, kind))
}

///
/// CountAgg
/// Counts non-null input points. Empty window ⇒ `0`, never null.
///

#[derive(Default)]
pub(super) struct CountAgg {
    count: u32,
}

impl Aggregator for CountAgg {
    fn push(&mut self, point: &Point) {
        if !point.nil {
            self.count = self.count.wrapping_add(1);
        }
    }

    fn finish(self: Box<Self>, name: &str, tags: &Tags, window_start: i64) -> Vec<SelectionItem> {
        vec![output_point(name, tags, window_start, Value::Integer(i64::from(self.count)))]
    }
}

///
/// SumAgg
/// Wrapping accumulation, preserving the input kind (§9: wrapping chosen
/// over saturating for `sum`/`spread`; faithful to the reference system).
///

pub(super) struct SumAgg {
    kind: Kind,
    float_acc: f64,
    int_acc: i64,
    seen: bool,
}

impl SumAgg {
    pub(super) const fn new(kind: Kind) -> Self {
        Self {
            kind,
            float_acc: 0.0,
            int_acc: 0,
            seen: false,
        }
    }
}

impl Aggregator for SumAgg {
    fn push(&mut self, point: &Point) {
        if point.nil {
            return;
        }
        self.seen = true;
        match &point.value {
            Value::Float(v) => self.float_acc += v,
            Value::Integer(v) => self.int_acc = self.int_acc.wrapping_add(*v),
            Value::String(_) | Value::Boolean(_) => {}
        }
    }

    fn finish(self: Box<Self>, name: &str, tags: &Tags, window_start: i64) -> Vec<SelectionItem> {
        if !self.seen {
            return vec![nil_point(name, tags, window_start, self.kind)];
        }
        let value = match self.kind {
            Kind::Float => Value::Float(self.float_acc),
            Kind::Integer => Value::Integer(self.int_acc),
            Kind::String | Kind::Boolean => Value::zero(self.kind),
        };
        vec![output_point(name, tags, window_start, value)]
    }
}

#[derive(Clone, Copy)]
pub(super) enum Extreme {
    Min,
    Max,
}

///
/// ExtremaAgg
/// `min`/`max`. Keeps the first-seen extremum on ties: since input arrives
/// time-ascending within a series, only a *strict* improvement replaces the
/// current candidate.
///

pub(super) struct ExtremaAgg {
    kind: Kind,
    which: Extreme,
    best: Option<Point>,
}

impl ExtremaAgg {
    pub(super) const fn new(kind: Kind, which: Extreme) -> Self {
        Self {
            kind,
            which,
            best: None,
        }
    }
}

impl Aggregator for ExtremaAgg {
    fn push(&mut self, point: &Point) {
        if point.nil {
            return;
        }
        let better = match &self.best {
            None => true,
            Some(current) => {
                let cmp = point.value.cmp_same_kind(&current.value);
                match self.which {
                    Extreme::Min => cmp.is_lt(),
                    Extreme::Max => cmp.is_gt(),
                }
            }
        };
        if better {
            self.best = Some(point.clone());
        }
    }

    fn finish(self: Box<Self>, name: &str, tags: &Tags, window_start: i64) -> Vec<SelectionItem> {
        match self.best {
            Some(point) => vec![output_point(name, tags, window_start, point.value)],
            None => vec![nil_point(name, tags, window_start, self.kind)],
        }
    }
}

#[derive(Clone, Copy)]
pub(super) enum Edge {
    First,
    Last,
}

///
/// FirstLastAgg
/// `first`/`last`, by time then arrival — both already guaranteed by input
/// order, so this simply remembers the first (or every, for last) non-null
/// push.
///

pub(super) struct FirstLastAgg {
    kind: Kind,
    edge: Edge,
    value: Option<Point>,
}

impl FirstLastAgg {
    pub(super) const fn new(kind: Kind, edge: Edge) -> Self {
        Self { kind, edge, value: None }
    }
}

impl Aggregator for FirstLastAgg {
    fn push(&mut self, point: &Point) {
        if point.nil {
            return;
        }
        match self.edge {
            Edge::First => {
                if self.value.is_none() {
                    self.value = Some(point.clone());
                }
            }
            Edge::Last => self.value = Some(point.clone()),
        }
    }

    fn finish(self: Box<Self>, name: &str, tags: &Tags, window_start: i64) -> Vec<SelectionItem> {
        match self.value {
            Some(point) => vec![output_point(name, tags, window_start, point.value)],
            None => vec![nil_point(name, tags, window_start, self.kind)],
        }
    }
}

///
/// MeanAgg
/// Numerically stable running mean: `mean += (x - mean) / count`.
///

#[derive(Default)]
pub(super) struct MeanAgg {
    mean: f64,
    count: u64,
}

impl Aggregator for MeanAgg {
    fn push(&mut self, point: &Point) {
        if point.nil {
            return;
        }
        if let Some(v) = point.value.as_f64() {
            self.count += 1;
            self.mean += (v - self.mean) / self.count as f64;
        }
    }

    fn finish(self: Box<Self>, name: &str, tags: &Tags, window_start: i64) -> Vec<SelectionItem> {
        if self.count == 0 {
            return vec![nil_point(name, tags, window_start, Kind::Float)];
        }
        vec![output_point(name, tags, window_start, Value::Float(self.mean))]
    }
}

///
/// MedianAgg
/// Materializes the window (spec accepts O(window) here); average of the
/// middle two for even `n`.
///

#[derive(Default)]
pub(super) struct MedianAgg {
    values: Vec<f64>,
}

impl Aggregator for MedianAgg {
    fn push(&mut self, point: &Point) {
        if point.nil {
            return;
        }
        if let Some(v) = point.value.as_f64() {
            self.values.push(v);
        }
    }

    fn finish(mut self: Box<Self>, name: &str, tags: &Tags, window_start: i64) -> Vec<SelectionItem> {
        if self.values.is_empty() {
            return vec![nil_point(name, tags, window_start, Kind::Float)];
        }
        self.values.sort_by(f64::total_cmp);
        let n = self.values.len();
        let median = if n % 2 == 1 {
            self.values[n / 2]
        } else {
            (self.values[n / 2 - 1] + self.values[n / 2]) / 2.0
        };
        vec![output_point(name, tags, window_start, Value::Float(median))]
    }
}

///
/// StddevAgg
/// Sample standard deviation for numeric input; a type-preserving no-op
/// (empty string, never an error) for string input — confirmed against the
/// original system's `TestSelect_Stddev_String` fixture.
///

pub(super) struct StddevAgg {
    kind: Kind,
    values: Vec<f64>,
}

impl StddevAgg {
    pub(super) const fn new(kind: Kind) -> Self {
        Self {
            kind,
            values: Vec::new(),
        }
    }
}

impl Aggregator for StddevAgg {
    fn push(&mut self, point: &Point) {
        if point.nil || self.kind == Kind::String || self.kind == Kind::Boolean {
            return;
        }
        if let Some(v) = point.value.as_f64() {
            self.values.push(v);
        }
    }

    fn finish(self: Box<Self>, name: &str, tags: &Tags, window_start: i64) -> Vec<SelectionItem> {
        if self.kind == Kind::String || self.kind == Kind::Boolean {
            return vec![output_point(name, tags, window_start, Value::String(String::new()))];
        }
        if self.values.len() < 2 {
            return vec![nil_point(name, tags, window_start, Kind::Float)];
        }
        let n = self.values.len() as f64;
        let mean = self.values.iter().sum::<f64>() / n;
        let variance = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        vec![output_point(name, tags, window_start, Value::Float(variance.sqrt()))]
    }
}

///
/// SpreadAgg
/// `max(W) - min(W)`, same kind as input. A single-point window spreads to
/// the kind's zero (max == min), never null.
///

pub(super) struct SpreadAgg {
    kind: Kind,
    min: Option<f64>,
    max: Option<f64>,
    int_min: Option<i64>,
    int_max: Option<i64>,
}

impl SpreadAgg {
    pub(super) const fn new(kind: Kind) -> Self {
        Self {
            kind,
            min: None,
            max: None,
            int_min: None,
            int_max: None,
        }
    }
}

impl Aggregator for SpreadAgg {
    fn push(&mut self, point: &Point) {
        if point.nil {
            return;
        }
        match &point.value {
            Value::Float(v) => {
                self.min = Some(self.min.map_or(*v, |m| m.min(*v)));
                self.max = Some(self.max.map_or(*v, |m| m.max(*v)));
            }
            Value::Integer(v) => {
                self.int_min = Some(self.int_min.map_or(*v, |m| m.min(*v)));
                self.int_max = Some(self.int_max.map_or(*v, |m| m.max(*v)));
            }
            Value::String(_) | Value::Boolean(_) => {}
        }
    }

    fn finish(self: Box<Self>, name: &str, tags: &Tags, window_start: i64) -> Vec<SelectionItem> {
        let value = match self.kind {
            Kind::Float => self.max.zip(self.min).map(|(max, min)| Value::Float(max - min)),
            Kind::Integer => self
                .int_max
                .zip(self.int_min)
                .map(|(max, min)| Value::Integer(max.wrapping_sub(min))),
            Kind::String | Kind::Boolean => None,
        };
        match value {
            Some(value) => vec![output_point(name, tags, window_start, value)],
            None => vec![nil_point(name, tags, window_start, self.kind)],
        }
    }
}
