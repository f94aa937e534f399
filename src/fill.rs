//! Per-series fill combinator (§4.4): synthesizes a point for every window
//! start a series never touched, according to the request's [`FillPolicy`].
//!
//! Operates downstream of the call iterator, one series (one `tags` value)
//! at a time — like `demux`, this requires full materialization of each
//! series' windowed output, since `previous`/`linear` need to look both
//! backward and forward across gaps.

use crate::{
    error::EngineError,
    point::{Kind, Point, Tags, Value},
    request::FillPolicy,
    stream::{BoxStream, PointStream, VecPointStream},
    window::window_starts,
};
use std::collections::BTreeMap;

/// Fill every gap in `inner`'s windowed output across `[lo, hi)` per
/// `policy`. `inner` must already be ordered by `(tags, window_start)`, one
/// point per `(series, window)` pair that produced output (the call iterator
/// guarantees this).
///
/// # Errors
/// Propagates any error raised while draining `inner`.
pub fn fill(
    policy: &FillPolicy,
    lo: i64,
    hi: i64,
    offset: i64,
    interval: i64,
    mut inner: BoxStream,
) -> Result<BoxStream, EngineError> {
    let kind = inner.kind();

    if matches!(policy, FillPolicy::None) || interval <= 0 {
        return Ok(inner);
    }

    let mut by_series: BTreeMap<Tags, BTreeMap<i64, Point>> = BTreeMap::new();
    let mut name = String::new();
    while let Some(point) = inner.next()? {
        if name.is_empty() {
            name.clone_from(&point.name);
        }
        by_series.entry(point.tags.clone()).or_default().insert(point.time, point);
    }
    inner.close();

    let starts = window_starts(lo, hi, offset, interval);
    log::trace!("fill: {} window starts across {} series", starts.len(), by_series.len());
    let mut out = Vec::new();

    for (tags, points) in by_series {
        out.extend(fill_series(policy, kind, &name, &tags, &starts, points));
    }

    Ok(Box::new(VecPointStream::new(kind, out)))
}

fn fill_series(
    policy: &FillPolicy,
    kind: Kind,
    name: &str,
    tags: &Tags,
    starts: &[i64],
    mut points: BTreeMap<i64, Point>,
) -> Vec<Point> {
    match policy {
        FillPolicy::None => starts.iter().filter_map(|t| points.remove(t)).collect(),
        FillPolicy::Null => starts
            .iter()
            .map(|&t| points.remove(&t).unwrap_or_else(|| Point::nil_at(name, tags.clone(), t, kind)))
            .collect(),
        FillPolicy::Number(value) => starts
            .iter()
            .map(|&t| {
                points
                    .remove(&t)
                    .unwrap_or_else(|| Point::new(name, tags.clone(), t, coerce(value, kind)))
            })
            .collect(),
        FillPolicy::Previous => {
            let mut last: Option<Value> = None;
            starts
                .iter()
                .map(|&t| {
                    if let Some(point) = points.remove(&t) {
                        last = Some(point.value.clone());
                        point
                    } else {
                        match &last {
                            Some(value) => Point::new(name, tags.clone(), t, value.clone()),
                            None => Point::nil_at(name, tags.clone(), t, kind),
                        }
                    }
                })
                .collect()
        }
        FillPolicy::Linear => fill_linear(kind, name, tags, starts, points),
    }
}

/// Coerce a literal fill value onto the stream's kind: int→float promotes,
/// float→int truncates, matching the point model's coercion rule (§4.4,
/// supplemented in `SPEC_FULL.md` by the original system's "any numeric
/// literal, coerced at the point level" behavior).
fn coerce(value: &Value, kind: Kind) -> Value {
    match (kind, value) {
        (Kind::Float, Value::Integer(v)) => Value::Float(*v as f64),
        (Kind::Integer, Value::Float(v)) => Value::Integer(*v as i64),
        _ => value.clone(),
    }
}

fn fill_linear(kind: Kind, name: &str, tags: &Tags, starts: &[i64], points: BTreeMap<i64, Point>) -> Vec<Point> {
    let known: Vec<(i64, f64)> = starts
        .iter()
        .filter_map(|&t| points.get(&t).and_then(|p| p.value.as_f64()).map(|v| (t, v)))
        .collect();

    starts
        .iter()
        .map(|&t| {
            if let Some(point) = points.get(&t) {
                return point.clone();
            }

            // Fewer than two real points in range: never extrapolate, always nil.
            if known.len() < 2 {
                return Point::nil_at(name, tags.clone(), t, kind);
            }

            let before = known.iter().rev().find(|(kt, _)| *kt < t);
            let after = known.iter().find(|(kt, _)| *kt > t);

            match (before, after) {
                (Some((t0, v0)), Some((t1, v1))) => {
                    let frac = (t - t0) as f64 / (t1 - t0) as f64;
                    let v = v0 + (v1 - v0) * frac;
                    Point::new(name, tags.clone(), t, numeric_value(kind, v))
                }
                _ => Point::nil_at(name, tags.clone(), t, kind),
            }
        })
        .collect()
}

fn numeric_value(kind: Kind, v: f64) -> Value {
    match kind {
        Kind::Integer => Value::Integer(v as i64),
        Kind::Float | Kind::String | Kind::Boolean => Value::Float(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(t: i64, v: f64) -> Point {
        Point::new("cpu", Tags::new(), t, Value::Float(v))
    }

    #[test]
    fn null_fill_synthesizes_nil_points_for_untouched_windows() {
        let input: BoxStream = Box::new(VecPointStream::new(Kind::Float, vec![p(0, 1.0), p(20, 3.0)]));
        let mut out = fill(&FillPolicy::Null, 0, 30, 0, 10, input).unwrap();

        let mut got = Vec::new();
        while let Some(pt) = out.next().unwrap() {
            got.push((pt.time, pt.nil));
        }
        assert_eq!(got, vec![(0, false), (10, true), (20, false)]);
    }

    #[test]
    fn previous_fill_carries_last_seen_value() {
        let input: BoxStream = Box::new(VecPointStream::new(Kind::Float, vec![p(0, 1.0), p(20, 3.0)]));
        let mut out = fill(&FillPolicy::Previous, 0, 30, 0, 10, input).unwrap();

        let mut values = Vec::new();
        while let Some(pt) = out.next().unwrap() {
            values.push(pt.value.as_f64().unwrap());
        }
        assert_eq!(values, vec![1.0, 1.0, 3.0]);
    }

    #[test]
    fn linear_fill_interpolates_between_brackets() {
        let input: BoxStream = Box::new(VecPointStream::new(Kind::Float, vec![p(0, 0.0), p(20, 20.0)]));
        let mut out = fill(&FillPolicy::Linear, 0, 30, 0, 10, input).unwrap();

        let mut values = Vec::new();
        while let Some(pt) = out.next().unwrap() {
            values.push(pt.value.as_f64().unwrap());
        }
        assert_eq!(values, vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn linear_fill_with_fewer_than_two_points_is_nil() {
        let input: BoxStream = Box::new(VecPointStream::new(Kind::Float, vec![p(0, 5.0)]));
        let mut out = fill(&FillPolicy::Linear, 0, 30, 0, 10, input).unwrap();

        let mut nils = Vec::new();
        while let Some(pt) = out.next().unwrap() {
            nils.push(pt.nil);
        }
        assert_eq!(nils, vec![false, true, true]);
    }
}
