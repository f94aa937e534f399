//! Demultiplexing by tag dimensions (§4.5): project each point's tags onto
//! the `GROUP BY` tag keys and merge series that collapse onto the same
//! reduced tag set, preserving overall `(reducedTags, time)` order.
//!
//! Implementation note: the input's own ordering invariant (§3 — all points
//! of one full tag set form a contiguous run) means the set of distinct full
//! tag sets feeding one reduced key is discovered only by having read them.
//! This combinator buffers each distinct *original* series as it is
//! encountered (bounded by the number of live original series, matching the
//! "small hash table keyed on canonical tag-set byte string" frontier in
//! `spec.md` §9), then merges the runs landing on the same reduced key
//! through [`crate::merge::MergeStream`] rather than re-deriving a second
//! merge algorithm.

use crate::{
    error::EngineError,
    merge::MergeStream,
    point::{Kind, Point, Tags},
    stream::{BoxStream, PointStream, VecPointStream},
};
use std::collections::BTreeMap;

/// Reduce `inner`'s tag sets onto `dimensions`, merging collapsed series.
///
/// # Errors
/// Propagates any error raised while draining `inner`.
pub fn demux(dimensions: &[String], mut inner: BoxStream) -> Result<BoxStream, EngineError> {
    let kind = inner.kind();

    // Bucket by *original* full tag set; each bucket is already time-ordered
    // because the upstream invariant guarantees non-decreasing time within
    // one series.
    let mut original: BTreeMap<Tags, Vec<Point>> = BTreeMap::new();
    while let Some(point) = inner.next()? {
        original.entry(point.tags.clone()).or_default().push(point);
    }
    inner.close();

    // Group the original runs by reduced tag set, reassigning each point's
    // tags to the reduced set as we go.
    let mut reduced: BTreeMap<Tags, Vec<Vec<Point>>> = BTreeMap::new();
    for (original_tags, points) in original {
        let reduced_tags = original_tags.project(dimensions);
        let points: Vec<Point> = points
            .into_iter()
            .map(|mut p| {
                p.tags = reduced_tags.clone();
                p
            })
            .collect();
        reduced.entry(reduced_tags).or_default().push(points);
    }

    let mut out = Vec::new();
    for (reduced_tags, runs) in reduced {
        if runs.len() == 1 {
            out.extend(runs.into_iter().next().unwrap_or_default());
        } else {
            log::debug!("demux: merging {} collapsed series onto {reduced_tags}", runs.len());
            out.extend(merge_runs(kind, runs)?);
        }
    }

    Ok(Box::new(VecPointStream::new(kind, out)))
}

fn merge_runs(kind: Kind, runs: Vec<Vec<Point>>) -> Result<Vec<Point>, EngineError> {
    let streams: Vec<BoxStream> = runs
        .into_iter()
        .map(|run| -> BoxStream { Box::new(VecPointStream::new(kind, run)) })
        .collect();

    let mut merged = MergeStream::new(streams)?;
    let mut out = Vec::new();
    while let Some(point) = merged.next()? {
        out.push(point);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Value;

    fn p(tags: &[(&str, &str)], t: i64, v: f64) -> Point {
        Point::new("cpu", Tags::from_pairs(tags.iter().copied()), t, Value::Float(v))
    }

    #[test]
    fn collapses_non_dimension_tags_and_merges_by_time() {
        // region=west,host=A and region=east,host=A both reduce to host=A
        // and are NOT contiguous in full-tag-set order, mirroring the S1
        // fixture from spec.md §8.
        let input: BoxStream = Box::new(VecPointStream::new(
            Kind::Float,
            vec![
                p(&[("host", "A"), ("region", "west")], 0, 20.0),
                p(&[("host", "B"), ("region", "west")], 5, 10.0),
                p(&[("host", "A"), ("region", "east")], 9, 19.0),
                p(&[("host", "A"), ("region", "east")], 10, 2.0),
                p(&[("host", "A"), ("region", "west")], 11, 3.0),
                p(&[("host", "A"), ("region", "west")], 31, 100.0),
            ],
        ));

        let mut out = demux(&["host".to_string()], input).unwrap();
        let mut got = Vec::new();
        while let Some(pt) = out.next().unwrap() {
            got.push((pt.tags.get("host").unwrap().to_string(), pt.time, pt.value.as_f64().unwrap()));
        }

        assert_eq!(
            got,
            vec![
                ("A".to_string(), 0, 20.0),
                ("A".to_string(), 9, 19.0),
                ("A".to_string(), 10, 2.0),
                ("A".to_string(), 11, 3.0),
                ("A".to_string(), 31, 100.0),
                ("B".to_string(), 5, 10.0),
            ]
        );
    }

    #[test]
    fn empty_dimensions_collapse_to_single_global_series() {
        let input: BoxStream = Box::new(VecPointStream::new(
            Kind::Float,
            vec![
                p(&[("host", "A")], 0, 1.0),
                p(&[("host", "B")], 1, 2.0),
            ],
        ));

        let mut out = demux(&[], input).unwrap();
        let mut count = 0;
        while let Some(pt) = out.next().unwrap() {
            assert!(pt.tags.is_empty());
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
