//! `percentile(N)` selector (§4.2): the lower-rank method over float or
//! integer input, confirmed against `TestSelect_Percentile_Integer` — unlike
//! `mean`/`median`, `percentile` does not promote integer input to float.

use super::{Aggregator, SelectionItem};
use crate::point::{Kind, Point, Tags, Value};

pub(super) struct PercentileAgg {
    kind: Kind,
    p: f64,
    values: Vec<(f64, Value)>,
}

impl PercentileAgg {
    pub(super) const fn new(kind: Kind, p: f64) -> Self {
        Self {
            kind,
            p,
            values: Vec::new(),
        }
    }
}

impl Aggregator for PercentileAgg {
    fn push(&mut self, point: &Point) {
        if point.nil {
            return;
        }
        if let Some(v) = point.value.as_f64() {
            self.values.push((v, point.value.clone()));
        }
    }

    fn finish(mut self: Box<Self>, name: &str, tags: &Tags, window_start: i64) -> Vec<SelectionItem> {
        if self.values.is_empty() {
            return vec![SelectionItem::plain(Point::nil_at(name, tags.clone(), window_start, self.kind))];
        }

        self.values.sort_by(|a, b| a.0.total_cmp(&b.0));
        let n = self.values.len();
        // Nearest-rank method: rank = ceil(p/100 * n), 1-indexed, clamped to [1, n].
        let rank = ((self.p / 100.0) * n as f64).ceil() as i64;
        let index = rank.clamp(1, n as i64) as usize - 1;
        let value = self.values[index].1.clone();

        vec![SelectionItem::plain(Point::new(name, tags.clone(), window_start, value))]
    }
}
