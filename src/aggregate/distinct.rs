//! `distinct` selector (§4.2): each distinct value emitted once, at its
//! first-occurrence time, in first-occurrence order.

use super::{Aggregator, SelectionItem};
use crate::point::{Point, Tags, Value};

#[derive(Default)]
pub(super) struct DistinctAgg {
    seen: Vec<Value>,
    points: Vec<Point>,
}

impl Aggregator for DistinctAgg {
    fn push(&mut self, point: &Point) {
        if point.nil {
            return;
        }
        if self.seen.iter().any(|v| v == &point.value) {
            return;
        }
        self.seen.push(point.value.clone());
        self.points.push(point.clone());
    }

    fn finish(self: Box<Self>, name: &str, tags: &Tags, _window_start: i64) -> Vec<SelectionItem> {
        self.points
            .into_iter()
            .map(|mut p| {
                p.name = name.to_string();
                p.tags = tags.clone();
                SelectionItem::plain(p)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Kind;

    #[test]
    fn emits_each_distinct_value_once_in_first_occurrence_order() {
        let tags = Tags::new();
        let mut agg = DistinctAgg::default();
        agg.push(&Point::new("cpu", tags.clone(), 0, Value::Integer(4)));
        agg.push(&Point::new("cpu", tags.clone(), 5, Value::Integer(2)));
        agg.push(&Point::new("cpu", tags.clone(), 10, Value::Integer(4)));

        let out = Box::new(agg).finish("cpu", &tags, 0);
        let values: Vec<_> = out.iter().map(|i| i.point.value.clone()).collect();
        assert_eq!(values, vec![Value::Integer(4), Value::Integer(2)]);
        assert_eq!(out[0].point.kind(), Kind::Integer);
    }
}
