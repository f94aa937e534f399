//! End-to-end scenarios exercising `Select::compile` against a canned
//! factory, one per named fixture recovered from the original system's
//! `select_test.go` suite (S1-S6).

use tsdb_query_exec::{
    aggregate::AggregateFn,
    binary_expr::{BinaryOp, Operand},
    compile::{BinaryExprSpec, DerivativeUnit, FieldCall, SelectStatement},
    error::EngineError,
    point::{Kind, Point, Tags, Value},
    request::{FillPolicy, RequestDescriptor},
    stream::{BoxStream, PointStream, VecPointStream},
    CompiledSelect, CompileOptions, Select, StreamFactory,
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

fn drain(mut stream: BoxStream) -> Vec<Point> {
    let mut out = Vec::new();
    while let Some(point) = stream.next().unwrap() {
        out.push(point);
    }
    out
}

#[test]
fn s1_min_with_windowing_and_tag_grouping() {
    let factory = CannedFactory {
        kind: Kind::Float,
        points: vec![
            Point::new("cpu", Tags::from_pairs([("host", "A")]), 0, Value::Float(20.0)),
            Point::new("cpu", Tags::from_pairs([("host", "B")]), 5, Value::Float(10.0)),
            Point::new("cpu", Tags::from_pairs([("host", "A")]), 9, Value::Float(19.0)),
            Point::new("cpu", Tags::from_pairs([("host", "A")]), 10, Value::Float(2.0)),
            Point::new("cpu", Tags::from_pairs([("host", "A")]), 11, Value::Float(3.0)),
            Point::new("cpu", Tags::from_pairs([("host", "A")]), 31, Value::Float(100.0)),
        ],
    };

    let mut stmt = SelectStatement::new(
        "cpu",
        FieldCall::Aggregate {
            func: AggregateFn::Min,
            field: "value".to_string(),
            limit: None,
            percentile: None,
            tag: None,
        },
    );
    stmt.interval = 10;
    stmt.time_lo = 0;
    stmt.time_hi = 40;
    stmt.dimensions = vec!["host".to_string()];
    stmt.fill = FillPolicy::None;

    let select = Select::new(&factory, CompileOptions::default());
    let out = drain(select.compile(&stmt).unwrap().into_single());

    let got: Vec<(String, i64, f64)> = out
        .iter()
        .map(|p| (p.tags.get("host").unwrap().to_string(), p.time, p.value.as_f64().unwrap()))
        .collect();

    assert_eq!(
        got,
        vec![
            ("A".to_string(), 0, 19.0),
            ("B".to_string(), 0, 10.0),
            ("A".to_string(), 10, 2.0),
            ("A".to_string(), 30, 100.0),
        ]
    );
}

#[test]
fn s2_fill_previous_over_sparse_input() {
    let factory = CannedFactory {
        kind: Kind::Float,
        points: vec![Point::new("cpu", Tags::new(), 12, Value::Float(2.0))],
    };

    let mut stmt = SelectStatement::new("cpu", FieldCall::Plain("value".to_string()));
    stmt.interval = 10;
    stmt.time_lo = 0;
    stmt.time_hi = 60;
    stmt.fill = FillPolicy::Previous;

    let select = Select::new(&factory, CompileOptions::default());
    let out = drain(select.compile(&stmt).unwrap().into_single());

    let got: Vec<(i64, Option<f64>)> = out
        .iter()
        .map(|p| (p.time, if p.nil { None } else { Some(p.value.as_f64().unwrap()) }))
        .collect();

    assert_eq!(
        got,
        vec![
            (0, None),
            (10, Some(2.0)),
            (20, Some(2.0)),
            (30, Some(2.0)),
            (40, Some(2.0)),
            (50, Some(2.0)),
        ]
    );
}

#[test]
fn s3_tagged_top_without_group_by_tag() {
    let factory = CannedFactory {
        kind: Kind::Float,
        points: vec![
            Point::new("cpu", Tags::from_pairs([("host", "A")]), 0, Value::Float(1.0)),
            Point::new("cpu", Tags::from_pairs([("host", "A")]), 10, Value::Float(20.0)),
            Point::new("cpu", Tags::from_pairs([("host", "B")]), 5, Value::Float(9.0)),
        ],
    };

    let mut stmt = SelectStatement::new(
        "cpu",
        FieldCall::Aggregate {
            func: AggregateFn::Top,
            field: "value".to_string(),
            limit: Some(2),
            percentile: None,
            tag: Some("host".to_string()),
        },
    );
    stmt.interval = 30;
    stmt.time_lo = 0;
    stmt.time_hi = 30;
    stmt.fill = FillPolicy::None;

    let select = Select::new(&factory, CompileOptions::default());
    let compiled = select.compile(&stmt).unwrap();
    let CompiledSelect::Tagged(primary, companion) = compiled else {
        panic!("tagged top/bottom must compile to a paired stream");
    };

    let values: Vec<f64> = drain(primary).iter().map(|p| p.value.as_f64().unwrap()).collect();
    let tags: Vec<Value> = drain(companion).into_iter().map(|p| p.value).collect();

    assert_eq!(values, vec![20.0, 9.0]);
    assert_eq!(tags, vec![Value::String("A".to_string()), Value::String("B".to_string())]);
}

#[test]
fn s4_derivative_over_unevenly_spaced_points() {
    let factory = CannedFactory {
        kind: Kind::Float,
        points: vec![
            Point::new("cpu", Tags::new(), 0, Value::Float(20.0)),
            Point::new("cpu", Tags::new(), 4, Value::Float(10.0)),
            Point::new("cpu", Tags::new(), 8, Value::Float(19.0)),
            Point::new("cpu", Tags::new(), 12, Value::Float(3.0)),
        ],
    };

    let mut stmt = SelectStatement::new("cpu", FieldCall::Plain("value".to_string()));
    stmt.fill = FillPolicy::None;
    stmt.derivative = Some(DerivativeUnit::Explicit(1));

    let select = Select::new(&factory, CompileOptions::default());
    let out = drain(select.compile(&stmt).unwrap().into_single());

    let got: Vec<(i64, f64)> = out.iter().map(|p| (p.time, p.value.as_f64().unwrap())).collect();
    assert_eq!(got, vec![(4, -2.5), (8, 2.25), (12, -4.0)]);
}

#[test]
fn derivative_default_unit_is_read_from_compile_options() {
    // A bare `derivative(value)` with no explicit unit falls back to
    // `CompileOptions::derivative_default_unit_nanos` rather than always
    // requiring the caller to name one.
    let factory = CannedFactory {
        kind: Kind::Float,
        points: vec![
            Point::new("cpu", Tags::new(), 0, Value::Float(0.0)),
            Point::new("cpu", Tags::new(), 2, Value::Float(10.0)),
        ],
    };

    let mut stmt = SelectStatement::new("cpu", FieldCall::Plain("value".to_string()));
    stmt.fill = FillPolicy::None;
    stmt.derivative = Some(DerivativeUnit::Default);

    let mut options = CompileOptions::default();
    options.derivative_default_unit_nanos = 1;

    let select = Select::new(&factory, options);
    let out = drain(select.compile(&stmt).unwrap().into_single());

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].value.as_f64().unwrap(), 5.0);
}

#[test]
fn s5_binary_expression_constant_minus_value() {
    let factory = CannedFactory {
        kind: Kind::Float,
        points: vec![
            Point::new("cpu", Tags::new(), 0, Value::Float(20.0)),
            Point::new("cpu", Tags::new(), 5, Value::Float(10.0)),
            Point::new("cpu", Tags::new(), 9, Value::Float(19.0)),
        ],
    };

    let mut stmt = SelectStatement::new("cpu", FieldCall::Plain("value".to_string()));
    stmt.fill = FillPolicy::None;
    stmt.binary = Some(BinaryExprSpec {
        op: BinaryOp::Sub,
        lhs: Operand::Constant(Value::Float(2.0)),
        rhs: Operand::Primary,
        output_kind: Kind::Float,
    });

    let select = Select::new(&factory, CompileOptions::default());
    let out = drain(select.compile(&stmt).unwrap().into_single());

    let got: Vec<f64> = out.iter().map(|p| p.value.as_f64().unwrap()).collect();
    assert_eq!(got, vec![-18.0, -8.0, -17.0]);
}

#[test]
fn s6_stddev_on_string_input_is_a_type_preserving_no_op() {
    let factory = CannedFactory {
        kind: Kind::String,
        points: vec![
            Point::new("cpu", Tags::new(), 0, Value::String("a".to_string())),
            Point::new("cpu", Tags::new(), 1, Value::String("b".to_string())),
        ],
    };

    let mut stmt = SelectStatement::new(
        "cpu",
        FieldCall::Aggregate {
            func: AggregateFn::Stddev,
            field: "value".to_string(),
            limit: None,
            percentile: None,
            tag: None,
        },
    );
    stmt.fill = FillPolicy::None;

    let select = Select::new(&factory, CompileOptions::default());
    let out = drain(select.compile(&stmt).unwrap().into_single());

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].value, Value::String(String::new()));
    assert!(!out[0].nil);
}
