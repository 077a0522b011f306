//! Numeric contracts of the built-in mappers: haversine, time bucketing,
//! TF-IDF, PMI, speed, product.

use rowflow::operators::{HaversineMapper, PmiMapper, Product, SpeedMapper, Sum, TfIdfMapper, TimeProcessMapper};
use rowflow::{row, Error, Graph, Inputs, Value};

fn float(row: &rowflow::Row, column: &str) -> f64 {
    row.get(column)
        .and_then(Value::as_float)
        .unwrap_or(f64::NAN)
}

#[test]
fn test_haversine_moscow_to_st_petersburg() {
    let inputs = Inputs::new().with_rows(
        "edges",
        vec![row! {
            "edge_id" => 1,
            "start" => (37.6173, 55.7558),
            "end" => (30.3141, 59.9386),
        }],
    );
    let graph = Graph::from_iter("edges").map(HaversineMapper::new("start", "end", "distance"));
    let rows = graph.run(&inputs).unwrap();
    let distance = float(&rows[0], "distance");
    assert!(
        (distance - 632.0).abs() < 2.0,
        "expected ~632 km, got {distance}"
    );
}

#[test]
fn test_haversine_zero_distance() {
    let inputs = Inputs::new().with_rows(
        "edges",
        vec![row! { "start" => (10.0, 20.0), "end" => (10.0, 20.0) }],
    );
    let graph = Graph::from_iter("edges").map(HaversineMapper::new("start", "end", "distance"));
    let rows = graph.run(&inputs).unwrap();
    assert!(float(&rows[0], "distance").abs() < 1e-9);
}

#[test]
fn test_time_process_monday_morning() {
    let inputs = Inputs::new().with_rows(
        "trips",
        vec![row! {
            "enter_time" => "20210503T081500",
            "leave_time" => "20210503T093000",
        }],
    );
    let graph = Graph::from_iter("trips").map(TimeProcessMapper::new(
        "enter_time",
        "leave_time",
        "duration",
        "hour",
        "weekday",
    ));
    let rows = graph.run(&inputs).unwrap();
    assert_eq!(rows[0].get("weekday"), Some(&Value::from("Mon")));
    assert_eq!(rows[0].get("hour"), Some(&Value::Int(8)));
    assert!((float(&rows[0], "duration") - 1.25).abs() < 1e-12);
}

#[test]
fn test_time_process_fractional_seconds() {
    let inputs = Inputs::new().with_rows(
        "trips",
        vec![row! {
            "enter_time" => "20211231T235959.500000",
            "leave_time" => "20220101T000000.500000",
        }],
    );
    let graph = Graph::from_iter("trips").map(TimeProcessMapper::new(
        "enter_time",
        "leave_time",
        "duration",
        "hour",
        "weekday",
    ));
    let rows = graph.run(&inputs).unwrap();
    // Friday, one second across midnight.
    assert_eq!(rows[0].get("weekday"), Some(&Value::from("Fri")));
    assert_eq!(rows[0].get("hour"), Some(&Value::Int(23)));
    assert!((float(&rows[0], "duration") - 1.0 / 3600.0).abs() < 1e-12);
}

#[test]
fn test_time_process_rejects_malformed_timestamps() {
    let inputs = Inputs::new().with_rows(
        "trips",
        vec![row! { "enter_time" => "yesterday", "leave_time" => "20210503T093000" }],
    );
    let graph = Graph::from_iter("trips").map(TimeProcessMapper::new(
        "enter_time",
        "leave_time",
        "duration",
        "hour",
        "weekday",
    ));
    let err = graph.run(&inputs).unwrap_err();
    assert!(matches!(err, Error::Timestamp { .. }));
}

#[test]
fn test_tf_idf_formula() {
    let inputs = Inputs::new().with_rows(
        "rows",
        vec![row! { "tf" => 0.5, "docs_number" => 4, "words_number" => 2 }],
    );
    let graph = Graph::from_iter("rows").map(TfIdfMapper::new(
        "tf",
        "docs_number",
        "words_number",
        "tf_idf",
    ));
    let rows = graph.run(&inputs).unwrap();
    assert!((float(&rows[0], "tf_idf") - 0.5 * 2.0_f64.ln()).abs() < 1e-12);
}

#[test]
fn test_pmi_formula_and_domain() {
    let inputs = Inputs::new().with_rows(
        "rows",
        vec![row! { "doc_freq" => 0.4, "total_freq" => 0.2 }],
    );
    let graph =
        Graph::from_iter("rows").map(PmiMapper::new("doc_freq", "total_freq", "pmi"));
    let rows = graph.run(&inputs).unwrap();
    assert!((float(&rows[0], "pmi") - 2.0_f64.ln()).abs() < 1e-12);

    let zero = Inputs::new().with_rows(
        "rows",
        vec![row! { "doc_freq" => 0.4, "total_freq" => 0 }],
    );
    let err = graph.run(&zero).unwrap_err();
    assert!(matches!(err, Error::DivisionByZero(_)));
}

#[test]
fn test_speed_division_by_zero_is_fatal() {
    let graph = Graph::from_iter("legs").map(SpeedMapper::new("distance", "duration", "speed"));

    let ok = Inputs::new().with_rows(
        "legs",
        vec![row! { "distance" => 120.0, "duration" => 1.5 }],
    );
    let rows = graph.run(&ok).unwrap();
    assert!((float(&rows[0], "speed") - 80.0).abs() < 1e-12);

    let zero = Inputs::new().with_rows(
        "legs",
        vec![row! { "distance" => 120.0, "duration" => 0.0 }],
    );
    let err = graph.run(&zero).unwrap_err();
    assert!(matches!(err, Error::DivisionByZero(c) if c == "duration"));
}

#[test]
fn test_product_multiplies_numeric_columns() {
    let inputs = Inputs::new().with_rows(
        "rows",
        vec![row! { "a" => 3, "b" => 4, "c" => 0.5 }],
    );
    let graph = Graph::from_iter("rows").map(Product::new(&["a", "b", "c"], "p"));
    let rows = graph.run(&inputs).unwrap();
    assert_eq!(rows[0].get("p"), Some(&Value::Float(6.0)));
}

#[test]
fn test_sum_overflow_is_fatal() {
    let inputs = Inputs::new().with_rows(
        "rows",
        vec![row! { "x" => i64::MAX }, row! { "x" => 1 }],
    );
    let graph = Graph::from_iter("rows").reduce(Sum::new("x"), &[]);
    let err = graph.run(&inputs).unwrap_err();
    assert!(matches!(err, Error::IntegerOverflow(_)));
}
