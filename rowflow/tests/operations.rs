//! Operator algebra: grouping, sorting, joining, and the built-in
//! mappers and reducers, exercised through whole graphs.

use rowflow::ops::{
    Apply, Count, Filter, FilterGroup, Identity, Idf, InnerJoiner, LeftJoiner, Mean, OuterJoiner,
    Project, RightJoiner, Split, Sum, Tf, TfIdf, TopN, json_line_parser,
};
use rowflow::{Error, Graph, Inputs, Row, Value};
use serde_json::json;

fn rows(values: Value) -> Vec<Row> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect()
}

#[test]
fn reduce_rejects_unsorted_input() {
    let graph = Graph::from_iter("rows").reduce(Count::new("n"), &["k"]);
    let inputs = Inputs::new().with_rows("rows", rows(json!([{"k": 2}, {"k": 1}])));

    let err = graph.run(&inputs).unwrap_err();
    assert!(matches!(err, Error::NotSorted { .. }), "got {err}");
}

#[test]
fn join_rejects_unsorted_input() {
    let left = Graph::from_iter("left");
    let right = Graph::from_iter("right");
    let graph = left.join(InnerJoiner::new(), &right, &["k"]);
    let inputs = Inputs::new()
        .with_rows("left", rows(json!([{"k": 1}, {"k": 3}, {"k": 2}])))
        .with_rows("right", rows(json!([{"k": 1}])));

    let err = graph.run(&inputs).unwrap_err();
    assert!(matches!(err, Error::NotSorted { .. }), "got {err}");
}

#[test]
fn outer_join_keeps_left_rows_when_right_is_empty() {
    let left = Graph::from_iter("left");
    let right = Graph::from_iter("right");
    let inputs = Inputs::new()
        .with_rows("left", rows(json!([{"k": 1, "a": 10}])))
        .with_rows("right", rows(json!([])));

    let outer = left.join(OuterJoiner::new(), &right, &["k"]);
    assert_eq!(
        outer.run(&inputs).unwrap(),
        rows(json!([{"k": 1, "a": 10}]))
    );

    let inner = left.join(InnerJoiner::new(), &right, &["k"]);
    assert_eq!(inner.run(&inputs).unwrap(), rows(json!([])));
}

#[test]
fn inner_join_suffixes_colliding_fields() {
    let left = Graph::from_iter("left");
    let right = Graph::from_iter("right");
    let graph = left.join(InnerJoiner::new(), &right, &["k"]);
    let inputs = Inputs::new()
        .with_rows("left", rows(json!([{"k": 1, "f": "a"}])))
        .with_rows("right", rows(json!([{"k": 1, "f": "b"}])));

    let out = graph.run(&inputs).unwrap();
    assert_eq!(out, rows(json!([{"k": 1, "f_1": "a", "f_2": "b"}])));
    assert!(!out[0].contains_key("f"));
}

#[test]
fn left_and_right_joins_keep_their_side() {
    let left = Graph::from_iter("left");
    let right = Graph::from_iter("right");
    let inputs = Inputs::new()
        .with_rows("left", rows(json!([{"k": 1, "a": 1}, {"k": 2, "a": 2}])))
        .with_rows("right", rows(json!([{"k": 2, "b": 20}, {"k": 3, "b": 30}])));

    let out = left
        .join(LeftJoiner::new(), &right, &["k"])
        .run(&inputs)
        .unwrap();
    assert_eq!(
        out,
        rows(json!([
            {"k": 1, "a": 1},
            {"k": 2, "a": 2, "b": 20},
        ]))
    );

    let out = left
        .join(RightJoiner::new(), &right, &["k"])
        .run(&inputs)
        .unwrap();
    assert_eq!(
        out,
        rows(json!([
            {"k": 2, "a": 2, "b": 20},
            {"k": 3, "b": 30},
        ]))
    );
}

#[test]
fn branching_from_a_shared_node_reads_the_source_per_appearance() {
    let sorted = Graph::from_iter("rows").map(Identity).sort(&["k"]);
    let graph = sorted.join(InnerJoiner::new(), &sorted, &["k"]);
    let inputs = Inputs::new().with_rows("rows", rows(json!([{"k": 1, "v": 7}])));

    let out = graph.run(&inputs).unwrap();
    assert_eq!(out, rows(json!([{"k": 1, "v_1": 7, "v_2": 7}])));
}

#[test]
fn sort_is_stable_on_equal_keys() {
    let graph = Graph::from_iter("rows").sort(&["k"]);
    let inputs = Inputs::new().with_rows(
        "rows",
        rows(json!([
            {"k": 1, "tag": "a"},
            {"k": 0, "tag": "x"},
            {"k": 1, "tag": "b"},
        ])),
    );

    let out = graph.run(&inputs).unwrap();
    assert_eq!(
        out,
        rows(json!([
            {"k": 0, "tag": "x"},
            {"k": 1, "tag": "a"},
            {"k": 1, "tag": "b"},
        ]))
    );
}

#[test]
fn sorting_twice_equals_sorting_once() {
    let docs = rows(json!([
        {"k": 2, "tag": "a"},
        {"k": 1, "tag": "b"},
        {"k": 2, "tag": "c"},
    ]));
    let inputs = Inputs::new().with_rows("rows", docs);

    let once = Graph::from_iter("rows").sort(&["k"]).run(&inputs).unwrap();
    let twice = Graph::from_iter("rows")
        .sort(&["k"])
        .sort(&["k"])
        .run(&inputs)
        .unwrap();
    assert_eq!(once, twice);
}

#[test]
fn global_count_sees_every_row() {
    let graph = Graph::from_iter("rows").reduce(Count::new("n"), &[]);

    let inputs = Inputs::new().with_rows(
        "rows",
        rows(json!([{"v": 1}, {"v": 2}, {"v": 3}, {"v": 4}])),
    );
    assert_eq!(graph.run(&inputs).unwrap(), rows(json!([{"n": 4}])));

    let empty = Inputs::new().with_rows("rows", rows(json!([])));
    assert_eq!(graph.run(&empty).unwrap(), rows(json!([{"n": 0}])));
}

#[test]
fn projecting_twice_equals_projecting_once() {
    let docs = rows(json!([{"a": 1, "b": 2, "c": 3}]));
    let inputs = Inputs::new().with_rows("rows", docs);

    let once = Graph::from_iter("rows")
        .map(Project::new(&["a", "b"]))
        .run(&inputs)
        .unwrap();
    let twice = Graph::from_iter("rows")
        .map(Project::new(&["a", "b"]))
        .map(Project::new(&["a", "b"]))
        .run(&inputs)
        .unwrap();

    assert_eq!(once, rows(json!([{"a": 1, "b": 2}])));
    assert_eq!(once, twice);
}

#[test]
fn always_true_filter_is_identity() {
    let docs = rows(json!([{"v": 1}, {"v": 2}]));
    let inputs = Inputs::new().with_rows("rows", docs.clone());

    let out = Graph::from_iter("rows")
        .map(Filter::new(|_| true))
        .run(&inputs)
        .unwrap();
    assert_eq!(out, docs);
}

#[test]
fn top_n_keeps_largest_values_and_earliest_ties() {
    let graph = Graph::from_iter("rows").reduce(TopN::new("v", 2), &[]);
    let inputs = Inputs::new().with_rows(
        "rows",
        rows(json!([
            {"v": 3, "tag": "a"},
            {"v": 1, "tag": "b"},
            {"v": 3, "tag": "c"},
        ])),
    );

    let mut tags: Vec<String> = graph
        .run(&inputs)
        .unwrap()
        .iter()
        .map(|r| r["tag"].as_str().unwrap().to_owned())
        .collect();
    tags.sort();
    assert_eq!(tags, ["a", "c"]);
}

#[test]
fn sum_stays_integral_until_a_float_appears() {
    let graph = Graph::from_iter("rows").reduce(Sum::new("v"), &[]);

    let ints = Inputs::new().with_rows("rows", rows(json!([{"v": 1}, {"v": 2}, {"v": 3}])));
    assert_eq!(graph.run(&ints).unwrap(), rows(json!([{"v": 6}])));

    let mixed = Inputs::new().with_rows("rows", rows(json!([{"v": 1}, {"v": 2.5}])));
    assert_eq!(graph.run(&mixed).unwrap(), rows(json!([{"v": 3.5}])));
}

#[test]
fn mean_averages_the_group() {
    let graph = Graph::from_iter("rows")
        .sort(&["k"])
        .reduce(Mean::new("v"), &["k"]);
    let inputs = Inputs::new().with_rows(
        "rows",
        rows(json!([
            {"k": 1, "v": 2},
            {"k": 1, "v": 4},
            {"k": 2, "v": 5},
        ])),
    );

    assert_eq!(
        graph.run(&inputs).unwrap(),
        rows(json!([{"k": 1, "v": 3.0}, {"k": 2, "v": 5.0}]))
    );
}

#[test]
fn filter_group_emits_the_last_row_of_accepted_groups() {
    let graph = Graph::from_iter("rows").reduce(
        FilterGroup::new(|values| values.iter().all(|v| v.as_i64().unwrap_or(0) > 0), "v"),
        &["k"],
    );
    let inputs = Inputs::new().with_rows(
        "rows",
        rows(json!([
            {"k": 1, "v": 1, "tag": "first"},
            {"k": 1, "v": 2, "tag": "last"},
            {"k": 2, "v": -1, "tag": "rejected"},
        ])),
    );

    assert_eq!(
        graph.run(&inputs).unwrap(),
        rows(json!([{"k": 1, "v": 2, "tag": "last"}]))
    );
}

#[test]
fn split_with_explicit_separator_keeps_empty_tokens() {
    let graph = Graph::from_iter("rows").map(Split::with_separator("t", ","));
    let inputs = Inputs::new().with_rows("rows", rows(json!([{"t": "a,,b"}])));

    assert_eq!(
        graph.run(&inputs).unwrap(),
        rows(json!([{"t": "a"}, {"t": ""}, {"t": "b"}]))
    );
}

#[test]
fn split_on_whitespace_drops_empty_tokens() {
    let graph = Graph::from_iter("rows").map(Split::new("t"));
    let inputs = Inputs::new().with_rows("rows", rows(json!([{"t": "  a \t b  "}])));

    assert_eq!(
        graph.run(&inputs).unwrap(),
        rows(json!([{"t": "a"}, {"t": "b"}]))
    );
}

#[test]
fn frequency_result_columns_are_overridable() {
    let tf = Graph::from_iter("rows")
        .sort(&["doc"])
        .reduce(Tf::new("word").with_result_column("share"), &["doc"]);
    let inputs = Inputs::new().with_rows(
        "rows",
        rows(json!([
            {"doc": 1, "word": "a"},
            {"doc": 1, "word": "a"},
            {"doc": 1, "word": "b"},
        ])),
    );
    assert_eq!(
        tf.run(&inputs).unwrap(),
        rows(json!([
            {"doc": 1, "word": "a", "share": 2.0 / 3.0},
            {"doc": 1, "word": "b", "share": 1.0 / 3.0},
        ]))
    );

    let idf = Graph::from_iter("rows").map(Idf::new("total", "occ").with_result_column("weight"));
    let inputs = Inputs::new().with_rows("rows", rows(json!([{"total": 4, "occ": 2}])));
    let out = idf.run(&inputs).unwrap();
    assert!((out[0]["weight"].as_f64().unwrap() - 2f64.ln()).abs() < 1e-12);

    let score = Graph::from_iter("rows").map(
        TfIdf::new()
            .with_columns("share", "weight")
            .with_result_column("score"),
    );
    let inputs = Inputs::new().with_rows("rows", rows(json!([{"share": 0.5, "weight": 2.0}])));
    assert_eq!(
        score.run(&inputs).unwrap(),
        rows(json!([{"share": 0.5, "weight": 2.0, "score": 1.0}]))
    );
}

#[test]
fn apply_writes_the_function_result() {
    let product = |args: &[Value]| {
        Value::from(args[0].as_f64().unwrap() * args[1].as_f64().unwrap())
    };
    let graph = Graph::from_iter("rows").map(Apply::new(product, &["a", "b"], "p"));
    let inputs = Inputs::new().with_rows("rows", rows(json!([{"a": 3, "b": 4}])));

    assert_eq!(
        graph.run(&inputs).unwrap(),
        rows(json!([{"a": 3, "b": 4, "p": 12.0}]))
    );
}

#[test]
fn unbound_source_name_is_an_error() {
    let graph = Graph::from_iter("missing");
    let err = graph.run(&Inputs::new()).unwrap_err();
    assert!(matches!(err, Error::MissingInput { name } if name == "missing"));
}

#[test]
fn unreadable_file_source_is_an_error() {
    let graph = Graph::from_file("/nonexistent/rowflow-test-corpus", json_line_parser);
    let err = graph.run(&Inputs::new()).unwrap_err();
    assert!(matches!(err, Error::FileOpen { .. }), "got {err}");
}
