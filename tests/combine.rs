use std::collections::HashMap;
use std::ops::Range;

use sounddb::structure::{Cube, Frame, Index, Series};
use sounddb::{
    Combined, Entry, FnParser, InMemoryCatalog, Label, Parser, Query, RecordError, Structure,
    Value,
};

/// One entry per site; each parses to the structure given for it.
fn query_over(
    results: Vec<(&str, Structure)>,
) -> Query<InMemoryCatalog, impl Parser<Options = (), State = ()>> {
    let mut catalog = InMemoryCatalog::new().with_endpoint("results", ["site"]);
    let mut table = HashMap::new();
    for (site, structure) in results {
        catalog
            .insert("results", Entry::new(format!("{site}.txt")).with_field("site", site))
            .unwrap();
        table.insert(site.to_string(), structure);
    }
    let parser = FnParser::new("results", move |entry: &Entry| {
        table
            .get(entry.field("site").unwrap_or_default())
            .cloned()
            .ok_or_else(|| RecordError::Failed(format!("no result for {entry}")))
    });
    Query::new(catalog, parser).unwrap()
}

/// Frame over integer `rows` and `c{n}` columns; cell = `row * 100 + column`.
fn table(rows: Range<i64>, columns: Range<usize>) -> Frame {
    let index: Index = rows.clone().map(Label::Int).collect();
    let labels: Index = columns.clone().map(|c| Label::from(format!("c{c}"))).collect();
    let values: Vec<Vec<Value>> = rows
        .map(|row| {
            columns
                .clone()
                .map(|c| Value::Float((row * 100) as f64 + c as f64))
                .collect::<Vec<_>>()
        })
        .collect();
    Frame::from_rows(index, labels, values).unwrap()
}

fn frame(rows: Range<i64>, columns: Range<usize>) -> Structure {
    table(rows, columns).into()
}

/// Cube with one `table(rows, columns)` item per label of `items`.
fn cube(items: &[&str], rows: Range<i64>, columns: Range<usize>) -> Structure {
    let frames = items
        .iter()
        .map(|item| (Label::from(*item), table(rows.clone(), columns.clone())))
        .collect();
    Cube::from_frames(frames).into()
}

fn series(labels: Range<i64>) -> Structure {
    Series::from_pairs(labels.map(|label| (label, label as f64))).into()
}

fn value(combined: Combined) -> Structure {
    combined.into_value().expect("merged value")
}

#[test]
fn single_identity_is_returned_as_is() {
    let combined = query_over(vec![("TRLA", frame(0..3, 0..2))]).combine().unwrap();
    assert_eq!(value(combined), frame(0..3, 0..2));
}

#[test]
fn scalars_become_a_series_keyed_by_identity() {
    let query = query_over(vec![
        ("TRLA", Value::Float(41.5).into()),
        ("DENA", Value::Int(38).into()),
    ]);
    let merged = value(query.combine().unwrap());
    let merged = merged.as_series().unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.get(&Label::from("TRLA")), Some(&Value::Float(41.5)));
    assert_eq!(merged.get(&Label::from("DENA")), Some(&Value::Int(38)));
}

#[test]
fn mixed_scalar_classes_return_the_mapping() {
    let query = query_over(vec![
        ("TRLA", Value::Float(41.5).into()),
        ("DENA", Value::from("quiet").into()),
    ]);
    let combined = query.combine().unwrap();
    let mapping = combined.as_mapping().unwrap();
    assert_eq!(
        mapping.keys().cloned().collect::<Vec<_>>(),
        [Label::from("TRLA"), Label::from("DENA")]
    );
}

#[test]
fn overlapping_series_become_frame_columns() {
    let query = query_over(vec![("TRLA", series(0..4)), ("DENA", series(0..4))]);
    let merged = value(query.combine().unwrap());
    assert_eq!(merged.shape(), vec![4, 2]);
    assert_eq!(
        merged.as_frame().unwrap().columns().labels(),
        [Label::from("TRLA"), Label::from("DENA")]
    );
}

#[test]
fn disjoint_series_are_stacked_under_their_identity() {
    let query = query_over(vec![("TRLA", series(0..2)), ("DENA", series(5..8))]);
    let merged = value(query.combine().unwrap());
    let merged = merged.as_series().unwrap();
    assert_eq!(merged.len(), 5);
    assert_eq!(
        merged.index().get(2),
        Some(&Label::Tuple(vec![Label::from("DENA"), Label::Int(5)]))
    );
}

#[test]
fn frames_overlapping_on_both_axes_become_a_cube() {
    // 8 of 10 columns and 9 of 10 rows are shared.
    let query = query_over(vec![
        ("TRLA", frame(0..10, 0..10)),
        ("DENA", frame(1..10, 0..8)),
    ]);
    let merged = value(query.combine().unwrap());
    assert_eq!(merged.shape(), vec![2, 10, 10]);
    let cube = merged.as_cube().unwrap();
    let dena = cube.item(&Label::from("DENA")).unwrap();
    assert_eq!(dena.values()[[0, 0]], Value::Null);
    assert_eq!(dena.values()[[1, 0]], Value::Float(100.0));
}

#[test]
fn frames_with_few_shared_columns_return_the_mapping() {
    let query = query_over(vec![
        ("TRLA", frame(0..4, 0..4)),
        ("DENA", frame(0..4, 2..6)),
    ]);
    assert!(matches!(query.combine().unwrap(), Combined::Mapping(map) if map.len() == 2));
}

#[test]
fn frames_with_disjoint_rows_stack_with_a_tuple_index() {
    let query = query_over(vec![
        ("TRLA", frame(0..3, 0..2)),
        ("DENA", frame(10..13, 0..2)),
    ]);
    let merged = value(query.combine().unwrap());
    let stacked = merged.as_frame().unwrap();
    assert_eq!(stacked.shape(), (6, 2));
    assert_eq!(
        stacked.index().get(3),
        Some(&Label::Tuple(vec![Label::from("DENA"), Label::Int(10)]))
    );
}

#[test]
fn three_of_four_shared_columns_is_enough_to_merge() {
    let query = query_over(vec![
        ("TRLA", frame(0..4, 0..4)),
        ("DENA", frame(0..4, 1..4)),
    ]);
    let merged = value(query.combine().unwrap());
    assert_eq!(merged.shape(), vec![2, 4, 4]);
}

#[test]
fn frames_with_differing_index_kinds_return_the_mapping() {
    let positional = table(0..3, 0..2);
    let named: Index = ["r0", "r1", "r2"].into_iter().map(Label::from).collect();
    let relabelled = Frame::new(
        named,
        positional.columns().clone(),
        positional.values().clone(),
    )
    .unwrap();
    let query = query_over(vec![
        ("TRLA", positional.into()),
        ("DENA", relabelled.into()),
    ]);
    let combined = query.combine().unwrap();
    assert_eq!(combined.as_mapping().map(|map| map.len()), Some(2));
}

#[test]
fn cubes_overlapping_on_every_axis_become_a_hypercube() {
    let query = query_over(vec![
        ("TRLA", cube(&["L50", "L90"], 0..4, 0..4)),
        ("DENA", cube(&["L50", "L90"], 0..4, 0..4)),
    ]);
    let merged = value(query.combine().unwrap());
    assert_eq!(merged.shape(), vec![2, 2, 4, 4]);
}

#[test]
fn cubes_short_on_any_axis_return_the_mapping() {
    let few_columns = query_over(vec![
        ("TRLA", cube(&["L50", "L90"], 0..4, 0..4)),
        ("DENA", cube(&["L50", "L90"], 0..4, 2..6)),
    ]);
    assert!(matches!(few_columns.combine().unwrap(), Combined::Mapping(map) if map.len() == 2));

    let few_items = query_over(vec![
        ("TRLA", cube(&["L50", "L90"], 0..4, 0..4)),
        ("DENA", cube(&["L10", "L90"], 0..4, 0..4)),
    ]);
    assert!(matches!(few_items.combine().unwrap(), Combined::Mapping(map) if map.len() == 2));

    let few_rows = query_over(vec![
        ("TRLA", cube(&["L50", "L90"], 0..4, 0..4)),
        ("DENA", cube(&["L50", "L90"], 2..6, 0..4)),
    ]);
    assert!(matches!(few_rows.combine().unwrap(), Combined::Mapping(map) if map.len() == 2));
}

#[test]
fn threshold_override_changes_the_merge() {
    let query = query_over(vec![
        ("TRLA", frame(0..4, 0..4)),
        ("DENA", frame(0..4, 2..6)),
    ]);
    let merged = query.combiner().overlap_threshold(0.5).run().unwrap();
    assert_eq!(value(merged).shape(), vec![2, 4, 6]);
}

#[test]
fn mixed_kinds_return_the_mapping() {
    let query = query_over(vec![("TRLA", series(0..3)), ("DENA", frame(0..3, 0..2))]);
    assert!(matches!(query.combine().unwrap(), Combined::Mapping(_)));
}

#[test]
fn custom_identity_concatenates_before_merging() {
    let query = query_over(vec![("TRLA", frame(0..3, 0..2)), ("DENA", frame(3..6, 0..2))]);
    let merged = query
        .combiner()
        .identify_by(|_| Label::from("all"))
        .run()
        .unwrap();
    assert_eq!(value(merged).shape(), vec![6, 2]);
}

#[test]
fn finisher_reduces_each_identity() {
    let query = query_over(vec![("TRLA", series(0..3)), ("DENA", series(3..6))]);
    let merged = query
        .combiner()
        .finish_with(|structure| Ok(structure.attr("max")?.call(&Default::default())?))
        .run()
        .unwrap();
    let merged = value(merged);
    let maxima = merged.as_series().unwrap();
    assert_eq!(maxima.get(&Label::from("TRLA")), Some(&Value::Float(2.0)));
    assert_eq!(maxima.get(&Label::from("DENA")), Some(&Value::Float(5.0)));
}

#[test]
fn combining_twice_gives_the_same_result() {
    let query = query_over(vec![
        ("TRLA", frame(0..10, 0..10)),
        ("DENA", frame(1..10, 0..8)),
    ]);
    assert_eq!(query.combine().unwrap(), query.combine().unwrap());
}

#[test]
fn nothing_to_combine_is_an_empty_mapping() {
    let query = query_over(vec![("TRLA", series(0..3))]).filter("site", "KATM");
    assert!(matches!(query.combine().unwrap(), Combined::Mapping(map) if map.is_empty()));
}
