use std::fs;
use std::path::Path;

use sounddb::{
    AccessError, Args, Catalog, DelimitedParser, DirectoryCatalog,
    DirectoryCatalogConfig, FetchRequest, Label, Query, Structure, TableOptions, Value,
};
use tempfile::TempDir;

const NVSPL_TEMPLATE: &str = r"{site}{year:\d{4}}/NVSPL_{site}{year}_{month}_{day}_{hour}.txt";
const SRCID_TEMPLATE: &str = r"{site}{year:\d{4}}/SRCID_{site}{year}.txt";

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn levels(hour: &str, first: f64, second: f64) -> String {
    format!(
        "STime,dbA,H12p5\n\
         2015-06-01 {hour}:00:00,{first:.1},20.1\n\
         2015-06-01 {hour}:00:01,{second:.1},21.0\n"
    )
}

fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "TRLA2015/NVSPL_TRLA2015_06_01_13.txt", &levels("13", 35.0, 37.0));
    write(root, "TRLA2015/NVSPL_TRLA2015_06_01_14.txt", &levels("14", 36.0, 38.0));
    write(root, "DENA2014/NVSPL_DENA2014_06_01_00.txt", &levels("00", 30.0, 32.0));
    write(root, "TRLA2015/README.txt", "not a data file");
    write(
        root,
        "TRLA2015/SRCID_TRLA2015.txt",
        "%% SRCID v2\nsrcID\tsrcType\tlen\n1\t1.1\t45\n2\t.0\t12\n",
    );
    dir
}

fn catalog(root: &Path) -> DirectoryCatalog {
    DirectoryCatalog::new(
        DirectoryCatalogConfig::new(root)
            .with_endpoint("nvspl", NVSPL_TEMPLATE)
            .with_endpoint("srcid", SRCID_TEMPLATE),
    )
    .unwrap()
}

fn nvspl() -> DelimitedParser {
    DelimitedParser::csv("nvspl").with_index_column("STime")
}

#[test]
fn entries_come_from_matching_paths_in_path_order() {
    let dir = fixture();
    let entries = catalog(dir.path()).fetch(&FetchRequest::new("nvspl")).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].field("site"), Some("DENA"));
    let first = &entries[1];
    let fields: Vec<(&str, &str)> = first
        .fields
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    assert_eq!(
        fields,
        [
            ("site", "TRLA"),
            ("year", "2015"),
            ("month", "06"),
            ("day", "01"),
            ("hour", "13")
        ]
    );
    assert_eq!(
        catalog(dir.path()).fields("nvspl").unwrap(),
        ["site", "year", "month", "day", "hour"]
    );
}

#[test]
fn hourly_frames_stack_under_their_identity() {
    let dir = fixture();
    let query = Query::new(catalog(dir.path()), nvspl())
        .unwrap()
        .filter("site", "TRLA")
        .with_options(TableOptions::default().with_columns(["dbA"]));
    let combined = query.combine().unwrap();
    let merged = combined.as_value().and_then(Structure::as_frame).unwrap();
    assert_eq!(merged.shape(), (4, 1));
    let identity = match merged.index().get(0) {
        Some(Label::Tuple(parts)) => parts[0].clone(),
        other => panic!("unexpected label {other:?}"),
    };
    assert_eq!(identity, Label::from("TRLA2015 06-01 13:"));
}

#[test]
fn grouped_means_per_site_and_year() {
    let dir = fixture();
    let query = Query::new(catalog(dir.path()), nvspl())
        .unwrap()
        .group_by_fields(["site", "year"])
        .unwrap()
        .index("dbA")
        .attr("mean")
        .call(Args::new());
    let combined = query.combine().unwrap();
    let means = combined.as_value().and_then(Structure::as_series).unwrap();
    let key = |site: &str, year: &str| Label::Tuple(vec![Label::from(site), Label::from(year)]);
    assert_eq!(means.get(&key("DENA", "2014")), Some(&Value::Float(31.0)));
    assert_eq!(means.get(&key("TRLA", "2015")), Some(&Value::Float(36.5)));
}

#[test]
fn unreadable_files_are_skipped() {
    let dir = fixture();
    write(
        dir.path(),
        "TRLA2015/NVSPL_TRLA2015_06_01_15.txt",
        "Other,dbA\nx,1.0\n",
    );
    let query = Query::new(catalog(dir.path()), nvspl()).unwrap();
    let mut run = query.iter().unwrap();
    let parsed = run.by_ref().filter(Result::is_ok).count();
    assert_eq!(parsed, 3);
    assert_eq!(run.stats().parse_failures, 1);
    assert_eq!(run.stats().located, 4);
}

#[test]
fn each_run_rescans_the_tree() {
    let dir = fixture();
    let query = Query::new(catalog(dir.path()), nvspl())
        .unwrap()
        .filter("site", "DENA");
    assert_eq!(query.iter().unwrap().count(), 1);
    write(
        dir.path(),
        "DENA2014/NVSPL_DENA2014_06_01_01.txt",
        &levels("01", 31.0, 33.0),
    );
    assert_eq!(query.iter().unwrap().count(), 2);
}

#[test]
fn srcid_banner_lines_are_skipped() {
    let dir = fixture();
    let parser = DelimitedParser::tsv("srcid")
        .with_comment(b'%')
        .with_index_column("srcID");
    let query = Query::new(catalog(dir.path()), parser).unwrap();
    let combined = query.combine().unwrap();
    let table = combined.as_value().and_then(Structure::as_frame).unwrap();
    assert_eq!(table.shape(), (2, 2));
    assert_eq!(table.index().labels(), [Label::Int(1), Label::Int(2)]);
}

#[test]
fn missing_root_fails_the_run_up_front() {
    let dir = fixture();
    let catalog = catalog(&dir.path().join("missing"));
    let query = Query::new(catalog, nvspl()).unwrap();
    assert!(matches!(
        query.iter().err(),
        Some(AccessError::CatalogUnavailable { .. })
    ));
    assert!(matches!(
        query.combine(),
        Err(AccessError::CatalogUnavailable { .. })
    ));
}

#[test]
fn empty_column_selection_is_a_setup_error() {
    let dir = fixture();
    let query = Query::new(catalog(dir.path()), nvspl())
        .unwrap()
        .with_options(TableOptions::default().with_columns(Vec::<String>::new()));
    assert!(matches!(query.iter().err(), Some(AccessError::Configuration(_))));
    assert!(matches!(query.combine(), Err(AccessError::Configuration(_))));
}
