//! End-to-end tests for the cleaning stage against a scratch registry

use std::fs;
use std::path::Path;

use rental_pipeline::config::RegistryConfig;
use rental_pipeline::experiment::RunStatus;
use rental_pipeline::registry::{ArtifactReference, ArtifactRegistry, LocalRegistry, RunContext};
use rental_pipeline::stages::{cleaning, CleaningParams};
use rental_pipeline::table::Table;
use rental_pipeline::Error;
use serde_json::json;

const SAMPLE: &str = "\
id,name,price,longitude,latitude,minimum_nights
1,Sunny loft,100,-73.95,40.75,2
2,Budget room,45,-73.95,40.75,1
3,Penthouse,600,-73.95,40.75,3
4,Jersey shore,200,-75.0,40.75,2
5,Brooklyn flat,300,-73.90,40.80,4
";

/// Seed `sample.csv:v1` into a fresh registry rooted at `root`.
fn seed(root: &Path, body: &str) {
    let scratch = tempfile::tempdir().unwrap();
    let src = scratch.path().join("sample.csv");
    fs::write(&src, body).unwrap();

    let mut run = RunContext::initialize(&RegistryConfig::new(root), "download", &json!({})).unwrap();
    let handle = run.publish("sample.csv", "raw_data", "Raw listings", &src).unwrap();
    run.await_commit(handle).unwrap();
    run.finish().unwrap();
}

fn params(staging: &Path) -> CleaningParams {
    CleaningParams::new(
        "sample.csv:latest",
        "clean_sample.csv",
        "clean_sample",
        "Data with outliers and null values removed",
        50,
        500,
    )
    .with_staging_dir(staging)
}

#[test]
fn test_five_row_scenario() {
    let root = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    seed(root.path(), SAMPLE);

    let params = params(staging.path());
    let mut run = RunContext::initialize(&RegistryConfig::new(root.path()), cleaning::JOB_TYPE, &params)
        .unwrap();
    let outcome = cleaning::run(&mut run, &params).unwrap();
    let record = run.finish().unwrap();

    assert_eq!(outcome.counts.input_rows, 5);
    assert_eq!(outcome.counts.after_price, 3);
    assert_eq!(outcome.counts.after_geo, 2);
    assert_eq!(outcome.artifact.qualified_name(), "clean_sample.csv:v1");
    assert!(outcome.artifact.is_committed());

    // staging file is named after the output artifact and holds the kept rows
    assert_eq!(outcome.staged_path, staging.path().join("clean_sample.csv"));
    let staged = Table::load(&outcome.staged_path).unwrap();
    assert_eq!(staged.num_rows(), 2);
    assert_eq!(
        staged.column_names(),
        ["id", "name", "price", "longitude", "latitude", "minimum_nights"]
    );
    let ids = staged.numeric_column("id").unwrap();
    assert_eq!(ids.values().to_vec(), vec![1.0, 5.0]);

    // the published version holds the same rows
    let registry = LocalRegistry::connect(&RegistryConfig::new(root.path())).unwrap();
    let published = registry
        .resolve(&ArtifactReference::parse("clean_sample.csv:latest").unwrap())
        .unwrap();
    assert_eq!(Table::load(published.path()).unwrap(), staged);

    assert_eq!(record.status(), RunStatus::Success);
    assert_eq!(record.outputs(), ["clean_sample.csv:v1"]);
    assert_eq!(record.inputs()[0].pinned(), "sample.csv:v1");
    assert_eq!(record.config()["min_price"], 50);
    assert_eq!(record.config()["output_artifact"], "clean_sample.csv");
}

#[test]
fn test_rerun_creates_new_version() {
    let root = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    seed(root.path(), SAMPLE);
    let params = params(staging.path());

    for expected in 1..=2 {
        let mut run =
            RunContext::initialize(&RegistryConfig::new(root.path()), cleaning::JOB_TYPE, &params)
                .unwrap();
        let outcome = cleaning::run(&mut run, &params).unwrap();
        assert_eq!(outcome.artifact.version(), expected);
        run.finish().unwrap();
    }

    let registry = LocalRegistry::connect(&RegistryConfig::new(root.path())).unwrap();
    let versions = registry.list_versions("clean_sample.csv").unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].cas_hash(), versions[1].cas_hash());
}

#[test]
fn test_missing_price_fails_before_publish() {
    let root = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    seed(root.path(), "id,longitude,latitude\n1,-73.95,40.75\n");

    let params = params(staging.path());
    let mut run = RunContext::initialize(&RegistryConfig::new(root.path()), cleaning::JOB_TYPE, &params)
        .unwrap();
    let run_id = run.run_id().to_string();
    let err = cleaning::run(&mut run, &params).unwrap_err();
    drop(run);

    assert!(err.is_schema_error());
    assert!(matches!(err, Error::MissingColumn { ref column } if column == "price"));
    assert!(!staging.path().join("clean_sample.csv").exists());

    let registry = LocalRegistry::connect(&RegistryConfig::new(root.path())).unwrap();
    assert!(matches!(
        registry.list_versions("clean_sample.csv"),
        Err(Error::NotFound(_))
    ));
    assert_eq!(registry.read_run(&run_id).unwrap().status(), RunStatus::Failed);
}

#[test]
fn test_empty_result_is_published() {
    let root = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    seed(root.path(), SAMPLE);

    let mut params = params(staging.path());
    params.min_price = 10_000;
    params.max_price = 20_000;
    let mut run = RunContext::initialize(&RegistryConfig::new(root.path()), cleaning::JOB_TYPE, &params)
        .unwrap();
    let outcome = cleaning::run(&mut run, &params).unwrap();
    run.finish().unwrap();

    assert_eq!(outcome.counts.after_geo, 0);
    let staged = Table::load(&outcome.staged_path).unwrap();
    assert_eq!(staged.num_rows(), 0);
    assert!(staged.has_column("price"));
}

#[test]
fn test_unknown_input_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    let params = params(staging.path());

    let mut run = RunContext::initialize(&RegistryConfig::new(root.path()), cleaning::JOB_TYPE, &params)
        .unwrap();
    assert!(matches!(cleaning::run(&mut run, &params), Err(Error::NotFound(_))));
}

#[test]
fn test_output_name_with_separator_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    seed(root.path(), SAMPLE);

    let mut params = params(staging.path());
    params.output_artifact = "../escape.csv".to_string();
    let mut run = RunContext::initialize(&RegistryConfig::new(root.path()), cleaning::JOB_TYPE, &params)
        .unwrap();
    assert!(matches!(
        cleaning::run(&mut run, &params),
        Err(Error::InvalidReference(_))
    ));
    assert!(run.record().inputs().is_empty());
}
