//! End-to-end tests for the evaluation stage against a scratch registry

use std::fs;
use std::path::Path;

use rental_pipeline::config::RegistryConfig;
use rental_pipeline::experiment::RunStatus;
use rental_pipeline::model::{LinearModel, MeanModel, ModelBundle};
use rental_pipeline::registry::{ArtifactRegistry, LocalRegistry, RunContext};
use rental_pipeline::stages::{evaluation, EvaluationParams};
use rental_pipeline::Error;
use serde_json::json;

const TEST_DATA: &str = "\
id,minimum_nights,room_type,price
1,1,Private room,10
2,2,Entire home/apt,20
3,3,Shared room,30
";

/// Publish a model bundle as `random_forest_export` (tagged `prod`) and the
/// given dataset as `test_data.csv`.
fn seed(root: &Path, model_bundle: &ModelBundle, dataset: &str) {
    let scratch = tempfile::tempdir().unwrap();
    let bundle = scratch.path().join("random_forest_dir");
    model_bundle.save(&bundle).unwrap();
    let data = scratch.path().join("test_data.csv");
    fs::write(&data, dataset).unwrap();

    let mut run = RunContext::initialize(&RegistryConfig::new(root), "train", &json!({})).unwrap();
    let handle = run
        .publish("random_forest_export", "model_export", "Exported model", &bundle)
        .unwrap();
    let model = run.await_commit(handle).unwrap();
    let handle = run.publish("test_data.csv", "test_data", "Held-out split", &data).unwrap();
    run.await_commit(handle).unwrap();
    run.registry().tag(model.name(), model.version(), "prod").unwrap();
    run.finish().unwrap();
}

fn linear() -> ModelBundle {
    ModelBundle::Linear(LinearModel::new(vec!["minimum_nights".to_string()], vec![9.0], 2.0).unwrap())
}

fn params() -> EvaluationParams {
    EvaluationParams {
        mlflow_model: "random_forest_export:prod".to_string(),
        test_dataset: "test_data.csv:latest".to_string(),
    }
}

#[test]
fn test_metrics_recorded_on_run() {
    let root = tempfile::tempdir().unwrap();
    seed(root.path(), &linear(), TEST_DATA);

    let mut run =
        RunContext::initialize(&RegistryConfig::new(root.path()), evaluation::JOB_TYPE, &params())
            .unwrap();
    let report = evaluation::run(&mut run, &params()).unwrap();
    let record = run.finish().unwrap();

    // predictions 11, 20, 29 against labels 10, 20, 30
    assert_eq!(report.rows, 3);
    assert!((report.mae - 2.0 / 3.0).abs() < 1e-12);
    assert!((report.r2 - (1.0 - 2.0 / 200.0)).abs() < 1e-12);

    assert_eq!(record.status(), RunStatus::Success);
    assert_eq!(record.summary().get("r2"), Some(&report.r2));
    assert_eq!(record.summary().get("mae"), Some(&report.mae));
    assert!(record.outputs().is_empty());

    let pinned: Vec<String> = record.inputs().iter().map(|i| i.pinned()).collect();
    assert_eq!(pinned, ["random_forest_export:v1", "test_data.csv:v1"]);
    assert_eq!(record.inputs()[0].requested(), "random_forest_export:prod");

    let registry = LocalRegistry::connect(&RegistryConfig::new(root.path())).unwrap();
    let stored = registry.read_run(record.run_id()).unwrap();
    assert_eq!(stored.summary(), record.summary());
}

#[test]
fn test_evaluation_is_deterministic() {
    let root = tempfile::tempdir().unwrap();
    seed(root.path(), &linear(), TEST_DATA);

    let reports: Vec<_> = (0..3)
        .map(|_| {
            let mut run = RunContext::initialize(
                &RegistryConfig::new(root.path()),
                evaluation::JOB_TYPE,
                &params(),
            )
            .unwrap();
            let report = evaluation::run(&mut run, &params()).unwrap();
            run.finish().unwrap();
            report
        })
        .collect();

    assert!(reports.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_missing_label_records_nothing() {
    let root = tempfile::tempdir().unwrap();
    seed(root.path(), &linear(), "id,minimum_nights\n1,1\n2,2\n");

    let mut run =
        RunContext::initialize(&RegistryConfig::new(root.path()), evaluation::JOB_TYPE, &params())
            .unwrap();
    let err = evaluation::run(&mut run, &params()).unwrap_err();
    assert!(err.is_schema_error());
    assert!(run.record().summary().is_empty());
}

#[test]
fn test_feature_mismatch_is_prediction_error() {
    let root = tempfile::tempdir().unwrap();
    seed(root.path(), &linear(), "id,bedrooms,price\n1,1,10\n2,2,20\n");

    let mut run =
        RunContext::initialize(&RegistryConfig::new(root.path()), evaluation::JOB_TYPE, &params())
            .unwrap();
    assert!(matches!(
        evaluation::run(&mut run, &params()),
        Err(Error::PredictionError(_))
    ));
    assert!(run.record().summary().is_empty());
}

#[test]
fn test_mean_baseline_bundle() {
    let root = tempfile::tempdir().unwrap();
    seed(root.path(), &ModelBundle::Mean(MeanModel::new(20.0)), TEST_DATA);

    let mut run =
        RunContext::initialize(&RegistryConfig::new(root.path()), evaluation::JOB_TYPE, &params())
            .unwrap();
    let report = evaluation::run(&mut run, &params()).unwrap();
    run.finish().unwrap();

    assert!(report.r2.abs() < 1e-12);
    assert!((report.mae - 20.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_model_reference_to_file_artifact_fails() {
    let root = tempfile::tempdir().unwrap();
    seed(root.path(), &linear(), TEST_DATA);

    let params = EvaluationParams {
        mlflow_model: "test_data.csv:latest".to_string(),
        test_dataset: "test_data.csv:latest".to_string(),
    };
    let mut run =
        RunContext::initialize(&RegistryConfig::new(root.path()), evaluation::JOB_TYPE, &params)
            .unwrap();
    assert!(matches!(
        evaluation::run(&mut run, &params),
        Err(Error::NotFound(_))
    ));
}
