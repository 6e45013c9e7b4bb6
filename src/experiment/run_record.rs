//! Run Record - one stage execution and everything it touched

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MetricRecord;

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is created but not yet started.
    Pending,
    /// Run is currently executing.
    Running,
    /// Run completed successfully.
    Success,
    /// Run aborted with an error.
    Failed,
}

/// An artifact version consumed by a run.
///
/// `requested` is the reference exactly as the caller wrote it (possibly
/// `:latest` or an alias); `version` is what it resolved to. Keeping both is
/// what makes floating references auditable after the fact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputRecord {
    requested: String,
    name: String,
    version: u32,
    cas_hash: String,
}

impl InputRecord {
    /// Create a new input record.
    #[must_use]
    pub fn new(
        requested: impl Into<String>,
        name: impl Into<String>,
        version: u32,
        cas_hash: impl Into<String>,
    ) -> Self {
        Self {
            requested: requested.into(),
            name: name.into(),
            version,
            cas_hash: cas_hash.into(),
        }
    }

    /// Reference as requested by the caller.
    #[must_use]
    pub fn requested(&self) -> &str {
        &self.requested
    }

    /// Artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Concrete version the reference resolved to.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Content hash of the resolved version.
    #[must_use]
    pub fn cas_hash(&self) -> &str {
        &self.cas_hash
    }

    /// Pinned form of the reference, `name:vN`.
    #[must_use]
    pub fn pinned(&self) -> String {
        format!("{}:v{}", self.name, self.version)
    }
}

/// Run Record represents a single execution of a pipeline stage.
///
/// It binds the stage's job type and configuration snapshot to the exact
/// artifact versions it read and wrote and to its summary metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    run_id: String,
    project: String,
    job_type: String,
    config: serde_json::Value,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    inputs: Vec<InputRecord>,
    outputs: Vec<String>,
    metrics: Vec<MetricRecord>,
    summary: BTreeMap<String, f64>,
}

impl RunRecord {
    /// Create a new run record in Pending status with an empty config.
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        project: impl Into<String>,
        job_type: impl Into<String>,
    ) -> Self {
        RunRecordBuilder::new(run_id, project, job_type).build()
    }

    /// Create a builder for constructing a run record with optional fields.
    #[must_use]
    pub fn builder(
        run_id: impl Into<String>,
        project: impl Into<String>,
        job_type: impl Into<String>,
    ) -> RunRecordBuilder {
        RunRecordBuilder::new(run_id, project, job_type)
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the project namespace.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Get the job type label.
    #[must_use]
    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    /// Get the configuration snapshot.
    #[must_use]
    pub const fn config(&self) -> &serde_json::Value {
        &self.config
    }

    /// Get the current run status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the start timestamp, if the run has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the run has completed.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Artifact versions consumed by the run, in resolution order.
    #[must_use]
    pub fn inputs(&self) -> &[InputRecord] {
        &self.inputs
    }

    /// Artifact versions produced by the run, as `name:vN`.
    #[must_use]
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Every metric write, in order.
    #[must_use]
    pub fn metrics(&self) -> &[MetricRecord] {
        &self.metrics
    }

    /// Summary values: the last write for each metric key.
    #[must_use]
    pub const fn summary(&self) -> &BTreeMap<String, f64> {
        &self.summary
    }

    /// Start the run, transitioning from Pending to Running.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Complete the run with the given final status.
    pub fn complete(&mut self, status: RunStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }

    /// Record a consumed artifact version.
    pub fn add_input(&mut self, input: InputRecord) {
        self.inputs.push(input);
    }

    /// Record a produced artifact version.
    pub fn add_output(&mut self, qualified_name: impl Into<String>) {
        self.outputs.push(qualified_name.into());
    }

    /// Record a metric. The summary keeps the last value per key.
    pub fn log_metric(&mut self, metric: MetricRecord) {
        self.summary.insert(metric.key().to_string(), metric.value());
        self.metrics.push(metric);
    }
}

/// Builder for `RunRecord`.
#[derive(Debug)]
pub struct RunRecordBuilder {
    run_id: String,
    project: String,
    job_type: String,
    config: serde_json::Value,
}

impl RunRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        project: impl Into<String>,
        job_type: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            project: project.into(),
            job_type: job_type.into(),
            config: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the configuration snapshot.
    #[must_use]
    pub fn config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    /// Build the `RunRecord`.
    #[must_use]
    pub fn build(self) -> RunRecord {
        RunRecord {
            run_id: self.run_id,
            project: self.project,
            job_type: self.job_type,
            config: self.config,
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            metrics: Vec::new(),
            summary: BTreeMap::new(),
        }
    }
}
