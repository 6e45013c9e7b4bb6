//! Run context - the process-scoped session a stage works through

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{ArtifactHandle, ArtifactReference, ArtifactRegistry, LocalRegistry, PublishRequest};
use crate::config::RegistryConfig;
use crate::experiment::{ArtifactRecord, InputRecord, MetricRecord, RunRecord, RunStatus};
use crate::Result;

/// Session binding one stage execution to the registry.
///
/// Every artifact resolved through the context is recorded with the exact
/// version it resolved to; every committed publish is recorded as an output.
/// Metrics are buffered and persisted when the run is closed, either by
/// [`RunContext::finish`] or, on an error path, when the context is dropped
/// (the run is then persisted as [`RunStatus::Failed`]).
#[derive(Debug)]
pub struct RunContext<R: ArtifactRegistry = LocalRegistry> {
    registry: R,
    record: RunRecord,
    closed: bool,
}

impl RunContext<LocalRegistry> {
    /// Connect to the registry described by `config` and start a run.
    ///
    /// # Errors
    ///
    /// [`crate::Error::ConnectionError`] / [`crate::Error::AuthError`] from
    /// the registry, or a JSON error if `params` cannot be snapshotted.
    pub fn initialize<P: Serialize + ?Sized>(
        config: &RegistryConfig,
        job_type: &str,
        params: &P,
    ) -> Result<Self> {
        let registry = LocalRegistry::connect(config)?;
        Self::with_registry(registry, job_type, serde_json::to_value(params)?)
    }
}

impl<R: ArtifactRegistry> RunContext<R> {
    /// Start a run on an already connected registry.
    ///
    /// # Errors
    ///
    /// Currently infallible for in-process backends; kept fallible so remote
    /// backends can reject the run.
    pub fn with_registry(registry: R, job_type: &str, config: serde_json::Value) -> Result<Self> {
        let run_id = Uuid::new_v4().to_string();
        let mut record = RunRecord::builder(&run_id, registry.project(), job_type)
            .config(config)
            .build();
        record.start();

        info!(run_id = %run_id, job_type, project = registry.project(), "run started");
        Ok(Self {
            registry,
            record,
            closed: false,
        })
    }

    /// Run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.record.run_id()
    }

    /// In-progress run record.
    #[must_use]
    pub const fn record(&self) -> &RunRecord {
        &self.record
    }

    /// Underlying registry backend.
    #[must_use]
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    /// Resolve a single-file artifact and record the version used.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidReference`], [`crate::Error::NotFound`] or
    /// [`crate::Error::DownloadError`].
    pub fn resolve(&mut self, reference: &str) -> Result<PathBuf> {
        let parsed = ArtifactReference::parse(reference)?;
        let resolved = self.registry.resolve(&parsed)?;
        self.note_input(reference, resolved.record());
        Ok(resolved.path().to_path_buf())
    }

    /// Resolve a model bundle and record the version used. Returns the
    /// bundle's root directory.
    ///
    /// # Errors
    ///
    /// Same as [`RunContext::resolve`].
    pub fn resolve_model(&mut self, reference: &str) -> Result<PathBuf> {
        let parsed = ArtifactReference::parse(reference)?;
        let resolved = self.registry.resolve_model(&parsed)?;
        self.note_input(reference, resolved.record());
        Ok(resolved.path().to_path_buf())
    }

    fn note_input(&mut self, requested: &str, record: &ArtifactRecord) {
        info!(
            requested,
            resolved = %record.qualified_name(),
            cas_hash = record.cas_hash().unwrap_or_default(),
            "using artifact"
        );
        self.record.add_input(InputRecord::new(
            requested,
            record.name(),
            record.version(),
            record.cas_hash().unwrap_or_default(),
        ));
    }

    /// Register a new artifact version wrapping `local_path`. The upload runs
    /// in the background until [`RunContext::await_commit`].
    ///
    /// # Errors
    ///
    /// [`crate::Error::PublishError`] or [`crate::Error::InvalidReference`].
    pub fn publish(
        &mut self,
        name: &str,
        artifact_type: &str,
        description: &str,
        local_path: &Path,
    ) -> Result<ArtifactHandle> {
        let handle = self.registry.publish(PublishRequest {
            name,
            artifact_type,
            description,
            local_path,
            run_id: self.record.run_id(),
        })?;
        info!(artifact = %handle.record().qualified_name(), "artifact registered");
        Ok(handle)
    }

    /// Block until the upload behind `handle` is durable and record the
    /// version as an output of this run.
    ///
    /// # Errors
    ///
    /// [`crate::Error::PublishError`].
    pub fn await_commit(&mut self, handle: ArtifactHandle) -> Result<ArtifactRecord> {
        let record = self.registry.await_commit(handle)?;
        self.record.add_output(record.qualified_name());
        Ok(record)
    }

    /// Write a scalar to the run summary. Repeated keys keep the last value.
    /// Persisted when the run is closed.
    pub fn record_metric(&mut self, name: &str, value: f64) {
        info!(metric = name, value, "metric recorded");
        self.record
            .log_metric(MetricRecord::new(self.record.run_id(), name, value));
    }

    /// Close the run as successful and persist its record.
    ///
    /// # Errors
    ///
    /// Any failure writing the run record.
    pub fn finish(mut self) -> Result<RunRecord> {
        self.close(RunStatus::Success)?;
        Ok(self.record.clone())
    }

    fn close(&mut self, status: RunStatus) -> Result<()> {
        self.closed = true;
        self.record.complete(status);
        self.registry.write_run(&self.record)?;
        info!(run_id = self.record.run_id(), status = ?status, "run closed");
        Ok(())
    }
}

impl<R: ArtifactRegistry> Drop for RunContext<R> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        warn!(run_id = self.record.run_id(), "run dropped before finish, marking failed");
        if let Err(e) = self.close(RunStatus::Failed) {
            error!(run_id = self.record.run_id(), error = %e, "could not persist failed run");
        }
    }
}
