//! Artifact registry
//!
//! Stages never touch artifact storage directly. They go through a
//! [`RunContext`], which forwards to an [`ArtifactRegistry`] backend and
//! records every version consumed and produced on the run's record.
//!
//! ```text
//!   stage ──> RunContext ──> ArtifactRegistry (LocalRegistry, ...)
//!                 │
//!                 └── RunRecord { inputs, outputs, summary }
//! ```
//!
//! Publishing is split in two: [`ArtifactRegistry::publish`] registers a new
//! pending version and starts the upload, [`ArtifactRegistry::await_commit`]
//! blocks until the upload is verified. Only committed versions resolve.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rental_pipeline::config::RegistryConfig;
//! use rental_pipeline::registry::RunContext;
//!
//! # fn main() -> rental_pipeline::Result<()> {
//! let config = RegistryConfig::from_env();
//! let mut run = RunContext::initialize(&config, "basic_cleaning", &serde_json::json!({}))?;
//!
//! let path = run.resolve("sample.csv:latest")?;
//! let handle = run.publish("copy.csv", "raw_data", "verbatim copy", &path)?;
//! run.await_commit(handle)?;
//! run.finish()?;
//! # Ok(())
//! # }
//! ```

mod digest;
mod local;
mod reference;
mod run;

pub use digest::{copy_content, digest_path, ContentDigest};
pub use local::LocalRegistry;
pub use reference::{validate_name, ArtifactReference, VersionSelector};
pub use run::RunContext;

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use crate::experiment::{ArtifactKind, ArtifactRecord, RunRecord};
use crate::{Error, Result};

/// A committed artifact version materialized on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    path: PathBuf,
    record: ArtifactRecord,
}

impl ResolvedArtifact {
    /// Create a resolved artifact.
    #[must_use]
    pub const fn new(path: PathBuf, record: ArtifactRecord) -> Self {
        Self { path, record }
    }

    /// Local path of the file, or of the bundle root for directories.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Manifest of the resolved version.
    #[must_use]
    pub const fn record(&self) -> &ArtifactRecord {
        &self.record
    }
}

/// What to publish.
#[derive(Debug, Clone, Copy)]
pub struct PublishRequest<'a> {
    /// Artifact name.
    pub name: &'a str,
    /// Free-form type label.
    pub artifact_type: &'a str,
    /// Human-readable description.
    pub description: &'a str,
    /// Local file or directory to wrap.
    pub local_path: &'a Path,
    /// Run that produces the version.
    pub run_id: &'a str,
}

/// A registered, possibly still uploading, artifact version.
///
/// Dropping a handle without passing it to
/// [`ArtifactRegistry::await_commit`] leaves the version pending, and pending
/// versions never resolve.
#[derive(Debug)]
pub struct ArtifactHandle {
    record: ArtifactRecord,
    upload: JoinHandle<Result<ContentDigest>>,
}

impl ArtifactHandle {
    /// Wrap a pending record and the upload computing its digest.
    #[must_use]
    pub const fn new(record: ArtifactRecord, upload: JoinHandle<Result<ContentDigest>>) -> Self {
        Self { record, upload }
    }

    /// Pending manifest of the version.
    #[must_use]
    pub const fn record(&self) -> &ArtifactRecord {
        &self.record
    }

    /// Block until the upload finishes.
    ///
    /// # Errors
    ///
    /// Returns the upload's error, or [`Error::PublishError`] if the upload
    /// thread panicked.
    pub fn join(self) -> Result<(ArtifactRecord, ContentDigest)> {
        let digest = self.upload.join().map_err(|_| {
            Error::PublishError(format!(
                "upload of {} aborted",
                self.record.qualified_name()
            ))
        })??;
        Ok((self.record, digest))
    }
}

/// Capability interface of an artifact registry backend.
///
/// Implementations must keep versions monotonic per name and must only
/// resolve versions whose upload has been committed.
pub trait ArtifactRegistry {
    /// Project namespace this registry handle is bound to.
    fn project(&self) -> &str;

    /// Resolve a single-file artifact to a local path.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for unknown names/versions/aliases or when the
    /// reference names a directory artifact, [`Error::DownloadError`] when
    /// the content cannot be materialized.
    fn resolve(&self, reference: &ArtifactReference) -> Result<ResolvedArtifact> {
        self.resolve_kind(reference, ArtifactKind::File)
    }

    /// Resolve a directory (model bundle) artifact to its root path.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for unknown references and for single-file
    /// artifacts, which are not bundles. [`Error::DownloadError`] as for
    /// [`ArtifactRegistry::resolve`].
    fn resolve_model(&self, reference: &ArtifactReference) -> Result<ResolvedArtifact> {
        self.resolve_kind(reference, ArtifactKind::Directory)
    }

    /// Resolve a reference, requiring the given content kind.
    ///
    /// # Errors
    ///
    /// Same as [`ArtifactRegistry::resolve`].
    fn resolve_kind(
        &self,
        reference: &ArtifactReference,
        kind: ArtifactKind,
    ) -> Result<ResolvedArtifact>;

    /// Register a new version wrapping `request.local_path` and start its
    /// upload. A new version is created even for byte-identical content.
    ///
    /// # Errors
    ///
    /// [`Error::PublishError`] when the version cannot be registered.
    fn publish(&self, request: PublishRequest<'_>) -> Result<ArtifactHandle>;

    /// Block until the upload behind `handle` is durable and mark the
    /// version committed.
    ///
    /// # Errors
    ///
    /// [`Error::PublishError`] when the upload failed or cannot be verified.
    fn await_commit(&self, handle: ArtifactHandle) -> Result<ArtifactRecord>;

    /// Point `alias` at a committed version.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the version is not committed,
    /// [`Error::InvalidReference`] for reserved or malformed aliases.
    fn tag(&self, name: &str, version: u32, alias: &str) -> Result<()>;

    /// All versions of `name`, pending ones included, ordered by version.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when no version of `name` exists.
    fn list_versions(&self, name: &str) -> Result<Vec<ArtifactRecord>>;

    /// Persist a run record.
    ///
    /// # Errors
    ///
    /// Any storage failure.
    fn write_run(&self, run: &RunRecord) -> Result<()>;
}
