//! Artifact Record - manifest of one immutable artifact version

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shape of the content an artifact version wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// A single file (datasets).
    File,
    /// A directory tree (model bundles).
    Directory,
}

/// Upload state of an artifact version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitState {
    /// Registered, content upload not yet confirmed.
    Pending,
    /// Content durably stored and verified.
    Committed,
}

/// Artifact Record represents one version of a named artifact.
///
/// Versions are numbered from 1 and never reused. Content is addressed by
/// `cas_hash`, which is only known once the upload commits.
///
/// ## CAS Hash Format
///
/// The `cas_hash` follows the format: `algorithm:hex_digest`, e.g.
/// `sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactRecord {
    name: String,
    version: u32,
    artifact_type: String,
    description: String,
    kind: ArtifactKind,
    file_name: String,
    state: CommitState,
    cas_hash: Option<String>,
    size_bytes: u64,
    producer_run_id: String,
    created_at: DateTime<Utc>,
    committed_at: Option<DateTime<Utc>>,
}

impl ArtifactRecord {
    /// Create a new pending artifact record.
    ///
    /// # Arguments
    ///
    /// * `name` - Artifact name (e.g., "clean_sample.csv")
    /// * `version` - Version number assigned by the registry
    /// * `artifact_type` - Free-form type label (e.g., "clean_sample")
    /// * `description` - Human-readable description
    /// * `kind` - File or directory content
    /// * `file_name` - Name of the wrapped file or directory inside the version
    /// * `producer_run_id` - ID of the run that published it
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: u32,
        artifact_type: impl Into<String>,
        description: impl Into<String>,
        kind: ArtifactKind,
        file_name: impl Into<String>,
        producer_run_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            artifact_type: artifact_type.into(),
            description: description.into(),
            kind,
            file_name: file_name.into(),
            state: CommitState::Pending,
            cas_hash: None,
            size_bytes: 0,
            producer_run_id: producer_run_id.into(),
            created_at: Utc::now(),
            committed_at: None,
        }
    }

    /// Get the artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the version number.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Pinned reference for this version, `name:vN`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}:v{}", self.name, self.version)
    }

    /// Get the artifact type label.
    #[must_use]
    pub fn artifact_type(&self) -> &str {
        &self.artifact_type
    }

    /// Get the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the content kind.
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Name of the wrapped file or directory.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Get the upload state.
    #[must_use]
    pub const fn state(&self) -> CommitState {
        self.state
    }

    /// True once the content upload has been verified.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.state == CommitState::Committed
    }

    /// Get the content-addressable hash, once committed.
    #[must_use]
    pub fn cas_hash(&self) -> Option<&str> {
        self.cas_hash.as_deref()
    }

    /// Get the content size in bytes (0 until committed).
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// ID of the run that published this version.
    #[must_use]
    pub fn producer_run_id(&self) -> &str {
        &self.producer_run_id
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the commit timestamp.
    #[must_use]
    pub const fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.committed_at
    }

    /// Mark the version as committed with its verified content hash and size.
    pub fn commit(&mut self, cas_hash: impl Into<String>, size_bytes: u64) {
        self.state = CommitState::Committed;
        self.cas_hash = Some(cas_hash.into());
        self.size_bytes = size_bytes;
        self.committed_at = Some(Utc::now());
    }
}
