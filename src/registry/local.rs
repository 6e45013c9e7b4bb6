//! Filesystem registry backend
//!
//! Layout under `<root>/<project>/`:
//!
//! ```text
//! artifacts/<name>/v<N>/manifest.json   ArtifactRecord
//! artifacts/<name>/v<N>/content/<file>  wrapped file or directory
//! artifacts/<name>/aliases.json         alias -> version
//! runs/<run_id>.json                    RunRecord
//! ```
//!
//! `<root>/.access_key`, when present, must match the configured API key.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::digest::{copy_content, digest_path};
use super::{
    validate_name, ArtifactHandle, ArtifactReference, ArtifactRegistry, PublishRequest,
    ResolvedArtifact, VersionSelector,
};
use crate::config::RegistryConfig;
use crate::experiment::{ArtifactKind, ArtifactRecord, RunRecord};
use crate::{Error, Result};

const MANIFEST_FILE: &str = "manifest.json";
const CONTENT_DIR: &str = "content";
const ALIASES_FILE: &str = "aliases.json";
const ACCESS_KEY_FILE: &str = ".access_key";

/// Attempts at claiming a fresh version directory when racing other publishers.
const MAX_VERSION_CLAIMS: usize = 64;

/// Artifact registry stored in a local directory tree.
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    project: String,
    project_dir: PathBuf,
}

impl LocalRegistry {
    /// Open (creating if needed) the registry described by `config`.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionError`] when the root is not a usable directory,
    /// [`Error::AuthError`] when the registry requires a key that was not
    /// supplied or does not match.
    pub fn connect(config: &RegistryConfig) -> Result<Self> {
        let root = config.root();
        if root.exists() && !root.is_dir() {
            return Err(Error::ConnectionError(format!(
                "registry root {} is not a directory",
                root.display()
            )));
        }

        validate_name(config.project()).map_err(|_| {
            Error::ConnectionError(format!("invalid project name '{}'", config.project()))
        })?;

        check_access_key(root, config.api_key())?;

        let project_dir = root.join(config.project());
        for dir in [project_dir.join("artifacts"), project_dir.join("runs")] {
            fs::create_dir_all(&dir).map_err(|e| {
                Error::ConnectionError(format!("cannot open {}: {e}", dir.display()))
            })?;
        }

        debug!(root = %root.display(), project = config.project(), "registry connected");
        Ok(Self {
            project: config.project().to_string(),
            project_dir,
        })
    }

    /// Directory holding the project's artifacts and runs.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Load a persisted run record.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when no run with that ID was written.
    pub fn read_run(&self, run_id: &str) -> Result<RunRecord> {
        let path = self.run_path(run_id);
        let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::NotFound(format!("run {run_id}")),
            _ => Error::Io(e),
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    fn artifact_dir(&self, name: &str) -> PathBuf {
        self.project_dir.join("artifacts").join(name)
    }

    fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.artifact_dir(name).join(format!("v{version}"))
    }

    fn content_path(&self, record: &ArtifactRecord) -> PathBuf {
        self.version_dir(record.name(), record.version())
            .join(CONTENT_DIR)
            .join(record.file_name())
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.project_dir.join("runs").join(format!("{run_id}.json"))
    }

    /// Version numbers present on disk, ascending. Directories that are not
    /// `v<N>` are ignored.
    fn version_numbers(&self, name: &str) -> Result<Vec<u32>> {
        let dir = self.artifact_dir(name);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions: Vec<u32> = entries
            .filter_map(std::result::Result::ok)
            .filter_map(|e| {
                e.file_name()
                    .to_str()
                    .and_then(|s| s.strip_prefix('v'))
                    .and_then(|s| s.parse::<u32>().ok())
            })
            .collect();
        versions.sort_unstable();
        Ok(versions)
    }

    fn read_manifest(&self, name: &str, version: u32) -> Result<Option<ArtifactRecord>> {
        let path = self.version_dir(name, version).join(MANIFEST_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            // A version directory claimed by a publisher that has not yet
            // written its manifest
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_manifest(&self, record: &ArtifactRecord) -> Result<()> {
        let dir = self.version_dir(record.name(), record.version());
        write_json_atomic(&dir.join(MANIFEST_FILE), record)
    }

    fn read_aliases(&self, name: &str) -> Result<BTreeMap<String, u32>> {
        let path = self.artifact_dir(name).join(ALIASES_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn committed(&self, name: &str, version: u32) -> Result<Option<ArtifactRecord>> {
        Ok(self
            .read_manifest(name, version)?
            .filter(ArtifactRecord::is_committed))
    }

    fn select(&self, reference: &ArtifactReference) -> Result<ArtifactRecord> {
        let name = reference.name();
        let not_found = || Error::NotFound(reference.to_string());

        match reference.selector() {
            VersionSelector::Version(v) => self.committed(name, *v)?.ok_or_else(not_found),
            VersionSelector::Alias(alias) => {
                let version = *self.read_aliases(name)?.get(alias).ok_or_else(not_found)?;
                self.committed(name, version)?.ok_or_else(not_found)
            }
            VersionSelector::Latest => {
                for version in self.version_numbers(name)?.into_iter().rev() {
                    if let Some(record) = self.committed(name, version)? {
                        return Ok(record);
                    }
                }
                Err(not_found())
            }
        }
    }

    /// Claim the next free version directory. `create_dir` is the arbiter
    /// between concurrent publishers of the same name.
    fn claim_version(&self, name: &str) -> Result<u32> {
        fs::create_dir_all(self.artifact_dir(name))
            .map_err(|e| Error::PublishError(format!("cannot create artifact {name}: {e}")))?;

        for _ in 0..MAX_VERSION_CLAIMS {
            let next = self.version_numbers(name)?.last().map_or(1, |v| v + 1);
            match fs::create_dir(self.version_dir(name, next)) {
                Ok(()) => return Ok(next),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(Error::PublishError(format!(
                        "cannot allocate version of {name}: {e}"
                    )))
                }
            }
        }
        Err(Error::PublishError(format!(
            "gave up allocating a version of {name} after {MAX_VERSION_CLAIMS} attempts"
        )))
    }
}

impl ArtifactRegistry for LocalRegistry {
    fn project(&self) -> &str {
        &self.project
    }

    fn resolve_kind(
        &self,
        reference: &ArtifactReference,
        kind: ArtifactKind,
    ) -> Result<ResolvedArtifact> {
        let record = self.select(reference)?;
        if record.kind() != kind {
            return Err(Error::NotFound(format!(
                "{} is a {:?} artifact, expected {kind:?}",
                record.qualified_name(),
                record.kind()
            )));
        }

        let path = self.content_path(&record);
        let digest = digest_path(&path).map_err(|e| {
            Error::DownloadError(format!("{}: {e}", record.qualified_name()))
        })?;
        if Some(digest.cas_hash.as_str()) != record.cas_hash() {
            return Err(Error::DownloadError(format!(
                "{} content does not match its manifest digest",
                record.qualified_name()
            )));
        }

        debug!(reference = %reference, resolved = %record.qualified_name(), "artifact resolved");
        Ok(ResolvedArtifact::new(path, record))
    }

    fn publish(&self, request: PublishRequest<'_>) -> Result<ArtifactHandle> {
        validate_name(request.name)?;

        let source = request.local_path.to_path_buf();
        let kind = if source.is_dir() {
            ArtifactKind::Directory
        } else if source.is_file() {
            ArtifactKind::File
        } else {
            return Err(Error::PublishError(format!(
                "{} does not exist",
                source.display()
            )));
        };
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .map_or_else(|| request.name.to_string(), ToString::to_string);

        let version = self.claim_version(request.name)?;
        let record = ArtifactRecord::new(
            request.name,
            version,
            request.artifact_type,
            request.description,
            kind,
            file_name,
            request.run_id,
        );
        self.write_manifest(&record)
            .map_err(|e| Error::PublishError(format!("{}: {e}", record.qualified_name())))?;

        let dest = self.content_path(&record);
        let label = record.qualified_name();
        let upload = std::thread::spawn(move || {
            let expected = digest_path(&source)
                .map_err(|e| Error::PublishError(format!("{label}: reading source: {e}")))?;
            copy_content(&source, &dest)
                .map_err(|e| Error::PublishError(format!("{label}: uploading: {e}")))?;
            let stored = digest_path(&dest)
                .map_err(|e| Error::PublishError(format!("{label}: verifying: {e}")))?;
            if stored != expected {
                return Err(Error::PublishError(format!(
                    "{label}: stored content does not match source"
                )));
            }
            Ok(stored)
        });

        debug!(artifact = %record.qualified_name(), "upload started");
        Ok(ArtifactHandle::new(record, upload))
    }

    fn await_commit(&self, handle: ArtifactHandle) -> Result<ArtifactRecord> {
        let (mut record, digest) = handle.join()?;
        record.commit(digest.cas_hash, digest.size_bytes);
        self.write_manifest(&record)
            .map_err(|e| Error::PublishError(format!("{}: {e}", record.qualified_name())))?;

        info!(
            artifact = %record.qualified_name(),
            cas_hash = record.cas_hash().unwrap_or_default(),
            size_bytes = record.size_bytes(),
            "artifact committed"
        );
        Ok(record)
    }

    fn tag(&self, name: &str, version: u32, alias: &str) -> Result<()> {
        let reserved = alias == "latest"
            || matches!(
                ArtifactReference::parse(&format!("{name}:{alias}")).map(|r| r.selector().clone()),
                Ok(VersionSelector::Version(_)) | Err(_)
            );
        if reserved || alias.contains('/') {
            return Err(Error::InvalidReference(format!("{name}:{alias}")));
        }

        if self.committed(name, version)?.is_none() {
            return Err(Error::NotFound(format!("{name}:v{version}")));
        }

        let mut aliases = self.read_aliases(name)?;
        aliases.insert(alias.to_string(), version);
        write_json_atomic(&self.artifact_dir(name).join(ALIASES_FILE), &aliases)?;

        info!(artifact = name, version, alias, "alias updated");
        Ok(())
    }

    fn list_versions(&self, name: &str) -> Result<Vec<ArtifactRecord>> {
        let mut records = Vec::new();
        for version in self.version_numbers(name)? {
            if let Some(record) = self.read_manifest(name, version)? {
                records.push(record);
            }
        }
        if records.is_empty() {
            return Err(Error::NotFound(name.to_string()));
        }
        Ok(records)
    }

    fn write_run(&self, run: &RunRecord) -> Result<()> {
        write_json_atomic(&self.run_path(run.run_id()), run)?;
        debug!(run_id = run.run_id(), status = ?run.status(), "run record written");
        Ok(())
    }
}

fn check_access_key(root: &Path, supplied: Option<&str>) -> Result<()> {
    let required = match fs::read_to_string(root.join(ACCESS_KEY_FILE)) {
        Ok(key) => key.trim().to_string(),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(Error::ConnectionError(format!(
                "cannot read registry access key: {e}"
            )))
        }
    };

    match supplied {
        Some(key) if key == required => Ok(()),
        Some(_) => Err(Error::AuthError("access key rejected".to_string())),
        None => Err(Error::AuthError(format!(
            "registry requires an access key ({})",
            crate::config::API_KEY_VAR
        ))),
    }
}

/// Write JSON to a sibling temp file and rename it into place so readers
/// never observe a half-written document.
fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
