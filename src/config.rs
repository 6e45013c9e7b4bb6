//! Registry configuration
//!
//! The registry location and credentials come from the process environment,
//! never from stage flags. Binaries load a `.env` file first when present.

use std::path::PathBuf;

/// Environment variable naming the registry root directory.
pub const REGISTRY_DIR_VAR: &str = "PIPELINE_REGISTRY_DIR";
/// Environment variable naming the project namespace.
pub const PROJECT_VAR: &str = "PIPELINE_PROJECT";
/// Environment variable carrying the registry access key.
pub const API_KEY_VAR: &str = "PIPELINE_API_KEY";

/// Default registry root, relative to the working directory.
pub const DEFAULT_REGISTRY_DIR: &str = "registry";
/// Default project namespace.
pub const DEFAULT_PROJECT: &str = "default";

/// Where the artifact registry lives and how to authenticate to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    root: PathBuf,
    project: String,
    api_key: Option<String>,
}

impl RegistryConfig {
    /// Create a config for the given registry root with the default project
    /// and no credentials.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            project: DEFAULT_PROJECT.to_string(),
            api_key: None,
        }
    }

    /// Resolve the config from `PIPELINE_REGISTRY_DIR`, `PIPELINE_PROJECT`
    /// and `PIPELINE_API_KEY`, falling back to defaults for unset variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            root: non_empty(REGISTRY_DIR_VAR)
                .map_or_else(|| PathBuf::from(DEFAULT_REGISTRY_DIR), PathBuf::from),
            project: non_empty(PROJECT_VAR).unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
            api_key: non_empty(API_KEY_VAR),
        }
    }

    /// Set the project namespace.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Set the access key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Registry root directory.
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Project namespace.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Access key, if configured.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}
