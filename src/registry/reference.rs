//! Artifact reference parsing
//!
//! Grammar: `[entity/project/]name[:selector]` where selector is `latest`,
//! `v<N>` (N >= 1), or any other alias. A missing selector means `latest`.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Which version of an artifact a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionSelector {
    /// Highest committed version.
    Latest,
    /// A specific version number.
    Version(u32),
    /// A named alias such as `prod` or `reference`.
    Alias(String),
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Version(v) => write!(f, "v{v}"),
            Self::Alias(a) => write!(f, "{a}"),
        }
    }
}

/// A parsed artifact reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactReference {
    scope: Option<String>,
    name: String,
    selector: VersionSelector,
}

impl ArtifactReference {
    /// Parse a reference string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] for an empty name, an empty
    /// selector, `v0`, or a name that is not a plain file name.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let invalid = || Error::InvalidReference(raw.to_string());

        let (scope, rest) = match raw.rfind('/') {
            Some(idx) => (Some(raw[..idx].to_string()), &raw[idx + 1..]),
            None => (None, raw),
        };

        let (name, selector) = match rest.rfind(':') {
            Some(idx) => {
                let tag = &rest[idx + 1..];
                if tag.is_empty() {
                    return Err(invalid());
                }
                (&rest[..idx], parse_selector(tag).ok_or_else(invalid)?)
            }
            None => (rest, VersionSelector::Latest),
        };

        validate_name(name).map_err(|_| invalid())?;

        Ok(Self {
            scope: scope.filter(|s| !s.is_empty()),
            name: name.to_string(),
            selector,
        })
    }

    /// Reference to an exact version.
    #[must_use]
    pub fn pinned(name: impl Into<String>, version: u32) -> Self {
        Self {
            scope: None,
            name: name.into(),
            selector: VersionSelector::Version(version),
        }
    }

    /// Optional `entity/project` prefix, as written.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version selector.
    #[must_use]
    pub const fn selector(&self) -> &VersionSelector {
        &self.selector
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.scope {
            write!(f, "{scope}/")?;
        }
        write!(f, "{}:{}", self.name, self.selector)
    }
}

impl FromStr for ArtifactReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_selector(tag: &str) -> Option<VersionSelector> {
    if tag == "latest" {
        return Some(VersionSelector::Latest);
    }
    if let Some(digits) = tag.strip_prefix('v') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return match digits.parse::<u32>() {
                Ok(0) | Err(_) => None,
                Ok(v) => Some(VersionSelector::Version(v)),
            };
        }
    }
    Some(VersionSelector::Alias(tag.to_string()))
}

/// Check that an artifact name is usable as a single path component.
///
/// # Errors
///
/// Returns [`Error::InvalidReference`] when the name is empty, starts with a
/// dot, or contains a path separator or `:`.
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', ':'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(Error::InvalidReference(name.to_string()));
    }
    Ok(())
}
