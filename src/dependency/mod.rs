//! Buildpack dependencies
//!
//! A dependency is a downloadable artifact declared in `buildpack.toml`.
//! The resolver picks one entry for the requested id, stack and version;
//! the cache turns that entry into a verified file on disk.

pub mod cache;
pub mod resolve;

pub use cache::DependencyCache;
pub use resolve::DependencyResolver;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `[[metadata.dependencies]]` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackDependency {
    /// Dependency id, e.g. `starknet-foundry-gnu`
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Dependency version
    pub version: String,

    /// Download location (`https://`, `http://` or `file://`)
    pub uri: String,

    /// Expected SHA-256 of the artifact, hex encoded
    pub sha256: String,

    /// Stacks this artifact runs on (`*` for any)
    pub stacks: Vec<String>,

    /// Licenses of the artifact
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<DependencyLicense>,

    /// CPE identifiers
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cpes: Vec<String>,

    /// Package URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
}

/// License declared for a dependency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyLicense {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl BuildpackDependency {
    /// The dependency as a TOML table, used as layer metadata
    pub fn as_metadata(&self) -> Result<toml::Table, toml::ser::Error> {
        toml::Table::try_from(self)
    }

    /// File name of the artifact, taken from the last URI segment
    pub fn artifact_name(&self) -> &str {
        let path = self.uri.split(['?', '#']).next().unwrap_or(&self.uri);
        match path.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => "artifact",
        }
    }

    /// Whether this dependency can run on the given stack
    pub fn supports_stack(&self, stack: &str) -> bool {
        self.stacks.iter().any(|s| s == "*" || s == stack)
    }
}

impl fmt::Display for BuildpackDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}
