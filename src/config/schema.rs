//! Buildpack descriptor schema
//!
//! Mirrors the parts of `buildpack.toml` this buildpack reads:
//! identity, supported stacks, configurations and dependencies.

use crate::dependency::BuildpackDependency;
use serde::{Deserialize, Serialize};

/// Root of `buildpack.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackDescriptor {
    /// Buildpack API version
    pub api: String,

    /// Buildpack identity
    pub buildpack: BuildpackInfo,

    /// Stacks the buildpack declares support for
    pub stacks: Vec<Stack>,

    /// Free-form metadata section
    pub metadata: BuildpackMetadata,
}

/// `[buildpack]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub homepage: Option<String>,
}

/// `[[stacks]]` entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stack {
    pub id: String,
}

/// `[metadata]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackMetadata {
    /// Environment-driven configuration options
    pub configurations: Vec<Configuration>,

    /// Downloadable dependencies
    pub dependencies: Vec<BuildpackDependency>,
}

/// `[[metadata.configurations]]` entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Environment variable name
    pub name: String,

    /// Value used when the variable is not set
    pub default: Option<String>,

    /// Human-readable description
    pub description: String,

    /// Applies at build time
    pub build: bool,

    /// Applies at launch time
    pub launch: bool,
}

impl BuildpackDescriptor {
    /// Parse a descriptor from TOML content
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
