//! Syft JSON software bill of materials
//!
//! Layers describe what they installed with a Syft document written next to
//! the layer as `<name>.sbom.syft.json`. Only the fields downstream tooling
//! reads are modelled.

use crate::error::{BuildpackError, BuildpackResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

const SCHEMA_VERSION: &str = "1.1.0";
const SCHEMA_URL: &str =
    "https://raw.githubusercontent.com/anchore/syft/main/schema/json/schema-1.1.0.json";

/// One package found in a layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyftArtifact {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "foundBy")]
    pub found_by: String,
    pub locations: Vec<SyftLocation>,
    pub licenses: Vec<String>,
    pub cpes: Vec<String>,
    pub purl: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyftLocation {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyftSource {
    #[serde(rename = "Type")]
    pub kind: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyftDescriptor {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyftSchema {
    pub version: String,
    #[serde(rename = "URL")]
    pub url: String,
}

/// A complete Syft document for one installed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyftDocument {
    pub artifacts: Vec<SyftArtifact>,
    pub source: SyftSource,
    pub descriptor: SyftDescriptor,
    pub schema: SyftSchema,
}

impl SyftDocument {
    /// Describe `artifacts` found under the directory `target`
    pub fn new(target: &Path, artifacts: Vec<SyftArtifact>) -> Self {
        Self {
            artifacts,
            source: SyftSource {
                kind: "directory".to_string(),
                target: target.display().to_string(),
            },
            descriptor: SyftDescriptor {
                name: "none".to_string(),
                version: "none".to_string(),
            },
            schema: SyftSchema {
                version: SCHEMA_VERSION.to_string(),
                url: SCHEMA_URL.to_string(),
            },
        }
    }

    /// Serialize and write the document
    pub async fn write_to(&self, path: &Path) -> BuildpackResult<()> {
        let content = serde_json::to_vec(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| BuildpackError::SbomWrite {
                path: path.to_path_buf(),
                source: e,
            })
    }
}
