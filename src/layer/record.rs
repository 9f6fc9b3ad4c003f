//! Layer directories and their `<name>.toml` records

use crate::error::{BuildpackError, BuildpackResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Layer visibility flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerTypes {
    /// Visible to subsequent buildpacks during the build
    pub build: bool,

    /// Exported into the launch image
    pub launch: bool,

    /// Restored on the next build
    pub cache: bool,
}

/// Contents of `<layers>/<name>.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerRecord {
    pub types: LayerTypes,
    pub metadata: toml::Table,
}

/// SBOM formats a layer can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SbomFormat {
    CycloneDxJson,
    SpdxJson,
    SyftJson,
}

impl SbomFormat {
    /// File extension used in `<name>.sbom.<ext>`
    pub fn extension(&self) -> &'static str {
        match self {
            Self::CycloneDxJson => "cdx.json",
            Self::SpdxJson => "spdx.json",
            Self::SyftJson => "syft.json",
        }
    }

    fn all() -> &'static [Self] {
        &[Self::CycloneDxJson, Self::SpdxJson, Self::SyftJson]
    }
}

/// A layer in the layers directory
#[derive(Debug, Clone)]
pub struct Layer {
    /// Layer name
    pub name: String,

    /// Layer content directory
    pub path: PathBuf,

    /// Record restored from the previous build, or set by a contribution
    pub record: Option<LayerRecord>,

    layers_dir: PathBuf,
}

/// Reject names that would escape the layers directory
fn validate_layer_name(name: &str) -> BuildpackResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !matches!(name, "launch" | "build" | "store");
    if valid {
        Ok(())
    } else {
        Err(BuildpackError::Internal(format!(
            "invalid layer name '{}'",
            name
        )))
    }
}

impl Layer {
    /// Load a layer, reading its record if the previous build left one
    pub async fn load(layers_dir: &Path, name: &str) -> BuildpackResult<Self> {
        validate_layer_name(name)?;

        let mut layer = Self {
            name: name.to_string(),
            path: layers_dir.join(name),
            record: None,
            layers_dir: layers_dir.to_path_buf(),
        };

        let record_path = layer.record_path();
        match tokio::fs::read_to_string(&record_path).await {
            Ok(content) => {
                debug!("Restored layer record {}", record_path.display());
                layer.record = Some(toml::from_str(&content)?);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(BuildpackError::io(
                    format!("reading layer record {}", record_path.display()),
                    e,
                ))
            }
        }

        Ok(layer)
    }

    /// Path of `<layers>/<name>.toml`
    pub fn record_path(&self) -> PathBuf {
        self.layers_dir.join(format!("{}.toml", self.name))
    }

    /// Path of `<layers>/<name>.sbom.<ext>`
    pub fn sbom_path(&self, format: SbomFormat) -> PathBuf {
        self.layers_dir
            .join(format!("{}.sbom.{}", self.name, format.extension()))
    }

    /// Wipe the layer: empty directory, no SBOMs, no record
    pub async fn reset(&mut self) -> BuildpackResult<()> {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(BuildpackError::io(
                    format!("removing layer {}", self.path.display()),
                    e,
                ))
            }
        }
        tokio::fs::create_dir_all(&self.path).await.map_err(|e| {
            BuildpackError::io(format!("creating layer {}", self.path.display()), e)
        })?;

        let mut stale: Vec<PathBuf> = SbomFormat::all().iter().map(|f| self.sbom_path(*f)).collect();
        stale.push(self.record_path());
        for path in stale {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(BuildpackError::io(
                        format!("removing {}", path.display()),
                        e,
                    ))
                }
            }
        }

        self.record = None;
        Ok(())
    }

    /// Write the layer record. A layer without a record is left as is.
    pub async fn persist(&self) -> BuildpackResult<()> {
        let Some(record) = &self.record else {
            return Ok(());
        };

        let content = toml::to_string(record)?;
        let path = self.record_path();
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| BuildpackError::io(format!("writing layer record {}", path.display()), e))
    }
}
