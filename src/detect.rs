//! Detection
//!
//! The buildpack always participates. It provides `starknet-foundry` and
//! requires it itself, so the build phase always runs.

use crate::build::DEPENDENCY_PREFIX;
use crate::error::{BuildpackError, BuildpackResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Build plan written during detection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildPlan {
    pub provides: Vec<PlanProvide>,
    pub requires: Vec<PlanRequire>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanProvide {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequire {
    pub name: String,
}

impl BuildPlan {
    /// Plan that provides and requires one entry
    pub fn single(name: &str) -> Self {
        Self {
            provides: vec![PlanProvide {
                name: name.to_string(),
            }],
            requires: vec![PlanRequire {
                name: name.to_string(),
            }],
        }
    }
}

/// The detect phase
#[derive(Debug, Clone, Default)]
pub struct Detect;

impl Detect {
    /// Pass detection and write the build plan
    pub async fn detect(&self, platform_dir: &Path, plan_path: &Path) -> BuildpackResult<()> {
        debug!("Detecting with platform {}", platform_dir.display());

        let plan = BuildPlan::single(DEPENDENCY_PREFIX);
        let content = toml::to_string(&plan)?;
        tokio::fs::write(plan_path, content).await.map_err(|e| {
            BuildpackError::io(format!("writing build plan {}", plan_path.display()), e)
        })
    }
}
