//! Layer contribution
//!
//! [`LayerContributor`] is the seam the build command drives: it names a
//! layer and fills it in. [`DependencyLayerContributor`] handles the part
//! shared by every dependency-backed layer: the reuse decision, resetting a
//! stale layer and fetching the artifact.

use crate::dependency::{BuildpackDependency, DependencyCache};
use crate::error::BuildpackResult;
use crate::layer::decide::{decide, Decision};
use crate::layer::record::{Layer, LayerRecord, LayerTypes};
use crate::ui;
use async_trait::async_trait;
use std::future::Future;
use std::path::PathBuf;
use tracing::debug;

/// Something that produces one layer
#[async_trait]
pub trait LayerContributor: Send + Sync {
    /// Stable layer name, used to find the previous build's record
    fn name(&self) -> String;

    /// Populate the layer (or keep it) and return it with its record set
    async fn contribute(&self, layer: Layer) -> BuildpackResult<Layer>;
}

/// Installs a [`BuildpackDependency`] into a layer
#[derive(Debug, Clone)]
pub struct DependencyLayerContributor {
    dependency: BuildpackDependency,
    cache: DependencyCache,
    types: LayerTypes,
}

impl DependencyLayerContributor {
    pub fn new(dependency: BuildpackDependency, cache: DependencyCache, types: LayerTypes) -> Self {
        Self {
            dependency,
            cache,
            types,
        }
    }

    /// Layer name derived from the dependency id
    pub fn layer_name(&self) -> String {
        self.dependency.id.clone()
    }

    pub fn dependency(&self) -> &BuildpackDependency {
        &self.dependency
    }

    /// The record a layer holding this dependency should carry
    pub fn expected_record(&self) -> BuildpackResult<LayerRecord> {
        Ok(LayerRecord {
            types: self.types,
            metadata: self.dependency.as_metadata()?,
        })
    }

    /// Reuse the layer when its record matches, otherwise reset it, fetch
    /// the artifact and hand both to `install`.
    pub async fn contribute<F, Fut>(&self, mut layer: Layer, install: F) -> BuildpackResult<Layer>
    where
        F: FnOnce(PathBuf, Layer) -> Fut,
        Fut: Future<Output = BuildpackResult<Layer>>,
    {
        let expected = self.expected_record()?;

        match decide(layer.record.as_ref(), &expected) {
            Decision::Reuse => {
                ui::header(&format!("{}: Reusing cached layer", layer.name));
                debug!("Layer {} matches {}", layer.name, self.dependency);
                Ok(layer)
            }
            Decision::Recreate => {
                ui::header(&format!("{}: Contributing to layer", layer.name));
                layer.reset().await?;

                let artifact = self.cache.artifact(&self.dependency).await?;
                let mut layer = install(artifact, layer).await?;
                layer.record = Some(expected);
                Ok(layer)
            }
        }
    }
}
