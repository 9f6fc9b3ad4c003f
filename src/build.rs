//! Build orchestration
//!
//! Reads the build configuration, resolves the Starknet Foundry dependency
//! for the requested libc flavor and version, and returns the single layer
//! contributor that installs it. [`BuildResult::apply`] then drives each
//! contributor against the layers directory.

use crate::config::{BuildpackDescriptor, ConfigurationResolver, Environment};
use crate::dependency::{DependencyCache, DependencyResolver};
use crate::error::{BuildpackError, BuildpackResult};
use crate::foundry::StarknetFoundry;
use crate::layer::{Layer, LayerContributor};
use crate::ui;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Selects the libc flavor of the release
pub const LIBC_VAR: &str = "BP_STARKNET_FOUNDRY_LIBC";

/// Version constraint for the release
pub const VERSION_VAR: &str = "BP_STARKNET_FOUNDRY_VERSION";

/// Dependency id prefix, suffixed with the libc flavor
pub const DEPENDENCY_PREFIX: &str = "starknet-foundry";

const DEFAULT_LIBC: &str = "gnu";

/// Everything a build invocation receives from the platform
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Buildpack root (holds `buildpack.toml`)
    pub buildpack_dir: PathBuf,

    /// Parsed `buildpack.toml`
    pub buildpack: BuildpackDescriptor,

    /// Where layers are created
    pub layers_dir: PathBuf,

    /// Stack id reported by the platform
    pub stack_id: Option<String>,

    /// Build environment, process env overlaid with platform env files
    pub environment: Environment,

    /// Where downloaded artifacts are kept
    pub download_dir: PathBuf,
}

impl BuildContext {
    /// Read `buildpack.toml` from `buildpack_dir` and assemble the context.
    ///
    /// `<platform>/env` is folded into the environment here; nothing else
    /// under the platform directory is read.
    pub async fn load(
        buildpack_dir: PathBuf,
        layers_dir: PathBuf,
        platform_dir: &Path,
        stack_id: Option<String>,
        environment: Environment,
    ) -> BuildpackResult<Self> {
        let buildpack = load_descriptor(&buildpack_dir).await?;
        let environment = environment.with_platform_dir(platform_dir)?;
        let download_dir = std::env::temp_dir().join(format!(
            "{}-downloads",
            buildpack.buildpack.id.replace('/', "_")
        ));

        Ok(Self {
            buildpack_dir,
            buildpack,
            layers_dir,
            stack_id,
            environment,
            download_dir,
        })
    }
}

/// Parse `<dir>/buildpack.toml`
pub async fn load_descriptor(buildpack_dir: &Path) -> BuildpackResult<BuildpackDescriptor> {
    let path = buildpack_dir.join("buildpack.toml");
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| BuildpackError::DescriptorInvalid {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    BuildpackDescriptor::parse(&content).map_err(|e| BuildpackError::DescriptorInvalid {
        path,
        reason: e.to_string(),
    })
}

/// Layers a build wants contributed
#[derive(Default)]
pub struct BuildResult {
    pub layers: Vec<Box<dyn LayerContributor>>,
}

impl BuildResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contribute every layer in order and persist its record
    pub async fn apply(&self, layers_dir: &Path) -> BuildpackResult<Vec<Layer>> {
        let mut contributed = Vec::with_capacity(self.layers.len());
        for contributor in &self.layers {
            let layer = Layer::load(layers_dir, &contributor.name()).await?;
            let layer = contributor.contribute(layer).await?;
            layer.persist().await?;
            debug!("Persisted layer {}", layer.name);
            contributed.push(layer);
        }
        Ok(contributed)
    }
}

/// The build phase
#[derive(Debug, Clone, Default)]
pub struct Build;

impl Build {
    /// Resolve configuration and the dependency, and register its layer
    pub fn build(&self, context: &BuildContext) -> BuildpackResult<BuildResult> {
        let info = &context.buildpack.buildpack;
        ui::title(&info.name, &info.version, info.homepage.as_deref());

        let mut result = BuildResult::new();

        let config = ConfigurationResolver::new(&context.buildpack, context.environment.clone());
        config.log_table();

        let resolver = DependencyResolver::new(&context.buildpack, context.stack_id.clone())?;

        let (libc, _) = config.resolve(LIBC_VAR);
        let libc = if libc.trim().is_empty() {
            DEFAULT_LIBC.to_string()
        } else {
            libc.trim().to_string()
        };
        let (version, _) = config.resolve(VERSION_VAR);

        let id = format!("{}-{}", DEPENDENCY_PREFIX, libc);
        info!("Resolving {} {}", id, if version.is_empty() { "*" } else { version.as_str() });
        let dependency = resolver.resolve(&id, &version)?;

        let cache = DependencyCache::new(
            context.buildpack_dir.join("dependencies"),
            context.download_dir.clone(),
            format!("{}/{}", info.id, info.version),
        )?;

        let foundry = StarknetFoundry::new(dependency, cache, context.environment.clone());
        result.layers.push(Box::new(foundry));
        Ok(result)
    }
}
