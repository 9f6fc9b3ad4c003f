//! Starknet Foundry layer
//!
//! Expands the Starknet Foundry release into a layer, makes `sncast` and
//! `snforge` executable, checks that both answer `-V` and records the
//! installed version in a Syft SBOM.

use crate::config::Environment;
use crate::dependency::{BuildpackDependency, DependencyCache};
use crate::error::{BuildpackError, BuildpackResult};
use crate::extract;
use crate::layer::{DependencyLayerContributor, Layer, LayerContributor, LayerTypes, SbomFormat};
use crate::probe::{ProbeReport, VersionProbe};
use crate::sbom::{SyftArtifact, SyftDocument, SyftLocation};
use crate::ui;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Binaries shipped in the release, in probe order
pub const BINARIES: [&str; 2] = ["sncast", "snforge"];

/// Locator recorded in the SBOM for artifacts this layer installs
const SBOM_LOCATION: &str = "amp-buildpacks/starknet-foundry/src/foundry.rs";

/// Contributes the Starknet Foundry toolchain layer
#[derive(Debug, Clone)]
pub struct StarknetFoundry {
    contributor: DependencyLayerContributor,
    environment: Environment,
}

impl StarknetFoundry {
    /// Layer available at build and launch time, and cached between builds
    pub fn new(
        dependency: BuildpackDependency,
        cache: DependencyCache,
        environment: Environment,
    ) -> Self {
        let types = LayerTypes {
            build: true,
            launch: true,
            cache: true,
        };
        Self {
            contributor: DependencyLayerContributor::new(dependency, cache, types),
            environment,
        }
    }

    /// Requested dependency version
    pub fn version(&self) -> &str {
        &self.contributor.dependency().version
    }

    fn probes() -> Vec<VersionProbe> {
        BINARIES
            .iter()
            .map(|name| VersionProbe::new(*name, &["-V"]))
            .collect()
    }

    async fn install(&self, artifact: PathBuf, layer: Layer) -> BuildpackResult<Layer> {
        ui::body(&format!(
            "Expanding {} to {}",
            artifact.display(),
            layer.path.display()
        ));
        let target = layer.path.clone();
        let source = artifact.clone();
        tokio::task::spawn_blocking(move || extract::extract(&source, &target, 1))
            .await
            .map_err(|e| BuildpackError::extract(&artifact, format!("expansion task failed: {}", e)))??;

        let bin = layer.path.join("bin");
        for name in BINARIES {
            make_executable(&bin.join(name)).await?;
        }

        let mut reports: Vec<ProbeReport> = Vec::with_capacity(BINARIES.len());
        for probe in Self::probes() {
            let report = probe.run(&bin, &self.environment).await?;
            debug!("{} -V output: {}", report.program, report.output.trim_end());
            ui::body(&format!(
                "Checking {} version: {}",
                bin.join(&report.program).display(),
                report.version
            ));
            reports.push(report);
        }

        let version = installed_version(&reports)?;
        if version != self.version() {
            ui::warn(&format!(
                "Installed version {} differs from requested {}",
                version,
                self.version()
            ));
        }

        let sbom_path = layer.sbom_path(SbomFormat::SyftJson);
        let document = SyftDocument::new(&layer.path, vec![sbom_artifact(&version)]);
        debug!("Writing Syft SBOM at {}: {:?}", sbom_path.display(), document);
        document.write_to(&sbom_path).await?;

        Ok(layer)
    }
}

#[async_trait]
impl LayerContributor for StarknetFoundry {
    fn name(&self) -> String {
        self.contributor.layer_name()
    }

    async fn contribute(&self, layer: Layer) -> BuildpackResult<Layer> {
        self.contributor
            .contribute(layer, |artifact, layer| self.install(artifact, layer))
            .await
    }
}

/// The toolchain version, read from the first probed binary.
///
/// Every binary is checked against its own output; a disagreement is
/// reported but the first binary's version stays authoritative.
fn installed_version(reports: &[ProbeReport]) -> BuildpackResult<String> {
    let first = reports
        .first()
        .ok_or_else(|| BuildpackError::Internal("no version probes ran".to_string()))?;

    for other in &reports[1..] {
        if other.version != first.version {
            ui::warn(&format!(
                "{} reports {} but {} reports {}",
                other.program, other.version, first.program, first.version
            ));
        }
    }

    Ok(first.version.clone())
}

/// SBOM entry for the installed toolchain
pub fn sbom_artifact(version: &str) -> SyftArtifact {
    SyftArtifact {
        id: "starknet-foundry".to_string(),
        name: "StarknetFoundry".to_string(),
        version: version.to_string(),
        kind: "UnknownPackage".to_string(),
        found_by: "amp-buildpacks/starknet-foundry".to_string(),
        locations: vec![SyftLocation {
            path: SBOM_LOCATION.to_string(),
        }],
        licenses: vec!["MIT".to_string()],
        cpes: vec![format!("cpe:2.3:a:foundry:foundry:{}:*:*:*:*:*:*:*", version)],
        purl: format!("pkg:generic/starknet-foundry@{}", version),
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> BuildpackResult<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| BuildpackError::Chmod {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(not(unix))]
async fn make_executable(path: &Path) -> BuildpackResult<()> {
    tokio::fs::metadata(path)
        .await
        .map(|_| ())
        .map_err(|e| BuildpackError::Chmod {
            path: path.to_path_buf(),
            source: e,
        })
}
