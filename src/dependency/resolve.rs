//! Dependency resolution
//!
//! Selects a single dependency from `buildpack.toml` by:
//! 1. exact id match
//! 2. stack support (skipped when the platform reports no stack)
//! 3. version constraint, highest matching version wins

use crate::config::BuildpackDescriptor;
use crate::dependency::BuildpackDependency;
use crate::error::{BuildpackError, BuildpackResult};
use semver::{Version, VersionReq};
use std::cmp::Ordering;
use tracing::debug;

/// Resolves dependency ids and version constraints to concrete entries
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    dependencies: Vec<BuildpackDependency>,
    stack_id: Option<String>,
}

/// A parsed version constraint
#[derive(Debug, Clone)]
enum Constraint {
    Any,
    Pinned(Version),
    Req(VersionReq),
    Exact(String),
}

impl Constraint {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return Self::Any;
        }
        // A bare version pins exactly, semver would read it as a caret range
        if let Ok(version) = Version::parse(raw) {
            return Self::Pinned(version);
        }
        match VersionReq::parse(raw) {
            Ok(req) => Self::Req(req),
            Err(_) => Self::Exact(raw.to_string()),
        }
    }

    fn matches(&self, version: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Pinned(pinned) => Version::parse(version)
                .map(|v| &v == pinned)
                .unwrap_or(false),
            Self::Req(req) => Version::parse(version)
                .map(|v| req.matches(&v))
                .unwrap_or(false),
            Self::Exact(exact) => exact == version,
        }
    }
}

impl DependencyResolver {
    /// Create a resolver over the descriptor's dependencies.
    ///
    /// Fails when the descriptor declares no dependencies at all.
    pub fn new(
        descriptor: &BuildpackDescriptor,
        stack_id: Option<String>,
    ) -> BuildpackResult<Self> {
        if descriptor.metadata.dependencies.is_empty() {
            return Err(BuildpackError::ResolverCreate(format!(
                "buildpack {} declares no dependencies",
                descriptor.buildpack.id
            )));
        }

        Ok(Self {
            dependencies: descriptor.metadata.dependencies.clone(),
            stack_id: stack_id.filter(|s| !s.is_empty()),
        })
    }

    /// Resolve the best dependency for `id` and a version constraint
    pub fn resolve(&self, id: &str, version: &str) -> BuildpackResult<BuildpackDependency> {
        let constraint = Constraint::parse(version);
        debug!("Resolving {} with constraint {:?}", id, constraint);

        let mut candidates: Vec<&BuildpackDependency> = self
            .dependencies
            .iter()
            .filter(|d| d.id == id)
            .filter(|d| match &self.stack_id {
                Some(stack) => d.supports_stack(stack),
                None => true,
            })
            .filter(|d| constraint.matches(&d.version))
            .collect();

        candidates.sort_by(|a, b| compare_versions(&a.version, &b.version));

        match candidates.pop() {
            Some(dependency) => {
                debug!("Resolved {} to {}", id, dependency.version);
                Ok(dependency.clone())
            }
            None => Err(BuildpackError::NoValidDependencies {
                id: id.to_string(),
                version: if version.is_empty() { "*" } else { version }.to_string(),
                stack: self.stack_id.clone().unwrap_or_else(|| "*".to_string()),
                candidates: self
                    .dependencies
                    .iter()
                    .map(|d| format!("({}, {}, {})", d.id, d.version, d.stacks.join(" ")))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

/// Order versions semantically, falling back to string order for non-semver
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
