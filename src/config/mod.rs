//! Build-time configuration
//!
//! Options are declared in `buildpack.toml` under `[[metadata.configurations]]`
//! and supplied by the platform as environment variables. The environment is
//! captured once into an [`Environment`] map and never written back.

pub mod schema;

pub use schema::{BuildpackDescriptor, Configuration};

use crate::error::{BuildpackError, BuildpackResult};
use crate::ui;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Immutable snapshot of the build environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Snapshot the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Overlay `<platform>/env/<NAME>` files on top of this environment.
    ///
    /// A missing `env` directory is not an error.
    pub fn with_platform_dir(mut self, platform_dir: &Path) -> BuildpackResult<Self> {
        let env_dir = platform_dir.join("env");
        let entries = match std::fs::read_dir(&env_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(self),
            Err(e) => {
                return Err(BuildpackError::io(
                    format!("reading platform env {}", env_dir.display()),
                    e,
                ))
            }
        };

        for entry in entries {
            let entry = entry.map_err(|e| BuildpackError::io("reading platform env entry", e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let value = std::fs::read_to_string(&path).map_err(|e| {
                BuildpackError::io(format!("reading platform env {}", path.display()), e)
            })?;
            debug!("Platform env {} set from {}", name, path.display());
            self.vars.insert(name.to_string(), value);
        }

        Ok(self)
    }

    /// Set a variable, returning the updated snapshot
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Iterate over all variables
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Resolves declared configuration options against the environment
#[derive(Debug, Clone)]
pub struct ConfigurationResolver {
    configurations: Vec<Configuration>,
    environment: Environment,
}

impl ConfigurationResolver {
    /// Create a resolver from the descriptor's declared configurations
    pub fn new(descriptor: &BuildpackDescriptor, environment: Environment) -> Self {
        let mut configurations = descriptor.metadata.configurations.clone();
        configurations.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            configurations,
            environment,
        }
    }

    /// Resolve a value. The flag reports whether the value was user-supplied.
    ///
    /// Falls back to the declared default, then to the empty string.
    pub fn resolve(&self, name: &str) -> (String, bool) {
        if let Some(value) = self.environment.get(name) {
            return (value.to_string(), true);
        }

        let default = self
            .configurations
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| c.default.clone())
            .unwrap_or_default();
        (default, false)
    }

    /// Print the configuration table for build-time options
    pub fn log_table(&self) {
        let rows: Vec<_> = self
            .configurations
            .iter()
            .filter(|c| c.build)
            .collect();
        if rows.is_empty() {
            return;
        }

        ui::header("Build Configuration:");
        let width = rows.iter().map(|c| c.name.len()).max().unwrap_or(0);
        for config in rows {
            let (value, user_set) = self.resolve(&config.name);
            let marker = if user_set { "Set to" } else { "Default" };
            ui::config_row(&config.name, width, &value, marker, &config.description);
        }
    }
}
