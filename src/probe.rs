//! Post-install version probes
//!
//! Each probe runs an installed binary with version arguments and reads the
//! version from its output. Binaries are located through an explicit `PATH`
//! handed to the child; the buildpack's own environment is never changed.

use crate::config::Environment;
use crate::error::{BuildpackError, BuildpackResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// One binary to check and the arguments that make it print its version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionProbe {
    /// Program name, resolved through the probe `PATH`
    pub program: String,

    /// Arguments, e.g. `-V`
    pub args: Vec<String>,
}

/// Outcome of a successful probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub program: String,
    pub output: String,
    pub version: String,
}

impl VersionProbe {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn display(&self, bin_dir: &Path) -> String {
        let mut command = bin_dir.join(&self.program).display().to_string();
        for arg in &self.args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }

    /// Run the probe with `bin_dir` prepended to the environment's `PATH`.
    ///
    /// Stdout and stderr are captured on separate pipes and joined as all of
    /// stdout followed by all of stderr, so lines from the two streams are
    /// not interleaved in write order. A spawn failure or a non-zero exit
    /// embeds that output in the error.
    pub async fn run(&self, bin_dir: &Path, env: &Environment) -> BuildpackResult<ProbeReport> {
        let command = self.display(bin_dir);
        let path = prepend_path(bin_dir, env.get("PATH"));
        debug!("Executing {} with PATH={:?}", command, path);

        let output = Command::new(&self.program)
            .args(&self.args)
            .env_clear()
            .envs(env.iter().filter(|(k, _)| *k != "PATH"))
            .env("PATH", &path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| BuildpackError::Probe {
                command: command.clone(),
                output: String::new(),
                reason: e.to_string(),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(BuildpackError::Probe {
                command,
                output: combined,
                reason: output.status.to_string(),
            });
        }

        let version = parse_version(&combined).ok_or_else(|| BuildpackError::VersionParse {
            binary: self.program.clone(),
            output: combined.clone(),
        })?;

        Ok(ProbeReport {
            program: self.program.clone(),
            output: combined,
            version,
        })
    }
}

/// `<bin_dir>:<existing>`, or just `<bin_dir>` when there is no `PATH`
pub fn prepend_path(bin_dir: &Path, existing: Option<&str>) -> OsString {
    let mut paths: Vec<PathBuf> = vec![bin_dir.to_path_buf()];
    if let Some(existing) = existing.filter(|p| !p.is_empty()) {
        paths.extend(std::env::split_paths(existing));
    }
    std::env::join_paths(paths).unwrap_or_else(|_| bin_dir.as_os_str().to_os_string())
}

/// The token after the program name, e.g. `sncast 0.48.0` gives `0.48.0`
pub fn parse_version(output: &str) -> Option<String> {
    output.split_whitespace().nth(1).map(str::to_string)
}
