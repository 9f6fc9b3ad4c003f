//! CLI command implementations

pub mod build;
pub mod detect;

pub use build::execute as build;
pub use detect::execute as detect;

use crate::error::{BuildpackError, BuildpackResult};
use std::path::PathBuf;

/// Buildpack root: the explicit directory, else the parent of the
/// `bin/` directory holding this executable.
pub fn buildpack_dir(explicit: Option<PathBuf>) -> BuildpackResult<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }

    let exe = std::env::current_exe()
        .map_err(|e| BuildpackError::io("locating the buildpack executable", e))?;
    exe.parent()
        .and_then(|bin| bin.parent())
        .map(|root| root.to_path_buf())
        .ok_or_else(|| {
            BuildpackError::Internal(format!(
                "cannot derive buildpack directory from {}",
                exe.display()
            ))
        })
}
