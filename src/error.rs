//! Error types for the buildpack
//!
//! All modules use `BuildpackResult<T>` as their return type. Every variant
//! carries enough context to tell which build step failed.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for buildpack operations
pub type BuildpackResult<T> = Result<T, BuildpackError>;

/// All errors that can occur while detecting or building
#[derive(Error, Debug)]
pub enum BuildpackError {
    // Descriptor and configuration errors
    #[error("Invalid buildpack descriptor at {path}: {reason}")]
    DescriptorInvalid { path: PathBuf, reason: String },

    // Dependency resolution errors
    #[error("Unable to create dependency resolver: {0}")]
    ResolverCreate(String),

    #[error(
        "No valid dependencies for {id}, {version}, and {stack} in [{candidates}]"
    )]
    NoValidDependencies {
        id: String,
        version: String,
        stack: String,
        candidates: String,
    },

    // Dependency cache errors
    #[error("Unable to create dependency cache: {0}")]
    CacheCreate(String),

    #[error("Unable to download {uri}: {reason}")]
    Download { uri: String, reason: String },

    #[error("SHA256 mismatch for {uri}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        uri: String,
        expected: String,
        actual: String,
    },

    #[error("Unsupported dependency URI: {0}")]
    UnsupportedUri(String),

    // Layer contribution errors
    #[error("Unable to expand {artifact}: {reason}")]
    Extract { artifact: PathBuf, reason: String },

    #[error("Unable to chmod {path}: {source}")]
    Chmod {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error executing '{command}':\n Combined Output: {output}: {reason}")]
    Probe {
        command: String,
        output: String,
        reason: String,
    },

    #[error("Unable to parse version of {binary} from output {output:?}")]
    VersionParse { binary: String, output: String },

    #[error("Unable to write SBOM {path}: {source}")]
    SbomWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BuildpackError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an extraction error
    pub fn extract(artifact: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Extract {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a download error
    pub fn download(uri: impl Into<String>, reason: impl ToString) -> Self {
        Self::Download {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoValidDependencies { .. } => Some(
                "Check BP_STARKNET_FOUNDRY_VERSION and BP_STARKNET_FOUNDRY_LIBC against the dependencies in buildpack.toml",
            ),
            Self::ChecksumMismatch { .. } => {
                Some("The downloaded artifact does not match buildpack.toml; the dependency entry may be stale")
            }
            Self::DescriptorInvalid { .. } => Some("Set CNB_BUILDPACK_DIR to the buildpack root"),
            _ => None,
        }
    }
}
