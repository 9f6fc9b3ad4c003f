//! Content-addressed dependency cache
//!
//! Artifacts are keyed by their SHA-256. Each root holds:
//!
//! | Path | Content |
//! |------|---------|
//! | `<root>/<sha256>.toml` | the dependency entry the artifact belongs to |
//! | `<root>/<sha256>/<file>` | the artifact itself |
//!
//! Lookup order: the buildpack's own `dependencies/` directory (offline
//! packaging), then the download directory, then the network.

use crate::dependency::BuildpackDependency;
use crate::error::{BuildpackError, BuildpackResult};
use crate::ui;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maps dependencies to verified local files
#[derive(Debug, Clone)]
pub struct DependencyCache {
    /// Pre-populated artifacts shipped with the buildpack
    cache_path: PathBuf,

    /// Where downloads are written
    download_path: PathBuf,

    /// User-Agent sent with downloads
    user_agent: String,
}

impl DependencyCache {
    /// Create a cache, ensuring the download directory exists
    pub fn new(
        cache_path: PathBuf,
        download_path: PathBuf,
        user_agent: impl Into<String>,
    ) -> BuildpackResult<Self> {
        std::fs::create_dir_all(&download_path).map_err(|e| {
            BuildpackError::CacheCreate(format!(
                "creating download directory {}: {}",
                download_path.display(),
                e
            ))
        })?;

        Ok(Self {
            cache_path,
            download_path,
            user_agent: user_agent.into(),
        })
    }

    /// Return a local path to the dependency's artifact, downloading on a miss
    pub async fn artifact(&self, dependency: &BuildpackDependency) -> BuildpackResult<PathBuf> {
        if let Some(path) = lookup(&self.cache_path, dependency).await? {
            ui::body("Reusing cached download from buildpack");
            debug!("Cache hit in buildpack: {}", path.display());
            return Ok(path);
        }

        if let Some(path) = lookup(&self.download_path, dependency).await? {
            ui::body("Reusing cached download from previous build");
            debug!("Cache hit in downloads: {}", path.display());
            return Ok(path);
        }

        let dest = self
            .download_path
            .join(&dependency.sha256)
            .join(dependency.artifact_name());
        ui::body(&format!("Downloading from {}", dependency.uri));

        let uri = dependency.uri.clone();
        let user_agent = self.user_agent.clone();
        let target = dest.clone();
        let actual = tokio::task::spawn_blocking(move || fetch(&uri, &target, &user_agent))
            .await
            .map_err(|e| BuildpackError::Internal(format!("download task failed: {}", e)))??;

        if !actual.eq_ignore_ascii_case(&dependency.sha256) {
            let _ = tokio::fs::remove_dir_all(self.download_path.join(&dependency.sha256)).await;
            return Err(BuildpackError::ChecksumMismatch {
                uri: dependency.uri.clone(),
                expected: dependency.sha256.clone(),
                actual,
            });
        }
        ui::body("Verified SHA256");

        let record = self
            .download_path
            .join(format!("{}.toml", dependency.sha256));
        let content = toml::to_string(dependency)?;
        tokio::fs::write(&record, content)
            .await
            .map_err(|e| BuildpackError::io(format!("writing {}", record.display()), e))?;

        Ok(dest)
    }
}

/// Find a previously stored artifact for the dependency under `root`
async fn lookup(root: &Path, dependency: &BuildpackDependency) -> BuildpackResult<Option<PathBuf>> {
    let record = root.join(format!("{}.toml", dependency.sha256));
    let content = match tokio::fs::read_to_string(&record).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(BuildpackError::io(
                format!("reading {}", record.display()),
                e,
            ))
        }
    };

    let stored: BuildpackDependency = toml::from_str(&content)?;
    if stored.sha256 != dependency.sha256 {
        debug!("Ignoring {}: sha256 does not match", record.display());
        return Ok(None);
    }

    let artifact = root
        .join(&dependency.sha256)
        .join(stored.artifact_name());
    if tokio::fs::try_exists(&artifact).await.unwrap_or(false) {
        Ok(Some(artifact))
    } else {
        Ok(None)
    }
}

/// Stream `uri` to `dest`, returning the hex SHA-256 of the written bytes
fn fetch(uri: &str, dest: &Path, user_agent: &str) -> BuildpackResult<String> {
    let (reader, length) = open(uri, user_agent)?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| BuildpackError::io(format!("creating {}", parent.display()), e))?;
    }
    let mut file = File::create(dest)
        .map_err(|e| BuildpackError::io(format!("creating {}", dest.display()), e))?;

    let progress = match length {
        Some(len) => ProgressBar::new(len).with_style(
            ProgressStyle::with_template("      {bar:40} {bytes}/{total_bytes} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        ),
        None => ProgressBar::new_spinner(),
    };
    let mut reader = progress.wrap_read(reader);

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];
    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| BuildpackError::download(uri, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        file.write_all(&buffer[..n])
            .map_err(|e| BuildpackError::io(format!("writing {}", dest.display()), e))?;
    }
    progress.finish_and_clear();

    Ok(hex::encode(hasher.finalize()))
}

/// Open a reader for the URI, with its length when known
fn open(uri: &str, user_agent: &str) -> BuildpackResult<(Box<dyn Read + Send>, Option<u64>)> {
    if let Some(path) = uri.strip_prefix("file://") {
        let file = File::open(path).map_err(|e| BuildpackError::download(uri, e))?;
        let length = file.metadata().ok().map(|m| m.len());
        return Ok((Box::new(file), length));
    }

    if uri.starts_with("https://") || uri.starts_with("http://") {
        let response = ureq::get(uri)
            .header("User-Agent", user_agent)
            .call()
            .map_err(|e| BuildpackError::download(uri, e))?;
        let length = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let reader = response.into_body().into_reader();
        return Ok((Box::new(reader), length));
    }

    Err(BuildpackError::UnsupportedUri(uri.to_string()))
}
