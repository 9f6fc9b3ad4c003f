//! Fixtures shared by unit tests

use crate::dependency::{BuildpackDependency, DependencyCache};
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write a gzip tarball laid out like a Starknet Foundry release, with
/// `bin/sncast` and `bin/snforge` as shell scripts. Modes are 0644 so the
/// installer has to fix them.
pub fn foundry_archive(dir: &Path, version: &str, sncast: &str, snforge: &str) -> PathBuf {
    let top = format!("starknet-foundry-v{}-x86_64-unknown-linux-gnu", version);
    let mut builder = tar::Builder::new(Vec::new());
    for (name, body) in [("sncast", sncast), ("snforge", snforge)] {
        let content = format!("#!/bin/sh\n{}\n", body);
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/bin/{}", top, name), content.as_bytes())
            .unwrap();
    }
    let tar = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    let bytes = encoder.finish().unwrap();

    let path = dir.join(format!("{}.tar.gz", top));
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Scripts that answer `-V` like the real binaries
pub fn healthy_archive(dir: &Path, version: &str) -> PathBuf {
    foundry_archive(
        dir,
        version,
        &format!("echo \"sncast {}\"", version),
        &format!("echo \"snforge {}\"", version),
    )
}

/// A dependency entry pointing at a local file
pub fn file_dependency(id: &str, version: &str, artifact: &Path) -> BuildpackDependency {
    let bytes = std::fs::read(artifact).unwrap();
    BuildpackDependency {
        id: id.to_string(),
        name: "Starknet Foundry".to_string(),
        version: version.to_string(),
        uri: format!("file://{}", artifact.display()),
        sha256: hex::encode(Sha256::digest(&bytes)),
        stacks: vec!["*".to_string()],
        ..Default::default()
    }
}

/// A cache rooted under `dir`
pub fn cache(dir: &Path) -> DependencyCache {
    DependencyCache::new(dir.join("dependencies"), dir.join("downloads"), "test").unwrap()
}
