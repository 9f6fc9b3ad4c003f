//! Integration tests for the Starknet Foundry buildpack

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn buildpack() -> Command {
        let mut cmd = cargo_bin_cmd!("starknet-foundry-buildpack");
        cmd.env_remove("CNB_BUILDPACK_DIR")
            .env_remove("CNB_STACK_ID")
            .env_remove("BP_STARKNET_FOUNDRY_LIBC")
            .env_remove("BP_STARKNET_FOUNDRY_VERSION");
        cmd
    }

    #[test]
    fn help_lists_phases() {
        buildpack()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("detect"))
            .stdout(predicate::str::contains("build"));
    }

    #[test]
    fn version_displays() {
        buildpack()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("starknet-foundry-buildpack"));
    }

    #[test]
    fn detect_writes_plan() {
        let temp = TempDir::new().unwrap();
        let plan = temp.path().join("plan.toml");

        buildpack()
            .arg("detect")
            .arg(temp.path())
            .arg(&plan)
            .assert()
            .success();

        let content = std::fs::read_to_string(&plan).unwrap();
        assert!(content.contains("[[provides]]"));
        assert!(content.contains("name = \"starknet-foundry\""));
    }

    #[test]
    fn build_without_descriptor_fails() {
        let temp = TempDir::new().unwrap();

        buildpack()
            .arg("build")
            .arg(temp.path().join("layers"))
            .arg(temp.path())
            .arg(temp.path().join("plan.toml"))
            .arg("--buildpack-dir")
            .arg(temp.path().join("missing"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid buildpack descriptor"));
    }
}

#[cfg(unix)]
mod build_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use predicates::prelude::*;
    use sha2::{Digest, Sha256};
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const VERSION: &str = "0.48.0";

    /// Release tarball whose binaries print `<name> <version>`
    fn release(dir: &Path) -> PathBuf {
        let top = format!("starknet-foundry-v{}-x86_64-unknown-linux-gnu", VERSION);
        let mut builder = tar::Builder::new(Vec::new());
        for name in ["sncast", "snforge"] {
            let content = format!("#!/bin/sh\necho \"{} {}\"\n", name, VERSION);
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, format!("{}/bin/{}", top, name), content.as_bytes())
                .unwrap();
        }
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&builder.into_inner().unwrap()).unwrap();

        let path = dir.join(format!("{}.tar.gz", top));
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();
        path
    }

    /// Buildpack root with a `buildpack.toml` pointing at a local release
    fn buildpack_root(dir: &Path) -> PathBuf {
        let archive = release(dir);
        let sha256 = hex::encode(Sha256::digest(std::fs::read(&archive).unwrap()));
        let root = dir.join("buildpack");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(
            root.join("buildpack.toml"),
            format!(
                r#"api = "0.8"

[buildpack]
id = "amp-buildpacks/starknet-foundry"
name = "AMP Buildpack for Starknet Foundry"
version = "0.1.0"

[[stacks]]
id = "*"

[[metadata.configurations]]
name = "BP_STARKNET_FOUNDRY_LIBC"
default = "gnu"
description = "libc flavor of the release"
build = true

[[metadata.configurations]]
name = "BP_STARKNET_FOUNDRY_VERSION"
default = "{version}"
description = "Starknet Foundry version"
build = true

[[metadata.dependencies]]
id = "starknet-foundry-gnu"
name = "Starknet Foundry"
version = "{version}"
uri = "file://{uri}"
sha256 = "{sha256}"
stacks = ["*"]
"#,
                version = VERSION,
                uri = archive.display(),
                sha256 = sha256,
            ),
        )
        .unwrap();
        root
    }

    fn build(temp: &TempDir, root: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("starknet-foundry-buildpack");
        cmd.env_remove("CNB_STACK_ID")
            .env_remove("BP_STARKNET_FOUNDRY_LIBC")
            .env_remove("BP_STARKNET_FOUNDRY_VERSION")
            .env("TMPDIR", temp.path())
            .env("CNB_BUILDPACK_DIR", root)
            .arg("build")
            .arg(temp.path().join("layers"))
            .arg(temp.path().join("platform"))
            .arg(temp.path().join("plan.toml"));
        cmd
    }

    #[test]
    fn build_installs_layer_and_sbom() {
        let temp = TempDir::new().unwrap();
        let root = buildpack_root(temp.path());
        std::fs::create_dir_all(temp.path().join("layers")).unwrap();
        std::fs::create_dir_all(temp.path().join("platform")).unwrap();

        build(&temp, &root)
            .assert()
            .success()
            .stdout(predicate::str::contains("AMP Buildpack for Starknet Foundry"));

        let layers = temp.path().join("layers");
        let sncast = layers.join("starknet-foundry-gnu").join("bin").join("sncast");
        let mode = std::fs::metadata(&sncast).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);

        let record = std::fs::read_to_string(layers.join("starknet-foundry-gnu.toml")).unwrap();
        assert!(record.contains("launch = true"));

        let sbom = std::fs::read_to_string(layers.join("starknet-foundry-gnu.sbom.syft.json")).unwrap();
        assert!(sbom.contains("pkg:generic/starknet-foundry@0.48.0"));
    }

    #[test]
    fn unknown_version_fails_build() {
        let temp = TempDir::new().unwrap();
        let root = buildpack_root(temp.path());
        std::fs::create_dir_all(temp.path().join("layers")).unwrap();

        build(&temp, &root)
            .env("BP_STARKNET_FOUNDRY_VERSION", "9.9.9")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No valid dependencies"));
    }
}
