//! Archive expansion
//!
//! Expands gzip tarballs, plain tarballs and zip archives into a
//! directory, dropping a number of leading path components from every
//! entry. The format is sniffed from the file's magic bytes, not its name.

use crate::error::{BuildpackError, BuildpackResult};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use tracing::{debug, trace};

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
    Zip,
}

impl ArchiveFormat {
    /// Sniff the format from the first bytes of the file
    pub fn detect(path: &Path) -> BuildpackResult<Self> {
        let mut file = File::open(path).map_err(|e| BuildpackError::extract(path, e))?;
        let mut header = [0u8; 262];
        let n = read_up_to(&mut file, &mut header).map_err(|e| BuildpackError::extract(path, e))?;
        let header = &header[..n];

        if header.starts_with(&[0x1f, 0x8b]) {
            Ok(Self::TarGz)
        } else if header.starts_with(b"PK\x03\x04") {
            Ok(Self::Zip)
        } else if header.len() >= 262 && &header[257..262] == b"ustar" {
            Ok(Self::Tar)
        } else {
            Err(BuildpackError::extract(path, "unrecognized archive format"))
        }
    }
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = file.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

/// Drop `strip` leading components; `None` when nothing remains or the
/// remainder would leave `dest`.
fn strip_path(path: &Path, strip: usize) -> Option<PathBuf> {
    let mut stripped = PathBuf::new();
    for component in path.components().filter(|c| !matches!(c, Component::CurDir)).skip(strip) {
        match component {
            Component::Normal(part) => stripped.push(part),
            _ => return None,
        }
    }
    if stripped.as_os_str().is_empty() {
        None
    } else {
        Some(stripped)
    }
}

/// Expand `artifact` into `dest`, stripping `strip` leading components
pub fn extract(artifact: &Path, dest: &Path, strip: usize) -> BuildpackResult<()> {
    let format = ArchiveFormat::detect(artifact)?;
    debug!(?format, artifact = %artifact.display(), dest = %dest.display(), strip, "Expanding archive");

    std::fs::create_dir_all(dest).map_err(|e| BuildpackError::extract(artifact, e))?;

    let file = File::open(artifact).map_err(|e| BuildpackError::extract(artifact, e))?;

    match format {
        ArchiveFormat::TarGz => extract_tar(artifact, Archive::new(GzDecoder::new(file)), dest, strip),
        ArchiveFormat::Tar => extract_tar(artifact, Archive::new(file), dest, strip),
        ArchiveFormat::Zip => extract_zip(artifact, file, dest, strip),
    }
}

fn extract_tar<R: Read>(
    artifact: &Path,
    mut archive: Archive<R>,
    dest: &Path,
    strip: usize,
) -> BuildpackResult<()> {
    let entries = archive
        .entries()
        .map_err(|e| BuildpackError::extract(artifact, format!("reading tar: {}", e)))?;

    for entry in entries {
        let mut entry = entry
            .map_err(|e| BuildpackError::extract(artifact, format!("reading tar entry: {}", e)))?;
        let path = entry
            .path()
            .map_err(|e| BuildpackError::extract(artifact, format!("invalid path in tar: {}", e)))?
            .into_owned();

        let Some(relative) = strip_path(&path, strip) else {
            trace!(path = %path.display(), "Skipping entry");
            continue;
        };
        ensure_no_symlink_parents(artifact, dest, &relative)?;
        let target = dest.join(&relative);

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BuildpackError::extract(artifact, e))?;
        }
        // A later entry replaces an earlier symlink instead of following it
        if std::fs::symlink_metadata(&target).is_ok_and(|m| m.file_type().is_symlink()) {
            std::fs::remove_file(&target).map_err(|e| BuildpackError::extract(artifact, e))?;
        }

        match entry.header().entry_type() {
            EntryType::Symlink => {
                let link = link_name(artifact, &entry, &relative)?;
                if !symlink_stays_inside(&relative, &link) {
                    return Err(BuildpackError::extract(
                        artifact,
                        format!(
                            "symlink {} -> {} points outside the destination",
                            relative.display(),
                            link.display()
                        ),
                    ));
                }
            }
            EntryType::Link => {
                let link = link_name(artifact, &entry, &relative)?;
                let source = if link.has_root() {
                    None
                } else {
                    strip_path(&link, strip)
                };
                let Some(source) = source else {
                    return Err(BuildpackError::extract(
                        artifact,
                        format!(
                            "hard link {} -> {} points outside the destination",
                            relative.display(),
                            link.display()
                        ),
                    ));
                };
                ensure_no_symlink_parents(artifact, dest, &source)?;
                std::fs::hard_link(dest.join(&source), &target).map_err(|e| {
                    BuildpackError::extract(
                        artifact,
                        format!("linking {} to {}: {}", relative.display(), source.display(), e),
                    )
                })?;
                continue;
            }
            _ => {}
        }

        entry.unpack(&target).map_err(|e| {
            BuildpackError::extract(artifact, format!("unpacking {}: {}", relative.display(), e))
        })?;
    }

    Ok(())
}

fn link_name<R: Read>(
    artifact: &Path,
    entry: &tar::Entry<'_, R>,
    relative: &Path,
) -> BuildpackResult<PathBuf> {
    entry
        .link_name()
        .map_err(|e| BuildpackError::extract(artifact, format!("invalid link in tar: {}", e)))?
        .map(|link| link.into_owned())
        .ok_or_else(|| {
            BuildpackError::extract(artifact, format!("link {} has no target", relative.display()))
        })
}

/// Whether a symlink at `relative` pointing to `link` resolves inside the
/// destination root
fn symlink_stays_inside(relative: &Path, link: &Path) -> bool {
    let mut depth: Vec<&std::ffi::OsStr> = relative
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    for component in link.components() {
        match component {
            Component::Normal(part) => depth.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth.pop().is_none() {
                    return false;
                }
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Refuse to write through a symlink already present under `dest`
fn ensure_no_symlink_parents(artifact: &Path, dest: &Path, relative: &Path) -> BuildpackResult<()> {
    let mut current = dest.to_path_buf();
    let Some(parent) = relative.parent() else {
        return Ok(());
    };
    for component in parent.components() {
        current.push(component);
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(BuildpackError::extract(
                    artifact,
                    format!(
                        "{} is written through symlink {}",
                        relative.display(),
                        current.display()
                    ),
                ))
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(BuildpackError::extract(artifact, e)),
        }
    }
    Ok(())
}

fn extract_zip(artifact: &Path, file: File, dest: &Path, strip: usize) -> BuildpackResult<()> {
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| BuildpackError::extract(artifact, format!("reading zip: {}", e)))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| BuildpackError::extract(artifact, format!("reading zip entry: {}", e)))?;

        let Some(path) = entry.enclosed_name() else {
            continue;
        };
        let Some(relative) = strip_path(&path, strip) else {
            continue;
        };
        ensure_no_symlink_parents(artifact, dest, &relative)?;
        let target = dest.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| BuildpackError::extract(artifact, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BuildpackError::extract(artifact, e))?;
        }
        let mut out = File::create(&target).map_err(|e| BuildpackError::extract(artifact, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| BuildpackError::extract(artifact, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode))
                .map_err(|e| BuildpackError::extract(artifact, e))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn tar_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, content.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap()
    }

    enum Item<'a> {
        File(&'a str, &'a str),
        Symlink(&'a str, &'a str),
        HardLink(&'a str, &'a str),
    }

    fn tar_with_links(items: &[Item<'_>]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for item in items {
            let mut header = tar::Header::new_gnu();
            match item {
                Item::File(path, content) => {
                    header.set_size(content.len() as u64);
                    header.set_mode(0o644);
                    builder.append_data(&mut header, path, content.as_bytes()).unwrap();
                }
                Item::Symlink(path, target) | Item::HardLink(path, target) => {
                    let kind = if matches!(item, Item::Symlink(..)) {
                        EntryType::Symlink
                    } else {
                        EntryType::Link
                    };
                    header.set_entry_type(kind);
                    header.set_size(0);
                    header.set_mode(0o777);
                    header.set_link_name(target).unwrap();
                    builder.append_data(&mut header, path, std::io::empty()).unwrap();
                }
            }
        }
        builder.into_inner().unwrap()
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn strip_path_components() {
        assert_eq!(
            strip_path(Path::new("foundry-v0.48.0/bin/sncast"), 1),
            Some(PathBuf::from("bin/sncast"))
        );
        assert_eq!(
            strip_path(Path::new("./foundry-v0.48.0/bin/sncast"), 1),
            Some(PathBuf::from("bin/sncast"))
        );
        assert_eq!(strip_path(Path::new("foundry-v0.48.0/"), 1), None);
        assert_eq!(strip_path(Path::new("top/../../etc/passwd"), 1), None);
    }

    #[test]
    fn expands_tar_gz_stripping_top_directory() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("foundry.tar.gz");
        std::fs::write(
            &archive,
            gzip(&tar_bytes(&[
                ("starknet-foundry-v0.48.0/bin/sncast", "sncast"),
                ("starknet-foundry-v0.48.0/bin/snforge", "snforge"),
                ("starknet-foundry-v0.48.0/README.md", "readme"),
            ])),
        )
        .unwrap();

        let dest = temp.path().join("layer");
        extract(&archive, &dest, 1).unwrap();

        assert_eq!(std::fs::read(dest.join("bin/sncast")).unwrap(), b"sncast");
        assert_eq!(std::fs::read(dest.join("bin/snforge")).unwrap(), b"snforge");
        assert!(dest.join("README.md").exists());
        assert!(!dest.join("starknet-foundry-v0.48.0").exists());
    }

    #[test]
    fn expands_plain_tar() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("foundry.tar");
        std::fs::write(&archive, tar_bytes(&[("top/bin/sncast", "x")])).unwrap();

        assert_eq!(ArchiveFormat::detect(&archive).unwrap(), ArchiveFormat::Tar);
        let dest = temp.path().join("layer");
        extract(&archive, &dest, 1).unwrap();
        assert!(dest.join("bin/sncast").exists());
    }

    #[test]
    fn expands_zip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("foundry.zip");
        {
            let file = File::create(&archive).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
            writer.start_file("top/bin/snforge", options).unwrap();
            writer.write_all(b"snforge").unwrap();
            writer.finish().unwrap();
        }

        let dest = temp.path().join("layer");
        extract(&archive, &dest, 1).unwrap();
        assert_eq!(std::fs::read(dest.join("bin/snforge")).unwrap(), b"snforge");
    }

    #[test]
    fn absolute_symlink_cannot_redirect_writes() {
        let temp = TempDir::new().unwrap();
        let outside = temp.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        let archive = temp.path().join("foundry.tar");
        std::fs::write(
            &archive,
            tar_with_links(&[
                Item::Symlink("top/esc", outside.to_str().unwrap()),
                Item::File("top/esc/pwned", "x"),
            ]),
        )
        .unwrap();

        let err = extract(&archive, &temp.path().join("layer"), 1).unwrap_err();
        assert!(matches!(err, BuildpackError::Extract { .. }));
        assert!(!outside.join("pwned").exists());
    }

    #[test]
    fn relative_symlink_leaving_destination_is_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("foundry.tar");
        std::fs::write(
            &archive,
            tar_with_links(&[Item::Symlink("top/bin/esc", "../../outside")]),
        )
        .unwrap();

        let err = extract(&archive, &temp.path().join("layer"), 1).unwrap_err();
        assert!(err.to_string().contains("points outside the destination"));
        assert!(!temp.path().join("layer").join("bin").join("esc").exists());
    }

    #[cfg(unix)]
    #[test]
    fn inner_symlink_is_kept_but_never_written_through() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("foundry.tar");
        std::fs::write(
            &archive,
            tar_with_links(&[
                Item::File("top/bin/sncast", "sncast"),
                Item::Symlink("top/bin/alias", "sncast"),
            ]),
        )
        .unwrap();
        let dest = temp.path().join("layer");
        extract(&archive, &dest, 1).unwrap();
        assert_eq!(std::fs::read(dest.join("bin/alias")).unwrap(), b"sncast");

        std::fs::write(
            &archive,
            tar_with_links(&[
                Item::Symlink("top/lib", "bin"),
                Item::File("top/lib/x", "x"),
            ]),
        )
        .unwrap();
        let dest = temp.path().join("layer2");
        std::fs::create_dir_all(dest.join("bin")).unwrap();
        let err = extract(&archive, &dest, 1).unwrap_err();
        assert!(err.to_string().contains("through symlink"));
        assert!(!dest.join("bin").join("x").exists());
    }

    #[test]
    fn hard_link_is_resolved_inside_destination() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("foundry.tar.gz");
        std::fs::write(
            &archive,
            gzip(&tar_with_links(&[
                Item::File("starknet-foundry-v0.48.0/bin/sncast", "foundry"),
                Item::HardLink(
                    "starknet-foundry-v0.48.0/bin/snforge",
                    "starknet-foundry-v0.48.0/bin/sncast",
                ),
            ])),
        )
        .unwrap();

        let dest = temp.path().join("layer");
        extract(&archive, &dest, 1).unwrap();
        assert_eq!(std::fs::read(dest.join("bin/snforge")).unwrap(), b"foundry");
        assert_eq!(std::fs::read(dest.join("bin/sncast")).unwrap(), b"foundry");
    }

    #[test]
    fn hard_link_leaving_destination_is_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("foundry.tar");
        std::fs::write(
            &archive,
            tar_with_links(&[Item::HardLink("top/bin/snforge", "/etc/passwd")]),
        )
        .unwrap();

        let err = extract(&archive, &temp.path().join("layer"), 1).unwrap_err();
        assert!(err.to_string().contains("points outside the destination"));
    }

    #[test]
    fn symlink_containment() {
        assert!(symlink_stays_inside(Path::new("bin/alias"), Path::new("sncast")));
        assert!(symlink_stays_inside(Path::new("bin/alias"), Path::new("../lib/x")));
        assert!(!symlink_stays_inside(Path::new("bin/alias"), Path::new("../../x")));
        assert!(!symlink_stays_inside(Path::new("alias"), Path::new("/usr/bin/sncast")));
    }

    #[test]
    fn corrupt_archive_fails() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("foundry.tar.gz");
        std::fs::write(&archive, b"definitely not an archive").unwrap();

        let err = extract(&archive, &temp.path().join("layer"), 1).unwrap_err();
        assert!(matches!(err, BuildpackError::Extract { .. }));
    }

    #[test]
    fn missing_archive_fails() {
        let temp = TempDir::new().unwrap();
        let err = extract(&temp.path().join("nope.tgz"), &temp.path().join("layer"), 1).unwrap_err();
        assert!(matches!(err, BuildpackError::Extract { .. }));
    }
}
