//! The install pipeline.
//!
//! `install` turns a version token into a complete `<root>/v<exact>/`
//! directory:
//!
//! 1. resolve the token through the [`VersionMapping`]
//! 2. return early if the version is already complete
//! 3. purge a stale partial directory left by an interrupted run
//! 4. download the archive into a private temporary directory
//! 5. extract it into a second temporary directory
//! 6. find the `jdk*` distribution directory inside it
//! 7. move its entries into the target
//! 8. drop the temporary directories
//! 9. verify the entry point exists
//!
//! Failures in steps 4 to 7 remove the target directory, so the registry
//! never reports a half-populated install as the result of a failed run. A
//! verification failure keeps the directory for inspection; the next install
//! treats it as a stale partial and starts over.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::arch::Arch;
use super::archive::{Decompressor, set_executable_permissions};
use super::download::Downloader;
use super::mapping::VersionMapping;
use super::paths::{InstallMetadata, JdkvmPaths};
use super::registry::{InstallRegistry, InstalledVersion};
use super::version::VersionId;
use crate::errors::JdkvmError;

/// Prefix of the distribution directory inside JDK archives.
pub const DISTRIBUTION_PREFIX: &str = "jdk";

/// Result of [`Installer::install`].
#[derive(Debug)]
pub struct Installation {
    /// The complete install.
    pub installed: InstalledVersion,
    /// True when nothing was downloaded because the version was already complete.
    pub already_installed: bool,
}

/// Downloads and installs JDK releases under a managed root.
pub struct Installer<'a, D, X> {
    paths: &'a JdkvmPaths,
    mapping: &'a VersionMapping,
    mirror: Option<&'a str>,
    downloader: D,
    decompressor: X,
}

impl<'a, D: Downloader, X: Decompressor> Installer<'a, D, X> {
    /// Creates an installer.
    pub fn new(
        paths: &'a JdkvmPaths,
        mapping: &'a VersionMapping,
        downloader: D,
        decompressor: X,
    ) -> Self {
        Self {
            paths,
            mapping,
            mirror: None,
            downloader,
            decompressor,
        }
    }

    /// Rebases download URLs onto a mirror.
    #[must_use]
    pub fn with_mirror(mut self, mirror: Option<&'a str>) -> Self {
        self.mirror = mirror;
        self
    }

    /// Installs the release `token` resolves to.
    ///
    /// # Errors
    ///
    /// - `UnsupportedVersion` if the mapping does not know the token
    /// - `ArchitectureMismatch` if the version is installed for another architecture
    /// - `DownloadFailed`, `ExtractFailed`, `MalformedArchive`, `RelocateFailed`
    ///   after removing the target directory
    /// - `VerificationFailed` if the entry point is missing; the directory is kept
    /// - `IoError` if the root or temporary directories cannot be prepared
    pub async fn install(&self, token: &VersionId, arch: Arch) -> Result<Installation, JdkvmError> {
        let release = self.mapping.resolve(token, arch, self.mirror)?;
        let version = release.version.to_string();
        let target = self.paths.version_dir(&release.version);
        let registry = InstallRegistry::new(&self.paths.root);

        if let Some(existing) = registry.lookup(&release.version) {
            if existing.is_complete {
                if existing.architecture != arch {
                    return Err(JdkvmError::ArchitectureMismatch {
                        version,
                        installed: existing.architecture,
                        requested: arch,
                    });
                }
                debug!(version = %version, "already installed");
                return Ok(Installation {
                    installed: existing,
                    already_installed: true,
                });
            }

            warn!(path = %target.display(), "removing incomplete install from a previous run");
            std::fs::remove_dir_all(&target).map_err(|e| {
                JdkvmError::io_error(format!("failed to remove {}", target.display()), e)
            })?;
        }

        std::fs::create_dir_all(&target).map_err(|e| {
            JdkvmError::io_error(format!("failed to create {}", target.display()), e)
        })?;

        let download_dir = temp_dir("jdkvm-download-").inspect_err(|_| remove_target(&target))?;
        let archive_path = download_dir.path().join(release.filename());

        info!(url = %release.url, "downloading Java {version}");
        if let Err(source) = self.downloader.download(&release.url, &archive_path).await {
            remove_target(&target);
            return Err(JdkvmError::DownloadFailed { version, source });
        }

        let extract_dir = temp_dir("jdkvm-extract-").inspect_err(|_| remove_target(&target))?;

        if let Err(source) = self.decompressor.extract(&archive_path, extract_dir.path()) {
            remove_target(&target);
            return Err(JdkvmError::ExtractFailed { version, source });
        }

        let Some(distribution) = find_distribution_dir(extract_dir.path(), DISTRIBUTION_PREFIX)
        else {
            remove_target(&target);
            return Err(JdkvmError::MalformedArchive {
                version,
                prefix: DISTRIBUTION_PREFIX.to_string(),
            });
        };

        if let Err(source) = relocate(&distribution, &target) {
            remove_target(&target);
            return Err(JdkvmError::RelocateFailed {
                version,
                target,
                source,
            });
        }

        for dir in [download_dir, extract_dir] {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), error = %e, "failed to remove temporary directory");
            }
        }

        if let Err(e) = set_executable_permissions(&target) {
            warn!(error = %e, "failed to mark executables");
        }

        let entry_point = JdkvmPaths::entry_point(&target);
        if !entry_point.is_file() {
            return Err(JdkvmError::VerificationFailed {
                version,
                entry_point,
            });
        }

        if let Err(e) = JdkvmPaths::write_metadata(&target, &InstallMetadata::now(arch)) {
            warn!(error = %e, "failed to write install metadata");
        }

        Ok(Installation {
            installed: InstalledVersion {
                version: release.version,
                install_path: target,
                architecture: arch,
                is_complete: true,
            },
            already_installed: false,
        })
    }
}

fn temp_dir(prefix: &str) -> Result<tempfile::TempDir, JdkvmError> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map_err(|e| JdkvmError::io_error("failed to create temporary directory", e))
}

fn remove_target(target: &Path) {
    if let Err(e) = std::fs::remove_dir_all(target) {
        warn!(path = %target.display(), error = %e, "failed to roll back install directory");
    }
}

/// Finds the distribution directory among the top-level entries.
///
/// Names are sorted and the first match wins; several matches are accepted
/// with a warning.
fn find_distribution_dir(extract_dir: &Path, prefix: &str) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(extract_dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(prefix))
        })
        .collect();
    candidates.sort();

    if candidates.len() > 1 {
        warn!(
            count = candidates.len(),
            chosen = %candidates[0].display(),
            "archive has several '{prefix}*' directories, using the first"
        );
    }
    candidates.into_iter().next()
}

/// Moves every entry of `from` into `to`. Renames where possible and falls
/// back to copy and delete across filesystems.
fn relocate(from: &Path, to: &Path) -> anyhow::Result<()> {
    let entries =
        std::fs::read_dir(from).with_context(|| format!("Failed to read {}", from.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read {}", from.display()))?;
        let source = entry.path();
        let dest = to.join(entry.file_name());

        if std::fs::rename(&source, &dest).is_ok() {
            continue;
        }

        debug!(path = %source.display(), "rename failed, copying instead");
        copy_recursive(&source, &dest)?;
        let removed = if source.is_dir() {
            std::fs::remove_dir_all(&source)
        } else {
            std::fs::remove_file(&source)
        };
        removed.with_context(|| format!("Failed to remove {}", source.display()))?;
    }

    Ok(())
}

fn copy_recursive(from: &Path, to: &Path) -> anyhow::Result<()> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to walk {}", from.display()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .context("Walked outside the source directory")?;
        let dest = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&dest)
                .with_context(|| format!("Failed to create directory: {}", dest.display()))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    dest.display()
                )
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, dest: &Path) -> anyhow::Result<()> {
    let target =
        std::fs::read_link(link).with_context(|| format!("Failed to read {}", link.display()))?;
    std::os::unix::fs::symlink(&target, dest)
        .with_context(|| format!("Failed to create symlink {}", dest.display()))
}

#[cfg(windows)]
fn copy_symlink(link: &Path, dest: &Path) -> anyhow::Result<()> {
    std::fs::copy(link, dest)
        .map(|_| ())
        .with_context(|| format!("Failed to copy {}", link.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::archive::ArchiveDecompressor;
    use crate::toolchain::paths::ENTRY_POINT;
    use std::cell::Cell;
    use std::io::Write;

    const MAPPING: &str = r#"{
        "17": { "latest": "17.0.11", "url": "https://downloads.example/jdk17.zip", "short": "17" }
    }"#;

    /// Serves a fixture archive (or fails) and counts calls.
    struct FakeDownloader {
        fixture: Option<PathBuf>,
        calls: Cell<u32>,
    }

    impl FakeDownloader {
        fn serving(fixture: &Path) -> Self {
            Self {
                fixture: Some(fixture.to_path_buf()),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fixture: None,
                calls: Cell::new(0),
            }
        }
    }

    impl Downloader for &FakeDownloader {
        async fn download(&self, _url: &str, dest: &Path) -> anyhow::Result<()> {
            self.calls.set(self.calls.get() + 1);
            match &self.fixture {
                Some(fixture) => {
                    std::fs::copy(fixture, dest)?;
                    Ok(())
                }
                None => anyhow::bail!("connection refused"),
            }
        }
    }

    struct FailingDecompressor;

    impl Decompressor for FailingDecompressor {
        fn extract(&self, _archive: &Path, _dest: &Path) -> anyhow::Result<()> {
            anyhow::bail!("corrupt archive")
        }
    }

    /// Unpacks a distribution whose `release` file collides with a
    /// non-empty directory already present in the install target.
    struct CollidingDecompressor {
        target: PathBuf,
    }

    impl Decompressor for CollidingDecompressor {
        fn extract(&self, _archive: &Path, dest: &Path) -> anyhow::Result<()> {
            let dist = dest.join("jdk-17.0.11+9");
            std::fs::create_dir_all(dist.join("lib"))?;
            std::fs::write(dist.join("lib/modules"), b"content")?;
            std::fs::write(dist.join("release"), b"JAVA_VERSION=\"17.0.11\"")?;
            std::fs::create_dir_all(self.target.join("release/keep"))?;
            Ok(())
        }
    }

    fn write_zip(path: &Path, entries: &[&str]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for name in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(b"content").unwrap();
        }
        zip.finish().unwrap();
    }

    fn jdk_zip(dir: &Path) -> PathBuf {
        let archive = dir.join("fixture.zip");
        write_zip(
            &archive,
            &[
                &format!("jdk-17.0.11+9/{ENTRY_POINT}"),
                "jdk-17.0.11+9/lib/modules",
                "jdk-17.0.11+9/release",
            ],
        );
        archive
    }

    struct Fixture {
        _temp: tempfile::TempDir,
        paths: JdkvmPaths,
        mapping: VersionMapping,
        fixtures: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = tempfile::tempdir().unwrap();
        let fixtures = temp.path().join("fixtures");
        std::fs::create_dir_all(&fixtures).unwrap();
        Fixture {
            paths: JdkvmPaths::with_root(temp.path().join("root")),
            mapping: VersionMapping::from_json(MAPPING).unwrap(),
            fixtures,
            _temp: temp,
        }
    }

    fn v(s: &str) -> VersionId {
        VersionId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn installs_alias_into_versioned_directory() {
        let f = fixture();
        let downloader = FakeDownloader::serving(&jdk_zip(&f.fixtures));
        let installer = Installer::new(&f.paths, &f.mapping, &downloader, ArchiveDecompressor);

        let result = installer.install(&v("17"), Arch::X64).await.unwrap();

        let target = f.paths.root.join("v17.0.11");
        assert!(!result.already_installed);
        assert_eq!(result.installed.install_path, target);
        assert!(target.join(ENTRY_POINT).is_file());
        assert!(target.join("lib/modules").is_file());
        assert!(!target.join("jdk-17.0.11+9").exists());

        let registry = InstallRegistry::new(&f.paths.root);
        let found = registry.resolve(&v("17"), Arch::X64).unwrap();
        assert!(found.is_complete);
    }

    #[tokio::test]
    async fn second_install_is_a_no_op() {
        let f = fixture();
        let downloader = FakeDownloader::serving(&jdk_zip(&f.fixtures));
        let installer = Installer::new(&f.paths, &f.mapping, &downloader, ArchiveDecompressor);

        installer.install(&v("17"), Arch::X64).await.unwrap();
        let again = installer.install(&v("17.0.11"), Arch::X64).await.unwrap();

        assert!(again.already_installed);
        assert_eq!(downloader.calls.get(), 1);
    }

    #[tokio::test]
    async fn complete_install_for_other_arch_is_a_mismatch() {
        let f = fixture();
        let downloader = FakeDownloader::serving(&jdk_zip(&f.fixtures));
        let installer = Installer::new(&f.paths, &f.mapping, &downloader, ArchiveDecompressor);

        installer.install(&v("17"), Arch::X64).await.unwrap();
        let err = installer.install(&v("17"), Arch::Arm64).await.unwrap_err();

        assert!(matches!(err, JdkvmError::ArchitectureMismatch { .. }));
        assert_eq!(downloader.calls.get(), 1);
    }

    #[tokio::test]
    async fn unknown_version_is_unsupported() {
        let f = fixture();
        let downloader = FakeDownloader::failing();
        let installer = Installer::new(&f.paths, &f.mapping, &downloader, ArchiveDecompressor);

        let err = installer.install(&v("99"), Arch::X64).await.unwrap_err();

        assert!(matches!(err, JdkvmError::UnsupportedVersion { .. }));
        assert_eq!(downloader.calls.get(), 0);
        assert!(!f.paths.root.exists());
    }

    #[tokio::test]
    async fn download_failure_rolls_back() {
        let f = fixture();
        let downloader = FakeDownloader::failing();
        let installer = Installer::new(&f.paths, &f.mapping, &downloader, ArchiveDecompressor);

        let err = installer.install(&v("17"), Arch::X64).await.unwrap_err();

        assert!(matches!(err, JdkvmError::DownloadFailed { .. }));
        assert!(!f.paths.root.join("v17.0.11").exists());
    }

    #[tokio::test]
    async fn extraction_failure_leaves_no_trace() {
        let f = fixture();
        let downloader = FakeDownloader::serving(&jdk_zip(&f.fixtures));
        let installer = Installer::new(&f.paths, &f.mapping, &downloader, FailingDecompressor);

        let err = installer.install(&v("17"), Arch::X64).await.unwrap_err();

        assert!(matches!(err, JdkvmError::ExtractFailed { .. }));
        assert!(err.is_rolled_back());
        let registry = InstallRegistry::new(&f.paths.root);
        assert!(registry.scan().unwrap().is_empty());
    }

    #[tokio::test]
    async fn relocation_failure_removes_target() {
        let f = fixture();
        let downloader = FakeDownloader::serving(&jdk_zip(&f.fixtures));
        let decompressor = CollidingDecompressor {
            target: f.paths.root.join("v17.0.11"),
        };
        let installer = Installer::new(&f.paths, &f.mapping, &downloader, decompressor);

        let err = installer.install(&v("17"), Arch::X64).await.unwrap_err();

        assert!(matches!(err, JdkvmError::RelocateFailed { .. }));
        assert!(err.is_rolled_back());
        assert!(!f.paths.root.join("v17.0.11").exists());
        let registry = InstallRegistry::new(&f.paths.root);
        assert!(registry.scan().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_partial_install_is_replaced() {
        let f = fixture();
        let stale = f.paths.root.join("v17.0.11");
        std::fs::create_dir_all(stale.join("lib")).unwrap();
        std::fs::write(stale.join("lib/leftover"), b"stale").unwrap();

        let downloader = FakeDownloader::serving(&jdk_zip(&f.fixtures));
        let installer = Installer::new(&f.paths, &f.mapping, &downloader, ArchiveDecompressor);

        let result = installer.install(&v("17"), Arch::X64).await.unwrap();

        assert!(!result.already_installed);
        assert_eq!(downloader.calls.get(), 1);
        assert!(stale.join(ENTRY_POINT).is_file());
        assert!(!stale.join("lib/leftover").exists());
    }

    #[tokio::test]
    async fn archive_without_distribution_dir_is_malformed() {
        let f = fixture();
        let archive = f.fixtures.join("flat.zip");
        write_zip(&archive, &[&format!("openjdk/{ENTRY_POINT}")]);
        let downloader = FakeDownloader::serving(&archive);
        let installer = Installer::new(&f.paths, &f.mapping, &downloader, ArchiveDecompressor);

        let err = installer.install(&v("17"), Arch::X64).await.unwrap_err();

        assert!(matches!(err, JdkvmError::MalformedArchive { .. }));
        assert!(!f.paths.root.join("v17.0.11").exists());
    }

    #[tokio::test]
    async fn missing_entry_point_keeps_directory() {
        let f = fixture();
        let archive = f.fixtures.join("nobin.zip");
        write_zip(&archive, &["jdk-17.0.11+9/release"]);
        let downloader = FakeDownloader::serving(&archive);
        let installer = Installer::new(&f.paths, &f.mapping, &downloader, ArchiveDecompressor);

        let err = installer.install(&v("17"), Arch::X64).await.unwrap_err();

        assert!(matches!(err, JdkvmError::VerificationFailed { .. }));
        let target = f.paths.root.join("v17.0.11");
        assert!(target.join("release").is_file());
        let registry = InstallRegistry::new(&f.paths.root);
        assert!(!registry.lookup(&v("17.0.11")).unwrap().is_complete);
    }

    #[test]
    fn first_sorted_distribution_dir_wins() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["jdk-b", "jdk-a", "docs"] {
            std::fs::create_dir_all(temp.path().join(name)).unwrap();
        }
        std::fs::write(temp.path().join("jdk-file"), b"x").unwrap();

        let chosen = find_distribution_dir(temp.path(), DISTRIBUTION_PREFIX).unwrap();
        assert_eq!(chosen, temp.path().join("jdk-a"));
        assert!(find_distribution_dir(&temp.path().join("docs"), DISTRIBUTION_PREFIX).is_none());
    }

    #[test]
    fn copy_fallback_preserves_tree() {
        let temp = tempfile::tempdir().unwrap();
        let from = temp.path().join("from");
        std::fs::create_dir_all(from.join("bin")).unwrap();
        std::fs::write(from.join("bin/java"), b"java").unwrap();
        std::fs::write(from.join("release"), b"r").unwrap();

        let to = temp.path().join("to");
        copy_recursive(&from, &to).unwrap();

        assert_eq!(std::fs::read(to.join("bin/java")).unwrap(), b"java");
        assert!(to.join("release").is_file());
    }
}
