//! Discovery of installed versions under the managed root.
//!
//! The registry never creates anything: it reads `<root>/v<exact>/`
//! directories and reports each one as an [`InstalledVersion`]. A directory
//! without its entry point is a stale partial install. Resolution treats it as
//! absent, but it is still listed by [`InstallRegistry::scan`] so that the
//! installer and `uninstall --force` can clean it up.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::arch::Arch;
use super::paths::JdkvmPaths;
use super::version::VersionId;
use crate::errors::JdkvmError;

/// A version directory found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    /// Exact version parsed from the directory name.
    pub version: VersionId,
    /// Absolute path of the version directory.
    pub install_path: PathBuf,
    /// Architecture recorded at install time, or the host architecture.
    pub architecture: Arch,
    /// Whether the entry point exists.
    pub is_complete: bool,
}

impl InstalledVersion {
    /// Reads the version directory at `install_path`.
    ///
    /// Returns `None` if the directory name is not `v<exact>`.
    #[must_use]
    pub fn inspect(install_path: &Path) -> Option<Self> {
        let name = install_path.file_name()?.to_str()?;
        let version = VersionId::from_dir_name(name)?;
        let architecture =
            JdkvmPaths::read_metadata(install_path).map_or_else(Arch::detect, |m| m.architecture);
        Some(Self {
            version,
            install_path: install_path.to_path_buf(),
            architecture,
            is_complete: JdkvmPaths::entry_point(install_path).is_file(),
        })
    }

    /// Executable directory of this install.
    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        JdkvmPaths::bin_dir(&self.install_path)
    }
}

/// Read-only view of the versions installed under a root.
#[derive(Debug, Clone)]
pub struct InstallRegistry {
    root: PathBuf,
}

impl InstallRegistry {
    /// Creates a registry over `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The managed root this registry scans.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists every version directory, newest first, complete or not.
    ///
    /// A missing root is an empty registry. Entries whose names are not
    /// `v<exact>` are skipped.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the root exists but cannot be read.
    pub fn scan(&self) -> Result<Vec<InstalledVersion>, JdkvmError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            JdkvmError::io_error(format!("failed to read {}", self.root.display()), e)
        })?;

        let mut installed = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                JdkvmError::io_error(format!("failed to read {}", self.root.display()), e)
            })?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match InstalledVersion::inspect(&path) {
                Some(version) => installed.push(version),
                None => debug!(path = %path.display(), "skipping unrecognised directory"),
            }
        }

        installed.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(installed)
    }

    /// Lists complete installs only, newest first.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the root cannot be read.
    pub fn complete(&self) -> Result<Vec<InstalledVersion>, JdkvmError> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|v| v.is_complete)
            .collect())
    }

    /// Resolves a token to a complete install of the given architecture.
    ///
    /// Exact tokens need the full triple; aliases pick the newest install with
    /// the same major version.
    ///
    /// # Errors
    ///
    /// Returns `NotInstalled` if nothing matches, or `IoError` if the root
    /// cannot be read.
    pub fn resolve(&self, token: &VersionId, arch: Arch) -> Result<InstalledVersion, JdkvmError> {
        self.scan()?
            .into_iter()
            .find(|v| v.is_complete && v.architecture == arch && token.matches(&v.version))
            .ok_or_else(|| JdkvmError::not_installed(token.raw(), arch))
    }

    /// Whether a token resolves to a complete install. Never fails.
    #[must_use]
    pub fn is_installed(&self, token: &str, arch: Arch) -> bool {
        VersionId::parse(token)
            .and_then(|id| self.resolve(&id, arch))
            .is_ok()
    }

    /// Looks up the directory for an exact version, complete or not.
    #[must_use]
    pub fn lookup(&self, version: &VersionId) -> Option<InstalledVersion> {
        let path = JdkvmPaths::with_root(&self.root).version_dir(version);
        if path.is_dir() {
            InstalledVersion::inspect(&path)
        } else {
            None
        }
    }

    /// Finds the complete install that `java_home` points at, if it is one of ours.
    #[must_use]
    pub fn active(&self, java_home: Option<&Path>) -> Option<InstalledVersion> {
        let java_home = java_home?;
        if java_home.parent()? != self.root {
            return None;
        }
        InstalledVersion::inspect(java_home).filter(|v| v.is_complete)
    }
}
