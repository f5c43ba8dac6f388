//! Path management for the managed root.
//!
//! The root defaults to `~/.jdkvm/` and can be overridden with `JDKVM_HOME`.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.jdkvm/                   # Managed root (or JDKVM_HOME)
//!   v17.0.11/                 # One directory per exact version
//!     bin/java                # Entry point; its presence marks a complete install
//!     .jdkvm.json             # Install metadata (architecture, date)
//!   v21.0.3/
//!     ...
//!   settings.txt              # Proxy, mirror and TLS settings
//!   version_mapping.json      # Optional alias -> release mapping
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::arch::Arch;
use super::version::VersionId;

/// Environment variable to override the managed root.
pub const JDKVM_HOME_ENV: &str = "JDKVM_HOME";

/// Metadata file written into each installed version directory.
const METADATA_FILE: &str = ".jdkvm.json";

/// Settings file name at the managed root.
const SETTINGS_FILE: &str = "settings.txt";

/// Version mapping file name.
pub const MAPPING_FILE: &str = "version_mapping.json";

/// Executable whose presence marks a complete install, relative to the version directory.
#[cfg(windows)]
pub const ENTRY_POINT: &str = "bin/java.exe";
#[cfg(not(windows))]
pub const ENTRY_POINT: &str = "bin/java";

/// Metadata recorded for an installed version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallMetadata {
    /// Seconds since the Unix epoch at install time.
    pub installed_at: u64,
    /// Architecture the archive was downloaded for.
    pub architecture: Arch,
}

impl InstallMetadata {
    /// Creates metadata stamped with the current time.
    #[must_use]
    pub fn now(architecture: Arch) -> Self {
        let installed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self {
            installed_at,
            architecture,
        }
    }

    /// Returns a human-readable relative time such as "3 days ago".
    #[must_use]
    pub fn installed_ago(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        format_days_ago(now.saturating_sub(self.installed_at) / 86_400)
    }
}

fn format_days_ago(days: u64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        2..=13 => format!("{days} days ago"),
        14..=59 => format!("{} weeks ago", days / 7),
        60..=364 => format!("{} months ago", days / 30),
        _ => format!("{} years ago", days / 365),
    }
}

/// Paths under the managed root.
#[derive(Debug, Clone)]
pub struct JdkvmPaths {
    /// Managed root (`~/.jdkvm` or `JDKVM_HOME`).
    pub root: PathBuf,
}

impl JdkvmPaths {
    /// Resolves the managed root from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `JDKVM_HOME` is unset and the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let root = if let Some(home) = std::env::var_os(JDKVM_HOME_ENV).filter(|v| !v.is_empty())
        {
            PathBuf::from(home)
        } else {
            dirs::home_dir()
                .context("Cannot determine home directory. Set JDKVM_HOME environment variable.")?
                .join(".jdkvm")
        };

        Ok(Self::with_root(root))
    }

    /// Creates paths for a known root.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Install directory for an exact version (`<root>/v<exact>`).
    #[must_use]
    pub fn version_dir(&self, version: &VersionId) -> PathBuf {
        self.root.join(format!("v{version}"))
    }

    /// Executable directory of an installed version.
    #[must_use]
    pub fn bin_dir(install_path: &Path) -> PathBuf {
        install_path.join("bin")
    }

    /// Path of the entry point executable inside an install directory.
    #[must_use]
    pub fn entry_point(install_path: &Path) -> PathBuf {
        install_path.join(ENTRY_POINT)
    }

    /// Settings file path.
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    /// Version mapping file at the root.
    #[must_use]
    pub fn mapping_file(&self) -> PathBuf {
        self.root.join(MAPPING_FILE)
    }

    /// Writes install metadata into a version directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be serialized or written.
    pub fn write_metadata(install_path: &Path, metadata: &InstallMetadata) -> Result<()> {
        let path = install_path.join(METADATA_FILE);
        let content =
            serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write metadata to {}", path.display()))
    }

    /// Reads install metadata, `None` if missing or unreadable.
    #[must_use]
    pub fn read_metadata(install_path: &Path) -> Option<InstallMetadata> {
        let content = std::fs::read_to_string(install_path.join(METADATA_FILE)).ok()?;
        serde_json::from_str(&content).ok()
    }
}
