//! Error types for the jdkvm CLI.
//!
//! `JdkvmError` covers every failure of the version lifecycle: resolving a
//! token, the install pipeline, uninstalling, and settings I/O. Collaborators
//! (HTTP, archive extraction, environment persistence) report `anyhow::Error`,
//! which is attached as the `source` of the variant for the step that failed.
//!
//! A failed persistence step during activation is not an error: it is carried
//! as a [`PersistPartial`] warning next to a successful result.

use std::path::PathBuf;
use thiserror::Error;

use crate::toolchain::arch::Arch;

/// Consolidated error type for jdkvm operations.
#[derive(Debug, Error)]
pub enum JdkvmError {
    /// The token is not known to the version mapping.
    #[error("unsupported version: {token}. Run 'jdkvm list available' to see supported versions.")]
    UnsupportedVersion {
        /// The token the user asked for.
        token: String,
    },

    /// No complete installation matches the token.
    #[error("Java version {token} ({arch}) is not installed. Run 'jdkvm install {token}' first.")]
    NotInstalled {
        /// The token the user asked for.
        token: String,
        /// Architecture that was searched.
        arch: Arch,
    },

    /// No install of the token exists for any architecture.
    #[error("Java version {token} is not installed for any architecture.")]
    NotInstalledAnywhere {
        /// The token the user asked for.
        token: String,
    },

    /// The archive could not be downloaded.
    #[error("download of Java {version} failed")]
    DownloadFailed {
        /// Exact version being installed.
        version: String,
        #[source]
        source: anyhow::Error,
    },

    /// The archive could not be extracted.
    #[error("extraction of Java {version} failed")]
    ExtractFailed {
        /// Exact version being installed.
        version: String,
        #[source]
        source: anyhow::Error,
    },

    /// The extracted archive has no distribution directory.
    #[error("archive for Java {version} has no top-level '{prefix}*' directory")]
    MalformedArchive {
        /// Exact version being installed.
        version: String,
        /// Directory prefix that was expected.
        prefix: String,
    },

    /// Moving the extracted files into place failed.
    #[error("failed to move Java {version} into {}", target.display())]
    RelocateFailed {
        /// Exact version being installed.
        version: String,
        /// Install directory that was rolled back.
        target: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The entry point is missing after relocation. The directory is kept.
    #[error("Java {version} installed but {} is missing", entry_point.display())]
    VerificationFailed {
        /// Exact version being installed.
        version: String,
        /// Path of the missing executable.
        entry_point: PathBuf,
    },

    /// The version directory exists for another architecture.
    #[error(
        "Java {version} is already installed for {installed}; uninstall it before installing {requested}"
    )]
    ArchitectureMismatch {
        /// Exact version.
        version: String,
        /// Architecture recorded for the existing install.
        installed: Arch,
        /// Architecture that was requested.
        requested: Arch,
    },

    /// The version mapping file could not be read or parsed.
    #[error("version mapping error: {message}")]
    Mapping {
        /// Description of the problem.
        message: String,
    },

    /// Invalid command line arguments.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// Description of what was invalid.
        message: String,
    },

    /// Generic filesystem failure.
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O operation that failed.
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl JdkvmError {
    /// Creates a new `UnsupportedVersion` error.
    #[must_use]
    pub fn unsupported_version(token: impl Into<String>) -> Self {
        Self::UnsupportedVersion {
            token: token.into(),
        }
    }

    /// Creates a new `NotInstalled` error.
    #[must_use]
    pub fn not_installed(token: impl Into<String>, arch: Arch) -> Self {
        Self::NotInstalled {
            token: token.into(),
            arch,
        }
    }

    /// Creates a new `NotInstalledAnywhere` error.
    #[must_use]
    pub fn not_installed_anywhere(token: impl Into<String>) -> Self {
        Self::NotInstalledAnywhere {
            token: token.into(),
        }
    }

    /// Creates a new `Mapping` error.
    #[must_use]
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidArguments` error.
    #[must_use]
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Creates a new `IoError` from an I/O error with context.
    #[must_use]
    pub fn io_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            message: message.into(),
            source,
        }
    }

    /// Returns true for the install pipeline failures that roll back the target directory.
    #[must_use]
    pub fn is_rolled_back(&self) -> bool {
        matches!(
            self,
            Self::DownloadFailed { .. }
                | Self::ExtractFailed { .. }
                | Self::MalformedArchive { .. }
                | Self::RelocateFailed { .. }
        )
    }
}

/// Activation succeeded for the current session but could not be persisted.
#[derive(Debug, Error)]
#[error("could not persist {variable}: {reason}")]
pub struct PersistPartial {
    /// Name of the variable that failed to persist.
    pub variable: String,
    /// Why it failed.
    pub reason: String,
}
