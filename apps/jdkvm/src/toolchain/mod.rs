//! JDK lifecycle: resolving, installing, activating and removing versions.
//!
//! ## Module Structure
//!
//! - [`version`] - Version tokens and numeric ordering
//! - [`arch`] - CPU architectures
//! - [`paths`] - Managed root layout and install metadata
//! - [`mapping`] - Alias to release mapping
//! - [`registry`] - Discovery of installed versions
//! - [`download`] - HTTP download with retries
//! - [`archive`] - ZIP and tar.gz extraction
//! - [`installer`] - The install pipeline
//! - [`activator`] - Switching `JAVA_HOME` and `PATH`
//! - [`env_store`] - Persisting the environment for future sessions
//! - [`conflict`] - PATH shadowing detection
//! - [`uninstaller`] - Removing installed versions

pub mod activator;
pub mod arch;
pub mod archive;
pub mod conflict;
pub mod download;
pub mod env_store;
pub mod installer;
pub mod mapping;
pub mod paths;
pub mod registry;
pub mod uninstaller;
pub mod version;

pub use arch::Arch;
pub use paths::JdkvmPaths;
pub use registry::InstallRegistry;
pub use version::VersionId;
