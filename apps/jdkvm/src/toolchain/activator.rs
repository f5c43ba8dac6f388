//! Switching the active JDK.
//!
//! Activation resolves a token against the installed versions (it never
//! installs), then points `JAVA_HOME` and `PATH` at the result. The running
//! process is always updated; persisting the change for future sessions goes
//! through a [`PersistentEnvStore`] and may fail without undoing anything.
//!
//! PATH rewriting drops every entry under the managed root before prepending
//! the new `bin` directory, so switching A then B leaves only B's directory.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::arch::Arch;
use super::env_store::PersistentEnvStore;
use super::registry::{InstallRegistry, InstalledVersion};
use super::version::VersionId;
use crate::errors::{JdkvmError, PersistPartial};

/// Variable naming the active JDK's home directory.
pub const JAVA_HOME: &str = "JAVA_HOME";

/// Executable search path variable.
pub const PATH: &str = "PATH";

/// Environment of the running process.
pub trait SessionEnv {
    /// Reads a variable.
    fn var(&self, name: &str) -> Option<OsString>;
    /// Sets a variable.
    fn set_var(&mut self, name: &str, value: &OsStr);
}

/// The real process environment.
#[derive(Debug, Default)]
pub struct ProcessEnv;

impl SessionEnv for ProcessEnv {
    fn var(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    fn set_var(&mut self, name: &str, value: &OsStr) {
        // SAFETY: jdkvm runs on a current-thread runtime and never spawns
        // threads that read the environment.
        unsafe {
            std::env::set_var(name, value);
        }
    }
}

/// Outcome of a successful activation.
#[derive(Debug)]
pub struct Activation {
    /// The version now active.
    pub version: InstalledVersion,
    /// Persistence failures. Empty when future sessions will see the change.
    pub warnings: Vec<PersistPartial>,
}

/// Returns `current` with every entry under `managed_root` removed and
/// `bin_dir` prepended.
///
/// # Errors
///
/// Returns `InvalidArguments` if `bin_dir` contains the platform's path
/// list separator.
pub fn rewrite_search_path(
    current: Option<&OsStr>,
    managed_root: &Path,
    bin_dir: &Path,
) -> Result<OsString, JdkvmError> {
    let kept = current
        .map(|value| std::env::split_paths(value).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .filter(|entry| !entry.as_os_str().is_empty() && !is_under(entry, managed_root));

    let entries: Vec<PathBuf> = std::iter::once(bin_dir.to_path_buf()).chain(kept).collect();

    std::env::join_paths(entries).map_err(|e| {
        JdkvmError::invalid_arguments(format!(
            "cannot add {} to PATH: {e}",
            bin_dir.display()
        ))
    })
}

#[cfg(windows)]
fn is_under(entry: &Path, root: &Path) -> bool {
    let entry = entry.to_string_lossy().to_lowercase().replace('/', "\\");
    let root = root.to_string_lossy().to_lowercase().replace('/', "\\");
    let root = root.trim_end_matches('\\');
    entry == root || entry.starts_with(&format!("{root}\\"))
}

#[cfg(not(windows))]
fn is_under(entry: &Path, root: &Path) -> bool {
    entry.starts_with(root)
}

/// Resolves versions and switches the environment to them.
pub struct Activator<'a> {
    registry: &'a InstallRegistry,
    store: &'a dyn PersistentEnvStore,
}

impl<'a> Activator<'a> {
    /// Creates an activator over `registry` persisting through `store`.
    #[must_use]
    pub fn new(registry: &'a InstallRegistry, store: &'a dyn PersistentEnvStore) -> Self {
        Self { registry, store }
    }

    /// Activates the newest complete install matching `token` and `arch`.
    ///
    /// Nothing is changed if resolution fails.
    ///
    /// # Errors
    ///
    /// Returns `NotInstalled` if no complete install matches, or
    /// `InvalidArguments` if the install path cannot be placed on PATH.
    pub fn activate(
        &self,
        token: &VersionId,
        arch: Arch,
        session: &mut impl SessionEnv,
    ) -> Result<Activation, JdkvmError> {
        let version = self.registry.resolve(token, arch)?;
        let bin_dir = version.bin_dir();
        let root = self.registry.root();

        let search_path = rewrite_search_path(session.var(PATH).as_deref(), root, &bin_dir)?;

        session.set_var(JAVA_HOME, version.install_path.as_os_str());
        session.set_var(PATH, &search_path);
        debug!(version = %version.version, bin = %bin_dir.display(), "session environment updated");

        let mut warnings = Vec::new();
        let home = version.install_path.display().to_string();
        if let Err(e) = self.store.set_var(JAVA_HOME, &home) {
            warn!(error = %e, "failed to persist {JAVA_HOME}");
            warnings.push(PersistPartial {
                variable: JAVA_HOME.to_string(),
                reason: format!("{e:#}"),
            });
        }
        if let Err(e) = self.store.set_search_path(&bin_dir, root) {
            warn!(error = %e, "failed to persist {PATH}");
            warnings.push(PersistPartial {
                variable: PATH.to_string(),
                reason: format!("{e:#}"),
            });
        }

        Ok(Activation { version, warnings })
    }
}
