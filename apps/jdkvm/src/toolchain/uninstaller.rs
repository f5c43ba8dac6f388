//! Removal of installed versions.

use std::path::PathBuf;

use tracing::{debug, info};

use super::arch::Arch;
use super::registry::{InstallRegistry, InstalledVersion};
use super::version::VersionId;
use crate::errors::JdkvmError;

/// Removes version directories under a managed root.
#[derive(Debug, Clone)]
pub struct Uninstaller {
    registry: InstallRegistry,
}

impl Uninstaller {
    /// Creates an uninstaller over `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            registry: InstallRegistry::new(root),
        }
    }

    /// Removes the install `token` resolves to and returns what was removed.
    ///
    /// Every architecture is tried, the host's first. With `force`, an exact
    /// token also matches a stale partial install. Whether the version is the
    /// active one is not checked.
    ///
    /// # Errors
    ///
    /// Returns `NotInstalledAnywhere` without touching the filesystem if nothing
    /// matches, or `IoError` if the directory cannot be removed.
    pub fn uninstall(&self, token: &VersionId, force: bool) -> Result<InstalledVersion, JdkvmError> {
        let target = self.find(token, force)?;

        std::fs::remove_dir_all(&target.install_path).map_err(|e| {
            JdkvmError::io_error(
                format!("failed to remove {}", target.install_path.display()),
                e,
            )
        })?;
        info!(path = %target.install_path.display(), "removed Java {}", target.version);

        Ok(target)
    }

    fn find(&self, token: &VersionId, force: bool) -> Result<InstalledVersion, JdkvmError> {
        let host = Arch::detect();
        let order = std::iter::once(host).chain(Arch::ALL.into_iter().filter(|a| *a != host));

        for arch in order {
            match self.registry.resolve(token, arch) {
                Ok(found) => return Ok(found),
                Err(JdkvmError::NotInstalled { .. }) => {
                    debug!(token = token.raw(), %arch, "not installed for this architecture");
                }
                Err(e) => return Err(e),
            }
        }

        if force && let Some(partial) = self.registry.lookup(token) {
            return Ok(partial);
        }

        Err(JdkvmError::not_installed_anywhere(token.raw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::paths::{ENTRY_POINT, InstallMetadata, JdkvmPaths};
    use std::path::Path;

    fn install(root: &Path, name: &str, arch: Arch) -> PathBuf {
        let dir = root.join(name);
        let entry = dir.join(ENTRY_POINT);
        std::fs::create_dir_all(entry.parent().unwrap()).unwrap();
        std::fs::write(entry, b"java").unwrap();
        JdkvmPaths::write_metadata(&dir, &InstallMetadata::now(arch)).unwrap();
        dir
    }

    fn v(s: &str) -> VersionId {
        VersionId::parse(s).unwrap()
    }

    fn listing(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn removes_exact_version() {
        let temp = tempfile::tempdir().unwrap();
        let dir = install(temp.path(), "v17.0.11", Arch::detect());
        install(temp.path(), "v21.0.3", Arch::detect());

        let removed = Uninstaller::new(temp.path())
            .uninstall(&v("17.0.11"), false)
            .unwrap();

        assert_eq!(removed.install_path, dir);
        assert_eq!(listing(temp.path()), ["v21.0.3"]);
    }

    #[test]
    fn finds_installs_of_other_architectures() {
        let temp = tempfile::tempdir().unwrap();
        let other = Arch::ALL
            .into_iter()
            .find(|a| *a != Arch::detect())
            .unwrap();
        install(temp.path(), "v8.0.412", other);

        let removed = Uninstaller::new(temp.path())
            .uninstall(&v("8"), false)
            .unwrap();

        assert_eq!(removed.architecture, other);
        assert!(listing(temp.path()).is_empty());
    }

    #[test]
    fn nonexistent_version_is_not_installed_and_changes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        install(temp.path(), "v17.0.11", Arch::detect());
        let before = listing(temp.path());

        let err = Uninstaller::new(temp.path())
            .uninstall(&v("11.0.23"), false)
            .unwrap_err();

        assert!(matches!(err, JdkvmError::NotInstalledAnywhere { .. }));
        assert_eq!(
            err.to_string(),
            "Java version 11.0.23 is not installed for any architecture."
        );
        assert_eq!(listing(temp.path()), before);
    }

    #[test]
    fn partial_install_needs_force() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("v11.0.23").join("lib")).unwrap();
        let uninstaller = Uninstaller::new(temp.path());

        assert!(matches!(
            uninstaller.uninstall(&v("11.0.23"), false),
            Err(JdkvmError::NotInstalledAnywhere { .. })
        ));
        assert!(temp.path().join("v11.0.23").exists());

        let removed = uninstaller.uninstall(&v("11.0.23"), true).unwrap();
        assert!(!removed.is_complete);
        assert!(!temp.path().join("v11.0.23").exists());
    }
}
