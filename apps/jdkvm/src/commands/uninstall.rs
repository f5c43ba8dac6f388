//! Uninstall command for the jdkvm CLI.
//!
//! Removes an installed JDK. Removing the active version is allowed; the
//! environment keeps pointing at the deleted directory until another version
//! is activated.
//!
//! ## Usage
//!
//! ```bash
//! jdkvm uninstall 17.0.11
//! jdkvm rm 17
//! jdkvm uninstall --force 11.0.23   # Remove an incomplete install
//! ```

use anyhow::Result;
use clap::Args;

use crate::toolchain::activator::JAVA_HOME;
use crate::toolchain::uninstaller::Uninstaller;
use crate::toolchain::{InstallRegistry, JdkvmPaths, VersionId};

/// Arguments for the uninstall command.
#[derive(Args)]
pub struct UninstallArgs {
    /// Version to remove: an alias ("17") or an exact version ("17.0.11").
    pub version: String,

    /// Also remove an incomplete install of an exact version.
    #[clap(short = 'f', long = "force", action = clap::ArgAction::SetTrue)]
    pub force: bool,
}

/// Executes the uninstall command.
///
/// # Errors
///
/// Returns an error if nothing matches the version or the directory cannot
/// be removed.
pub fn execute(args: &UninstallArgs) -> Result<()> {
    let token = VersionId::parse(&args.version)?;
    let paths = JdkvmPaths::new()?;

    let java_home = std::env::var_os(JAVA_HOME).map(std::path::PathBuf::from);
    let active = InstallRegistry::new(&paths.root).active(java_home.as_deref());

    let removed = Uninstaller::new(&paths.root).uninstall(&token, args.force)?;

    if active.is_some_and(|a| a.install_path == removed.install_path) {
        eprintln!(
            "Warning: Java {} was the active version. Run 'jdkvm use <version>' to switch.",
            removed.version
        );
    }

    println!(
        "Java {} ({}) uninstalled.",
        removed.version, removed.architecture
    );

    Ok(())
}
