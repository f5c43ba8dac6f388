//! List command for the jdkvm CLI.
//!
//! ## Usage
//!
//! ```bash
//! jdkvm list              # Installed versions (default)
//! jdkvm ls available      # Aliases from the version mapping
//! ```
//!
//! ## Output Format
//!
//! ```text
//! Installed Java versions:
//!
//! * 21.0.3    (active, 64-bit, installed today)
//!   17.0.11   (64-bit, installed 3 weeks ago)
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::toolchain::Arch;
use crate::toolchain::activator::JAVA_HOME;
use crate::toolchain::mapping::VersionMapping;
use crate::toolchain::paths::JdkvmPaths;
use crate::toolchain::registry::{InstallRegistry, InstalledVersion};

/// What to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    /// Complete installs under the managed root.
    #[default]
    Installed,
    /// Aliases the version mapping can install.
    Available,
}

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Installed versions or available aliases.
    #[clap(value_enum, default_value_t = ListKind::Installed)]
    pub kind: ListKind,
}

/// Executes the list command.
///
/// # Errors
///
/// Returns an error if the managed root cannot be read or the mapping file
/// is malformed.
pub fn execute(args: &ListArgs) -> Result<()> {
    let paths = JdkvmPaths::new()?;
    match args.kind {
        ListKind::Installed => list_installed(&paths),
        ListKind::Available => list_available(&paths),
    }
}

fn list_installed(paths: &JdkvmPaths) -> Result<()> {
    let registry = InstallRegistry::new(&paths.root);
    let versions = registry.complete()?;

    if versions.is_empty() {
        println!("No Java versions installed.");
        println!();
        println!("Run 'jdkvm list available' to see what can be installed.");
        return Ok(());
    }

    let java_home = std::env::var_os(JAVA_HOME).map(std::path::PathBuf::from);
    let active = registry.active(java_home.as_deref());

    println!("Installed Java versions:");
    println!();
    for version in &versions {
        let is_active = active
            .as_ref()
            .is_some_and(|a| a.install_path == version.install_path);
        println!("{}", format_installed(version, is_active));
    }

    Ok(())
}

fn format_installed(version: &InstalledVersion, is_active: bool) -> String {
    let mut info = Vec::new();
    if is_active {
        info.push("active".to_string());
    }
    info.push(version.architecture.to_string());
    if let Some(meta) = JdkvmPaths::read_metadata(&version.install_path) {
        info.push(format!("installed {}", meta.installed_ago()));
    }

    let marker = if is_active { "*" } else { " " };
    format!(
        "{marker} {:<10}({})",
        version.version.to_string(),
        info.join(", ")
    )
}

fn list_available(paths: &JdkvmPaths) -> Result<()> {
    let mapping = VersionMapping::load(paths)?;

    if mapping.is_empty() {
        println!("No version mapping available.");
        println!();
        println!(
            "Place a version_mapping.json in {} or set JDKVM_VERSION_MAPPING.",
            paths.root.display()
        );
        return Ok(());
    }

    let registry = InstallRegistry::new(&paths.root);
    let host = Arch::detect();

    println!("Available Java versions:");
    println!();
    for (alias, entry) in mapping.aliases() {
        let installed = if registry.is_installed(&entry.latest, host) {
            ", installed"
        } else {
            ""
        };
        println!("  {alias:<4}(latest: {}{installed})", entry.latest);
    }

    Ok(())
}
