//! Current command for the jdkvm CLI.
//!
//! Reports the JDK that `JAVA_HOME` points at, if it is one jdkvm manages.

use anyhow::Result;

use crate::toolchain::activator::{JAVA_HOME, PATH};
use crate::toolchain::conflict::{detect_java_conflict, format_conflict_warning};
use crate::toolchain::{InstallRegistry, JdkvmPaths};

/// Executes the current command.
///
/// # Errors
///
/// Returns an error if the managed root cannot be determined.
pub fn execute() -> Result<()> {
    let paths = JdkvmPaths::new()?;
    let registry = InstallRegistry::new(&paths.root);
    let java_home = std::env::var_os(JAVA_HOME).map(std::path::PathBuf::from);

    let Some(active) = registry.active(java_home.as_deref()) else {
        println!("No current version. Run 'jdkvm use <version>' to set one.");
        return Ok(());
    };

    println!("Java {} ({})", active.version, active.architecture);
    println!("  JAVA_HOME={}", active.install_path.display());

    if let Some(conflict) =
        detect_java_conflict(&active.bin_dir(), std::env::var_os(PATH).as_deref())
    {
        eprintln!();
        eprintln!("{}", format_conflict_warning(&conflict));
    }

    Ok(())
}
