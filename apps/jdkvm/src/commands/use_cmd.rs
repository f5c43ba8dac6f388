//! Use command for the jdkvm CLI.
//!
//! Activates an installed JDK: `JAVA_HOME` points at it and its `bin`
//! directory leads `PATH`. The change is persisted for new shells; if that
//! fails the command still succeeds and prints a warning.
//!
//! ## Usage
//!
//! ```bash
//! jdkvm use 17            # Newest installed 17.x
//! jdkvm use 17.0.11 64    # Exact version and architecture
//! jdkvm u 21
//! ```

use anyhow::Result;
use clap::Args;

use crate::toolchain::activator::{Activator, PATH, ProcessEnv};
use crate::toolchain::conflict::{detect_java_conflict, format_conflict_warning};
use crate::toolchain::env_store::user_env_store;
use crate::toolchain::{InstallRegistry, JdkvmPaths, VersionId};

/// Arguments for the use command.
#[derive(Args)]
pub struct UseArgs {
    /// Installed version to activate: an alias ("17") or an exact version.
    pub version: String,

    /// Architecture: 32, 64 or arm64. Defaults to the host architecture.
    pub arch: Option<String>,
}

/// Executes the use command.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or no complete install
/// matches. Persistence failures are printed as warnings.
pub fn execute(args: &UseArgs) -> Result<()> {
    let token = VersionId::parse(&args.version)?;
    let arch = super::resolve_arch(args.arch.as_deref())?;
    let paths = JdkvmPaths::new()?;
    let registry = InstallRegistry::new(&paths.root);
    let store = user_env_store();

    let activation =
        Activator::new(&registry, store.as_ref()).activate(&token, arch, &mut ProcessEnv)?;
    let active = &activation.version;

    println!(
        "Now using Java {} ({})",
        active.version, active.architecture
    );
    println!("  JAVA_HOME={}", active.install_path.display());

    if activation.warnings.is_empty() {
        println!(
            "Saved to {}. Open a new terminal to pick up the change.",
            store.location()
        );
    } else {
        for warning in &activation.warnings {
            eprintln!("Warning: {warning}");
        }
        eprintln!("The change applies to this session only.");
    }

    if let Some(conflict) =
        detect_java_conflict(&active.bin_dir(), std::env::var_os(PATH).as_deref())
    {
        eprintln!();
        eprintln!("{}", format_conflict_warning(&conflict));
    }

    Ok(())
}
