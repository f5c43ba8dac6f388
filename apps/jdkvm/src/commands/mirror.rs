//! Mirror command for the jdkvm CLI.
//!
//! A mirror replaces the default distribution base in download URLs.
//!
//! ## Usage
//!
//! ```bash
//! jdkvm mirror                                  # Show the mirror
//! jdkvm mirror https://mirrors.example/adoptium # Download through a mirror
//! jdkvm mirror none                             # Use the mapping URLs as-is
//! ```

use anyhow::Result;
use clap::Args;

use crate::settings;
use crate::toolchain::JdkvmPaths;
use crate::toolchain::mapping::DEFAULT_DIST_BASE;

/// Arguments for the mirror command.
#[derive(Args)]
pub struct MirrorArgs {
    /// Mirror base URL, or "none" to disable.
    pub url: Option<String>,
}

/// Executes the mirror command.
///
/// # Errors
///
/// Returns an error if the settings file cannot be written.
pub fn execute(args: &MirrorArgs) -> Result<()> {
    let path = JdkvmPaths::new()?.settings_file();
    let mut settings = settings::load_or_init(&path)?;

    if let Some(url) = &args.url {
        settings.set_mirror(url);
        settings::save(&path, &settings)?;
    }

    match &settings.mirror {
        Some(mirror) => println!("Current mirror: {mirror}"),
        None => println!("Current mirror: none (downloads from {DEFAULT_DIST_BASE})"),
    }

    Ok(())
}
