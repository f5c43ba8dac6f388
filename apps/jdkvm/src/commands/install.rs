//! Install command for the jdkvm CLI.
//!
//! Downloads a JDK release from the version mapping and installs it under
//! the managed root. Installing does not activate it.
//!
//! ## Usage
//!
//! ```bash
//! jdkvm install 17          # Newest 17.x from the mapping, host architecture
//! jdkvm install 17.0.11 64  # Exact version, 64-bit
//! jdkvm i 21 arm64          # Short alias
//! ```

use anyhow::Result;
use clap::Args;

use crate::settings;
use crate::toolchain::archive::ArchiveDecompressor;
use crate::toolchain::download::HttpDownloader;
use crate::toolchain::installer::Installer;
use crate::toolchain::mapping::VersionMapping;
use crate::toolchain::{JdkvmPaths, VersionId};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Version to install: a major alias ("17") or an exact version ("17.0.11").
    pub version: String,

    /// Architecture: 32, 64 or arm64. Defaults to the host architecture.
    pub arch: Option<String>,
}

/// Executes the install command.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, the version is not in the
/// mapping, or any install step fails.
pub async fn execute(args: &InstallArgs) -> Result<()> {
    let token = VersionId::parse(&args.version)?;
    let arch = super::resolve_arch(args.arch.as_deref())?;
    let paths = JdkvmPaths::new()?;

    let settings = settings::load_or_init(&paths.settings_file())?;
    let mapping = VersionMapping::load(&paths)?;
    let downloader = HttpDownloader::new(&settings.download_config())?;

    println!("Installing Java {} ({arch})...", args.version);

    let installer = Installer::new(&paths, &mapping, downloader, ArchiveDecompressor)
        .with_mirror(settings.mirror.as_deref());
    let result = match installer.install(&token, arch).await {
        Ok(result) => result,
        Err(e) => {
            if e.is_rolled_back() {
                eprintln!("Install rolled back; nothing was left under {}.", paths.root.display());
            }
            return Err(e.into());
        }
    };
    let version = &result.installed.version;

    if result.already_installed {
        println!("Java {version} ({arch}) is already installed.");
    } else {
        println!(
            "Java {version} ({arch}) installed to {}",
            result.installed.install_path.display()
        );
    }
    println!("Run 'jdkvm use {version}' to start using it.");

    Ok(())
}
