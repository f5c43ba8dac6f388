//! Proxy command for the jdkvm CLI.
//!
//! ## Usage
//!
//! ```bash
//! jdkvm proxy                         # Show the proxy
//! jdkvm proxy http://10.0.0.1:3128    # Use a proxy for downloads
//! jdkvm proxy none                    # Connect directly
//! ```

use anyhow::Result;
use clap::Args;

use crate::settings;
use crate::toolchain::JdkvmPaths;

/// Arguments for the proxy command.
#[derive(Args)]
pub struct ProxyArgs {
    /// Proxy URL, or "none" to disable.
    pub url: Option<String>,
}

/// Executes the proxy command.
///
/// # Errors
///
/// Returns an error if the settings file cannot be written.
pub fn execute(args: &ProxyArgs) -> Result<()> {
    let path = JdkvmPaths::new()?.settings_file();
    let mut settings = settings::load_or_init(&path)?;

    if let Some(url) = &args.url {
        settings.set_proxy(url);
        settings::save(&path, &settings)?;
    }

    match &settings.proxy {
        Some(proxy) => println!("Current proxy: {proxy}"),
        None => println!("Current proxy: none"),
    }

    Ok(())
}
