#![warn(clippy::pedantic)]

//! # JDK Version Manager (jdkvm)
//!
//! The `jdkvm` command installs JDK releases side by side under one managed
//! root and switches between them by rewriting `JAVA_HOME` and `PATH`.
//!
//! ## Subcommands
//!
//! - `install` - Download and install a JDK
//! - `use` - Activate an installed JDK
//! - `uninstall` - Remove an installed JDK
//! - `list` - List installed or available versions
//! - `current` - Show the active JDK
//! - `proxy` - Show or set the download proxy
//! - `mirror` - Show or set the download mirror
//! - `version` - Display version information
//!
//! ## Examples
//!
//! ```bash
//! jdkvm install 17
//! jdkvm use 17
//! jdkvm list
//! ```

mod commands;
mod errors;
mod logging;
mod settings;
mod toolchain;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{current, install, list, mirror, proxy, uninstall, use_cmd, version};

/// JDK version manager.
#[derive(Parser)]
#[command(
    name = "jdkvm",
    author,
    version,
    about = "Install and switch between JDK versions",
    after_help = "\
VERSION TOKENS:
    17          Major alias, resolves to the newest 17.x
    17.0.11     Exact version

ARCHITECTURES:
    32, 64, arm64 (default: host architecture)

ENVIRONMENT VARIABLES:
    JDKVM_HOME              Managed root (default: ~/.jdkvm)
    JDKVM_VERSION_MAPPING   Path to version_mapping.json
    RUST_LOG                Diagnostic log filter (default: jdkvm=warn)"
)]
pub struct Cli {
    /// Print diagnostic logs and extra version details.
    #[clap(short = 'v', long = "verbose", global = true, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the jdkvm CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Download and install a JDK.
    ///
    /// Resolves the version through the mapping file, downloads the archive
    /// and installs it under the managed root. Does not activate it.
    #[command(visible_alias = "i")]
    Install(install::InstallArgs),

    /// Activate an installed JDK.
    ///
    /// Sets JAVA_HOME and PATH for this session and saves them for new ones.
    #[command(visible_alias = "u")]
    Use(use_cmd::UseArgs),

    /// Remove an installed JDK.
    #[command(visible_alias = "rm")]
    Uninstall(uninstall::UninstallArgs),

    /// List installed JDKs, or the versions available to install.
    #[command(visible_alias = "ls")]
    List(list::ListArgs),

    /// Show the active JDK.
    Current,

    /// Show or set the download proxy.
    Proxy(proxy::ProxyArgs),

    /// Show or set the download mirror.
    Mirror(mirror::MirrorArgs),

    /// Display version information.
    ///
    /// Use -v or --verbose for platform, root and mapping details.
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Prints the error chain and returns the exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Install(args) => install::execute(&args).await,
        Commands::Use(args) => use_cmd::execute(&args),
        Commands::Uninstall(args) => uninstall::execute(&args),
        Commands::List(args) => list::execute(&args),
        Commands::Current => current::execute(),
        Commands::Proxy(args) => proxy::execute(&args),
        Commands::Mirror(args) => mirror::execute(&args),
        Commands::Version => version::execute(cli.verbose),
    }
}
