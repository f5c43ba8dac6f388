//! Command modules for the jdkvm CLI.
//!
//! ## Version Lifecycle
//!
//! - [`install`] - Download and install a JDK
//! - [`use_cmd`] - Activate an installed JDK
//! - [`uninstall`] - Remove an installed JDK
//! - [`list`] - List installed or available versions
//! - [`current`] - Show the active JDK
//!
//! ## Settings
//!
//! - [`proxy`] - Show or set the download proxy
//! - [`mirror`] - Show or set the download mirror
//! - [`version`] - Display version information

pub mod current;
pub mod install;
pub mod list;
pub mod mirror;
pub mod proxy;
pub mod uninstall;
pub mod use_cmd;
pub mod version;

use crate::errors::JdkvmError;
use crate::toolchain::Arch;

/// Parses the optional architecture argument, defaulting to the host.
pub(crate) fn resolve_arch(arg: Option<&str>) -> Result<Arch, JdkvmError> {
    arg.map_or_else(|| Ok(Arch::detect()), str::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_arch_is_host() {
        assert_eq!(resolve_arch(None).unwrap(), Arch::detect());
        assert_eq!(resolve_arch(Some("arm64")).unwrap(), Arch::Arm64);
        assert!(resolve_arch(Some("mips")).is_err());
    }
}
