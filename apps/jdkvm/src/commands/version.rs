//! Version command for the jdkvm CLI.
//!
//! With the global `--verbose` flag, also prints the host architecture, the
//! managed root and the mapping file in use.

use anyhow::Result;

use crate::toolchain::mapping::VersionMapping;
use crate::toolchain::{Arch, JdkvmPaths};

/// Executes the version command.
///
/// # Errors
///
/// Returns an error only in verbose mode, if the managed root cannot be
/// determined.
pub fn execute(verbose: bool) -> Result<()> {
    println!("jdkvm {}", env!("CARGO_PKG_VERSION"));
    if !verbose {
        return Ok(());
    }

    let paths = JdkvmPaths::new()?;
    let mapping = match VersionMapping::load(&paths) {
        Ok(mapping) => mapping
            .source()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string()),
        Err(e) => format!("unreadable ({e})"),
    };

    println!();
    println!("  Platform: {}", platform_string());
    println!("  Arch:     {}", Arch::detect());
    println!("  Root:     {}", paths.root.display());
    println!("  Mapping:  {mapping}");
    Ok(())
}

/// Returns a human-readable platform string.
fn platform_string() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_string_names_os_and_arch() {
        let platform = platform_string();
        assert!(platform.starts_with(std::env::consts::OS));
        assert!(platform.contains('-'));
    }
}
