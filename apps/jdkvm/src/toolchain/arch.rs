//! CPU architecture handling for installed JDKs.
//!
//! jdkvm distinguishes three architectures, named the way the command line
//! accepts them:
//!
//! - `32` - x86
//! - `64` - `x86_64`
//! - `arm64` - `aarch64`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::JdkvmError;

/// Architecture of an installed or requested JDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    /// 32-bit x86.
    #[serde(rename = "32")]
    X86,
    /// 64-bit x86.
    #[serde(rename = "64")]
    X64,
    /// 64-bit ARM.
    #[serde(rename = "arm64")]
    Arm64,
}

impl Arch {
    /// Every architecture, in the order uninstall tries them.
    pub const ALL: [Arch; 3] = [Arch::X86, Arch::X64, Arch::Arm64];

    /// Detects the host architecture from the compile target.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_machine(std::env::consts::ARCH)
    }

    /// Maps a machine name (`x86_64`, `aarch64`, `PROCESSOR_ARCHITECTURE` values)
    /// to an architecture. Anything not recognisably 64-bit is treated as `32`.
    #[must_use]
    pub fn from_machine(machine: &str) -> Self {
        let machine = machine.to_ascii_lowercase();
        if machine.contains("arm64") || machine.contains("aarch64") {
            Self::Arm64
        } else if machine.contains("64") {
            Self::X64
        } else {
            Self::X86
        }
    }

    /// Returns the identifier used on the command line and in metadata.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "32",
            Self::X64 => "64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X86 | Self::X64 => write!(f, "{}-bit", self.as_str()),
            Self::Arm64 => f.write_str("arm64"),
        }
    }
}

impl FromStr for Arch {
    type Err = JdkvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "32" | "x86" | "i386" | "i686" => Ok(Self::X86),
            "64" | "x64" | "amd64" | "x86_64" => Ok(Self::X64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            other => Err(JdkvmError::invalid_arguments(format!(
                "unknown architecture '{other}', expected one of: 32, 64, arm64"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_line_names_and_aliases() {
        assert_eq!("32".parse::<Arch>().unwrap(), Arch::X86);
        assert_eq!("64".parse::<Arch>().unwrap(), Arch::X64);
        assert_eq!("AMD64".parse::<Arch>().unwrap(), Arch::X64);
        assert_eq!("arm64".parse::<Arch>().unwrap(), Arch::Arm64);
        assert_eq!("aarch64".parse::<Arch>().unwrap(), Arch::Arm64);
    }

    #[test]
    fn rejects_unknown_architecture() {
        let err = "sparc".parse::<Arch>().unwrap_err();
        assert!(err.to_string().contains("unknown architecture 'sparc'"));
    }

    #[test]
    fn from_machine_prefers_arm64_over_64() {
        assert_eq!(Arch::from_machine("ARM64"), Arch::Arm64);
        assert_eq!(Arch::from_machine("x86_64"), Arch::X64);
        assert_eq!(Arch::from_machine("x86"), Arch::X86);
    }

    #[test]
    fn display_uses_bit_suffix_for_x86_family() {
        assert_eq!(Arch::X86.to_string(), "32-bit");
        assert_eq!(Arch::X64.to_string(), "64-bit");
        assert_eq!(Arch::Arm64.to_string(), "arm64");
    }

    #[test]
    fn serializes_as_command_line_name() {
        let json = serde_json::to_string(&Arch::Arm64).unwrap();
        assert_eq!(json, "\"arm64\"");
        let arch: Arch = serde_json::from_str("\"64\"").unwrap();
        assert_eq!(arch, Arch::X64);
    }
}
