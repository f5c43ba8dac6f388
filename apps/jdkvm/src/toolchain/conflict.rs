//! Detection of a `java` on PATH that shadows the active JDK.
//!
//! Activation updates PATH for jdkvm's own process and for future sessions,
//! but a terminal opened earlier, or a profile that prepends another JDK after
//! jdkvm's block, still resolves `java` somewhere else.
//!
//! ## Usage
//!
//! ```ignore
//! let path = std::env::var_os("PATH");
//! if let Some(conflict) = detect_java_conflict(&active.bin_dir(), path.as_deref()) {
//!     eprintln!("{}", format_conflict_warning(&conflict));
//! }
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// A `java` executable that PATH resolves before the managed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConflict {
    /// Where PATH resolves `java`.
    pub found: PathBuf,
    /// The active install's `java`.
    pub expected: PathBuf,
}

fn java_binary() -> String {
    format!("java{}", std::env::consts::EXE_SUFFIX)
}

/// Checks which `java` the given search path resolves.
///
/// Returns `None` when it resolves to `bin_dir`, when no `java` is found at
/// all, or when the managed `java` itself is missing.
#[must_use]
pub fn detect_java_conflict(bin_dir: &Path, search_path: Option<&OsStr>) -> Option<PathConflict> {
    let binary = java_binary();
    let expected = bin_dir.join(&binary);
    if !expected.exists() {
        return None;
    }

    let cwd = std::env::current_dir().ok()?;
    let found = which::which_in(&binary, search_path, cwd).ok()?;

    let same = match (found.canonicalize(), expected.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => found == expected,
    };
    (!same).then_some(PathConflict { found, expected })
}

/// Formats a warning with a suggested fix.
#[must_use]
pub fn format_conflict_warning(conflict: &PathConflict) -> String {
    let mut lines = vec![
        "Warning: PATH conflict detected".to_string(),
        format!("  'java' found at: {}", conflict.found.display()),
        format!("  Expected:        {}", conflict.expected.display()),
        String::new(),
        "The selected JDK may not be used in this terminal. To fix:".to_string(),
        "  - Open a new terminal so the updated profile is loaded, or".to_string(),
    ];

    if let Some(parent) = conflict.expected.parent() {
        lines.push(format!(
            "  - Ensure {} comes before other paths in PATH",
            parent.display()
        ));
    }

    lines.join("\n")
}
