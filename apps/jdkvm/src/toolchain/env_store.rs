//! Durable storage for the environment of future sessions.
//!
//! Activation changes the running process immediately; a [`PersistentEnvStore`]
//! makes the same change visible to shells started later.
//!
//! ## Unix
//!
//! [`ShellProfileStore`] keeps a managed block in the user's shell profile:
//!
//! ```bash
//! # >>> jdkvm >>>
//! export JAVA_HOME="/home/user/.jdkvm/v17.0.11"
//! export PATH="/home/user/.jdkvm/v17.0.11/bin:$PATH"
//! # <<< jdkvm <<<
//! ```
//!
//! Each activation rewrites the lines inside the block, so repeated `use`
//! calls never stack up PATH entries in the profile.
//!
//! ## Windows
//!
//! `RegistryStore` writes `HKEY_CURRENT_USER\Environment`. The stored `Path`
//! is rewritten with the same rule as the session PATH.

#[cfg(unix)]
use anyhow::bail;
use anyhow::{Context, Result};
use std::path::Path;
#[cfg(unix)]
use std::path::PathBuf;

/// First line of the managed profile block.
#[cfg(unix)]
const BLOCK_START: &str = "# >>> jdkvm >>>";

/// Last line of the managed profile block.
#[cfg(unix)]
const BLOCK_END: &str = "# <<< jdkvm <<<";

/// Persists environment variables for future sessions.
pub trait PersistentEnvStore {
    /// Where values are written, for user-facing messages.
    fn location(&self) -> String;

    /// Persists `name=value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set_var(&self, name: &str, value: &str) -> Result<()>;

    /// Persists a search path with `bin_dir` first and no other entry under
    /// `managed_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set_search_path(&self, bin_dir: &Path, managed_root: &Path) -> Result<()>;
}

/// Store used when no real store is available. Every write fails with the
/// reason it is unavailable, which activation reports as a warning.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

#[cfg(unix)]
impl UnavailableStore {
    /// Creates a store that always fails with `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[cfg(unix)]
impl PersistentEnvStore for UnavailableStore {
    fn location(&self) -> String {
        "nowhere".to_string()
    }

    fn set_var(&self, _name: &str, _value: &str) -> Result<()> {
        bail!("{}", self.reason)
    }

    fn set_search_path(&self, _bin_dir: &Path, _managed_root: &Path) -> Result<()> {
        bail!("{}", self.reason)
    }
}

/// Returns the store for the current user: the shell profile on Unix, the
/// registry on Windows. Falls back to [`UnavailableStore`] when neither can
/// be found.
#[must_use]
pub fn user_env_store() -> Box<dyn PersistentEnvStore> {
    #[cfg(unix)]
    {
        match ShellProfileStore::detect() {
            Ok(store) => Box::new(store),
            Err(e) => Box::new(UnavailableStore::new(e.to_string())),
        }
    }
    #[cfg(windows)]
    {
        Box::new(RegistryStore)
    }
}

/// Supported shells.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

#[cfg(unix)]
impl Shell {
    /// Detects the user's shell from `SHELL`.
    #[must_use]
    pub fn detect() -> Option<Self> {
        let shell_path = std::env::var("SHELL").ok()?;
        Self::from_path(&shell_path)
    }

    /// Parses a shell from a path such as `/bin/zsh`.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match Path::new(path).file_name()?.to_str()? {
            "bash" => Some(Self::Bash),
            "zsh" => Some(Self::Zsh),
            "fish" => Some(Self::Fish),
            _ => None,
        }
    }

    /// Profile files for this shell, most preferred first.
    #[must_use]
    pub fn profile_candidates(self, home_dir: &Path) -> Vec<PathBuf> {
        match self {
            Self::Bash => vec![home_dir.join(".bashrc"), home_dir.join(".bash_profile")],
            Self::Zsh => vec![home_dir.join(".zshrc")],
            Self::Fish => vec![home_dir.join(".config").join("fish").join("config.fish")],
        }
    }

    /// Line that prefixes an assignment to `name`.
    fn assignment_prefix(self, name: &str) -> String {
        match self {
            Self::Bash | Self::Zsh => format!("export {name}="),
            Self::Fish => format!("set -gx {name} "),
        }
    }

    /// Assignment of a literal value.
    fn assignment(self, name: &str, value: &str) -> String {
        match self {
            Self::Bash | Self::Zsh => {
                format!("{}\"{}\"", self.assignment_prefix(name), escape_double_quoted(value))
            }
            Self::Fish => format!("{}{}", self.assignment_prefix(name), quote_fish(value)),
        }
    }

    /// Assignment that prepends `bin_dir` to the inherited PATH.
    fn path_prepend(self, bin_dir: &Path) -> String {
        let bin = bin_dir.display().to_string();
        match self {
            Self::Bash | Self::Zsh => format!(
                "{}\"{}:$PATH\"",
                self.assignment_prefix("PATH"),
                escape_double_quoted(&bin)
            ),
            Self::Fish => format!("{}{} $PATH", self.assignment_prefix("PATH"), quote_fish(&bin)),
        }
    }
}

#[cfg(unix)]
fn escape_double_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('$', "\\$")
        .replace('`', "\\`")
        .replace('"', "\\\"")
}

#[cfg(unix)]
fn quote_fish(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Managed block in a shell profile.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct ShellProfileStore {
    shell: Shell,
    profile: PathBuf,
}

#[cfg(unix)]
impl ShellProfileStore {
    /// Uses an explicit shell and profile file.
    #[must_use]
    pub fn new(shell: Shell, profile: impl Into<PathBuf>) -> Self {
        Self {
            shell,
            profile: profile.into(),
        }
    }

    /// Finds the user's shell and its existing profile file.
    ///
    /// # Errors
    ///
    /// Returns an error if `SHELL` is unset or unsupported, or no profile exists.
    pub fn detect() -> Result<Self> {
        let shell = Shell::detect().context("could not detect a supported shell from SHELL")?;
        let home = dirs::home_dir().context("could not determine the home directory")?;
        let profile = shell
            .profile_candidates(&home)
            .into_iter()
            .find(|p| p.exists())
            .with_context(|| format!("no {shell:?} profile found in {}", home.display()))?;
        Ok(Self::new(shell, profile))
    }

    /// Replaces (or adds) the managed line assigning `name`.
    fn upsert(&self, name: &str, line: &str) -> Result<()> {
        let content = match std::fs::read_to_string(&self.profile) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read profile: {}", self.profile.display()));
            }
        };

        let prefix = self.shell.assignment_prefix(name);
        let updated = rewrite_block(&content, &prefix, line);

        std::fs::write(&self.profile, updated)
            .with_context(|| format!("Failed to write profile: {}", self.profile.display()))
    }
}

#[cfg(unix)]
impl PersistentEnvStore for ShellProfileStore {
    fn location(&self) -> String {
        self.profile.display().to_string()
    }

    fn set_var(&self, name: &str, value: &str) -> Result<()> {
        self.upsert(name, &self.shell.assignment(name, value))
    }

    fn set_search_path(&self, bin_dir: &Path, _managed_root: &Path) -> Result<()> {
        self.upsert("PATH", &self.shell.path_prepend(bin_dir))
    }
}

/// Returns `content` with `line` placed in the managed block, replacing any
/// block line starting with `prefix`. Text outside the block is untouched.
#[cfg(unix)]
fn rewrite_block(content: &str, prefix: &str, line: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.iter().position(|l| l.trim_end() == BLOCK_START);
    let end = start.and_then(|s| {
        lines[s..]
            .iter()
            .position(|l| l.trim_end() == BLOCK_END)
            .map(|offset| s + offset)
    });

    let mut block: Vec<String> = match (start, end) {
        (Some(s), Some(e)) => lines[s + 1..e].iter().map(|l| (*l).to_string()).collect(),
        _ => Vec::new(),
    };

    match block.iter_mut().find(|l| l.starts_with(prefix)) {
        Some(existing) => *existing = line.to_string(),
        None => block.push(line.to_string()),
    }

    let mut out: Vec<String> = Vec::new();
    let rendered = std::iter::once(BLOCK_START.to_string())
        .chain(block)
        .chain(std::iter::once(BLOCK_END.to_string()));

    if let (Some(s), Some(e)) = (start, end) {
        out.extend(lines[..s].iter().map(|l| (*l).to_string()));
        out.extend(rendered);
        out.extend(lines[e + 1..].iter().map(|l| (*l).to_string()));
    } else {
        out.extend(lines.iter().map(|l| (*l).to_string()));
        if out.last().is_some_and(|l| !l.is_empty()) {
            out.push(String::new());
        }
        out.extend(rendered);
    }

    let mut result = out.join("\n");
    result.push('\n');
    result
}

/// `HKEY_CURRENT_USER\Environment`.
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryStore;

#[cfg(windows)]
impl RegistryStore {
    fn environment_key() -> Result<winreg::RegKey> {
        use winreg::RegKey;
        use winreg::enums::{HKEY_CURRENT_USER, KEY_READ, KEY_WRITE};

        RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags("Environment", KEY_READ | KEY_WRITE)
            .context("Failed to open HKCU\\Environment registry key")
    }
}

#[cfg(windows)]
impl PersistentEnvStore for RegistryStore {
    fn location(&self) -> String {
        r"HKCU\Environment".to_string()
    }

    fn set_var(&self, name: &str, value: &str) -> Result<()> {
        Self::environment_key()?
            .set_value(name, &value)
            .with_context(|| format!("Failed to update {name} in registry"))
    }

    fn set_search_path(&self, bin_dir: &Path, managed_root: &Path) -> Result<()> {
        let env = Self::environment_key()?;
        let current: String = env.get_value("Path").unwrap_or_default();
        let rewritten = super::activator::rewrite_search_path(
            Some(std::ffi::OsStr::new(&current)),
            managed_root,
            bin_dir,
        )?;
        env.set_value("Path", &rewritten.to_string_lossy().into_owned())
            .context("Failed to update PATH in registry")
    }
}
