//! User settings stored in `<root>/settings.txt`.
//!
//! The file is a list of `key=value` lines under a fixed header:
//!
//! ```text
//! # jdkvm configuration file
//! proxy=none
//! java_mirror=
//! verifyssl=true
//! ```
//!
//! Loading is lenient: keys are case-insensitive, and comments, unknown keys
//! and malformed lines are skipped. Saving always writes every key in the
//! order above.

use std::path::Path;

use tracing::{debug, warn};

use crate::errors::JdkvmError;
use crate::toolchain::download::DownloadConfig;
use crate::toolchain::mapping::normalize_mirror;

const HEADER: &str = "# jdkvm configuration file";

/// Download-related settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Proxy URL, `None` for a direct connection.
    pub proxy: Option<String>,
    /// Download mirror base, normalised with a scheme and trailing `/`.
    pub mirror: Option<String>,
    /// Whether TLS certificates are verified.
    pub verify_tls: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            proxy: None,
            mirror: None,
            verify_tls: true,
        }
    }
}

impl Settings {
    /// Parses settings text. Never fails.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut settings = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                debug!(line, "skipping malformed settings line");
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "proxy" => settings.set_proxy(value),
                "java_mirror" => settings.set_mirror(value),
                "verifyssl" => match value.to_ascii_lowercase().as_str() {
                    "true" | "yes" | "1" => settings.verify_tls = true,
                    "false" | "no" | "0" => settings.verify_tls = false,
                    _ => debug!(value, "ignoring invalid verifyssl value"),
                },
                other => debug!(key = other, "ignoring unknown settings key"),
            }
        }

        settings
    }

    /// Serialises settings in file order.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{HEADER}\nproxy={}\njava_mirror={}\nverifyssl={}\n",
            self.proxy.as_deref().unwrap_or("none"),
            self.mirror.as_deref().unwrap_or_default(),
            self.verify_tls
        )
    }

    /// Sets the proxy. `none` or an empty value clears it.
    pub fn set_proxy(&mut self, value: &str) {
        let value = value.trim();
        self.proxy = if value.is_empty() || value.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(value.to_string())
        };
    }

    /// Sets the mirror. `none` or an empty value clears it.
    pub fn set_mirror(&mut self, value: &str) {
        self.mirror = normalize_mirror(value);
    }

    /// Download configuration derived from these settings.
    #[must_use]
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            proxy: self.proxy.clone(),
            verify_tls: self.verify_tls,
            ..DownloadConfig::default()
        }
    }
}

/// Reads settings from `path`. A missing or unreadable file yields defaults.
#[must_use]
pub fn load(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => Settings::parse(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read settings, using defaults");
            Settings::default()
        }
    }
}

/// Writes settings to `path`, creating its directory.
///
/// # Errors
///
/// Returns `IoError` if the directory or file cannot be written.
pub fn save(path: &Path, settings: &Settings) -> Result<(), JdkvmError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            JdkvmError::io_error(format!("failed to create {}", parent.display()), e)
        })?;
    }
    std::fs::write(path, settings.render())
        .map_err(|e| JdkvmError::io_error(format!("failed to write {}", path.display()), e))
}

/// Loads settings, writing the defaults first if the file does not exist yet.
///
/// # Errors
///
/// Returns `IoError` if the defaults cannot be written.
pub fn load_or_init(path: &Path) -> Result<Settings, JdkvmError> {
    if path.exists() {
        return Ok(load(path));
    }
    let settings = Settings::default();
    save(path, &settings)?;
    debug!(path = %path.display(), "wrote default settings");
    Ok(settings)
}
