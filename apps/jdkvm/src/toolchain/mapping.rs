//! Version mapping: which release each alias installs and where to fetch it.
//!
//! The mapping is a JSON object keyed by major version:
//!
//! ```json
//! {
//!   "17": {
//!     "latest": "17.0.11",
//!     "url": "https://github.com/adoptium/temurin17-binaries/releases/download/jdk-17.0.11%2B9/OpenJDK17U-jdk_x64_windows_hotspot_17.0.11_9.zip",
//!     "short": "17",
//!     "urls": { "arm64": "https://..." }
//!   }
//! }
//! ```
//!
//! `urls` is optional and overrides `url` for a specific architecture. A
//! relative `url` is joined onto the distribution base (or the configured
//! mirror).
//!
//! The mapping is loaded once at startup and never mutated afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::arch::Arch;
use super::paths::{JdkvmPaths, MAPPING_FILE};
use super::version::VersionId;
use crate::errors::JdkvmError;

/// Environment variable pointing at an explicit mapping file.
pub const MAPPING_ENV: &str = "JDKVM_VERSION_MAPPING";

/// Default distribution base. Mapping URLs under it are rebased onto a mirror.
pub const DEFAULT_DIST_BASE: &str = "https://github.com/adoptium";

/// One alias entry of the mapping file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingEntry {
    /// Newest exact version published for this alias.
    pub latest: String,
    /// Archive URL.
    pub url: String,
    /// Short display label.
    #[serde(default)]
    pub short: String,
    /// Per-architecture URL overrides, keyed by `32`, `64` or `arm64`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub urls: BTreeMap<String, String>,
}

/// A release selected from the mapping for installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Alias key the release was found under.
    pub alias: String,
    /// Exact version to install.
    pub version: VersionId,
    /// Final download URL (mirror applied).
    pub url: String,
    /// Short display label.
    pub short: String,
}

impl Release {
    /// Archive file name, taken from the last URL path segment.
    #[must_use]
    pub fn filename(&self) -> &str {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("jdk.zip")
    }
}

/// Alias → release mapping.
#[derive(Debug, Clone, Default)]
pub struct VersionMapping {
    entries: BTreeMap<u64, (MappingEntry, VersionId)>,
    source: Option<PathBuf>,
}

impl VersionMapping {
    /// Parses mapping JSON. Entries with a non-numeric alias or a non-exact
    /// `latest` are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `Mapping` if the document is not a JSON object of entries.
    pub fn from_json(content: &str) -> Result<Self, JdkvmError> {
        let raw: BTreeMap<String, MappingEntry> = serde_json::from_str(content)
            .map_err(|e| JdkvmError::mapping(format!("invalid JSON: {e}")))?;

        let mut entries = BTreeMap::new();
        for (alias, entry) in raw {
            let Ok(major) = alias.trim().parse::<u64>() else {
                warn!(alias = %alias, "ignoring mapping entry with non-numeric alias");
                continue;
            };
            match VersionId::parse(&entry.latest) {
                Ok(latest) if latest.is_exact() && latest.major() == major => {
                    entries.insert(major, (entry, latest));
                }
                _ => warn!(
                    alias = %alias,
                    latest = %entry.latest,
                    "ignoring mapping entry whose latest version does not belong to the alias"
                ),
            }
        }

        Ok(Self {
            entries,
            source: None,
        })
    }

    /// Reads a mapping file.
    ///
    /// # Errors
    ///
    /// Returns `Mapping` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, JdkvmError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| JdkvmError::mapping(format!("cannot read {}: {e}", path.display())))?;
        let mut mapping = Self::from_json(&content)?;
        mapping.source = Some(path.to_path_buf());
        Ok(mapping)
    }

    /// Locates and loads the mapping file.
    ///
    /// Search order: `JDKVM_VERSION_MAPPING`, the managed root, the directory
    /// of the running executable, the current directory. When nothing is found
    /// the mapping is empty: alias installs are unavailable, but operations on
    /// already-installed versions keep working.
    ///
    /// # Errors
    ///
    /// Returns `Mapping` if a file was found but is unreadable or malformed.
    pub fn load(paths: &JdkvmPaths) -> Result<Self, JdkvmError> {
        if let Some(explicit) = std::env::var_os(MAPPING_ENV).filter(|v| !v.is_empty()) {
            return Self::from_file(Path::new(&explicit));
        }

        let mut candidates = vec![paths.mapping_file()];
        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join(MAPPING_FILE));
        }
        candidates.push(PathBuf::from(MAPPING_FILE));

        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => {
                debug!(path = %path.display(), "loading version mapping");
                Self::from_file(path)
            }
            None => {
                warn!("no {MAPPING_FILE} found; only installed versions can be used");
                Ok(Self::default())
            }
        }
    }

    /// File the mapping was loaded from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// True when no aliases are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aliases with their entries, newest major first.
    pub fn aliases(&self) -> impl Iterator<Item = (u64, &MappingEntry)> {
        self.entries.iter().rev().map(|(major, (entry, _))| (*major, entry))
    }

    /// Resolves a token to the release that should be installed.
    ///
    /// Aliases select their entry directly; exact tokens must equal an
    /// entry's `latest`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedVersion` if the token is not in the mapping.
    pub fn resolve(
        &self,
        token: &VersionId,
        arch: Arch,
        mirror: Option<&str>,
    ) -> Result<Release, JdkvmError> {
        let (major, entry, latest) = self
            .entries
            .get(&token.major())
            .filter(|(_, latest)| token.is_alias() || token == latest)
            .map(|(entry, latest)| (token.major(), entry, latest))
            .ok_or_else(|| JdkvmError::unsupported_version(token.raw()))?;

        let url = entry.urls.get(arch.as_str()).unwrap_or(&entry.url);

        Ok(Release {
            alias: major.to_string(),
            version: latest.clone(),
            url: download_url(url, mirror),
            short: if entry.short.is_empty() {
                major.to_string()
            } else {
                entry.short.clone()
            },
        })
    }
}

/// Normalises a mirror setting: adds `http://` when there is no scheme and
/// ensures a trailing `/`. `none` and empty values mean no mirror.
#[must_use]
pub fn normalize_mirror(mirror: &str) -> Option<String> {
    let mirror = mirror.trim();
    if mirror.is_empty() || mirror.eq_ignore_ascii_case("none") {
        return None;
    }
    let mut base = if mirror.to_ascii_lowercase().starts_with("http") {
        mirror.to_string()
    } else {
        format!("http://{mirror}")
    };
    if !base.ends_with('/') {
        base.push('/');
    }
    Some(base)
}

/// Applies the mirror to a mapping URL.
///
/// Relative URLs are joined onto the mirror (or the default base); absolute
/// URLs under the default base are rebased onto the mirror; other absolute
/// URLs are used as-is.
#[must_use]
pub fn download_url(url: &str, mirror: Option<&str>) -> String {
    let mirror = mirror.and_then(normalize_mirror);
    let is_absolute = url.contains("://");

    if !is_absolute {
        let base = mirror.unwrap_or_else(|| format!("{DEFAULT_DIST_BASE}/"));
        return format!("{base}{}", url.trim_start_matches('/'));
    }

    let rest = url
        .strip_prefix(DEFAULT_DIST_BASE)
        .and_then(|rest| rest.strip_prefix('/'));
    match (mirror, rest) {
        (Some(base), Some(rest)) => format!("{base}{}", rest.trim_start_matches('/')),
        _ => url.to_string(),
    }
}
