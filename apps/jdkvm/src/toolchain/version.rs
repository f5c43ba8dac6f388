//! Version tokens.
//!
//! A token without a `.` is an alias for a major version (`17`); a token with
//! a `.` is an exact version, zero-filled to a full triple (`17.0` becomes
//! `17.0.0`). Build suffixes after `+` or `-` are kept in [`VersionId::raw`]
//! but ignored for comparison.
//!
//! Ordering is numeric, field by field. Sorting directory names as strings
//! puts `9.0.1` above `17.0.2`, so nothing here ever compares raw text.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::errors::JdkvmError;

/// A parsed version token, either an alias or an exact triple.
#[derive(Debug, Clone)]
pub struct VersionId {
    major: u64,
    minor: Option<u64>,
    patch: Option<u64>,
    raw: String,
}

impl VersionId {
    /// Parses a user-supplied token.
    ///
    /// A leading `v` is accepted so that installed directory names parse too.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if the token is empty, not numeric, or has
    /// more than three dotted components.
    pub fn parse(token: &str) -> Result<Self, JdkvmError> {
        let raw = token.trim();
        let body = raw
            .strip_prefix('v')
            .or_else(|| raw.strip_prefix('V'))
            .unwrap_or(raw);
        let core = body.split(['+', '-']).next().unwrap_or_default();

        if core.is_empty() {
            return Err(JdkvmError::invalid_arguments(format!(
                "'{token}' is not a version"
            )));
        }

        if !core.contains('.') {
            let major = parse_component(core, token)?;
            return Ok(Self {
                major,
                minor: None,
                patch: None,
                raw: raw.to_string(),
            });
        }

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(JdkvmError::invalid_arguments(format!(
                "'{token}' has more than three version components"
            )));
        }

        let mut normalized = parts.join(".");
        for _ in parts.len()..3 {
            normalized.push_str(".0");
        }

        let parsed = semver::Version::parse(&normalized).map_err(|e| {
            JdkvmError::invalid_arguments(format!("'{token}' is not a version: {e}"))
        })?;

        Ok(Self {
            major: parsed.major,
            minor: Some(parsed.minor),
            patch: Some(parsed.patch),
            raw: raw.to_string(),
        })
    }

    /// Parses an installed directory name of the form `v<exact>`.
    ///
    /// Returns `None` for anything else, including alias-shaped names like `v17`.
    #[must_use]
    pub fn from_dir_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix('v')?;
        let id = Self::parse(rest).ok()?;
        id.is_exact().then_some(id)
    }

    /// Major version component.
    #[must_use]
    pub fn major(&self) -> u64 {
        self.major
    }

    /// Minor version component, `None` for aliases.
    #[must_use]
    pub fn minor(&self) -> Option<u64> {
        self.minor
    }

    /// Patch version component, `None` for aliases.
    #[must_use]
    pub fn patch(&self) -> Option<u64> {
        self.patch
    }

    /// The token as given (trimmed).
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True for an alias (major only).
    #[must_use]
    pub fn is_alias(&self) -> bool {
        self.minor.is_none()
    }

    /// True for a full `major.minor.patch` version.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.minor.is_some() && self.patch.is_some()
    }

    /// Whether an exact installed version satisfies this token.
    ///
    /// Aliases match on major; exact tokens require the whole triple.
    #[must_use]
    pub fn matches(&self, installed: &VersionId) -> bool {
        if self.is_alias() {
            installed.major == self.major
        } else {
            self == installed
        }
    }

    /// Directory name for an exact version, `v<major>.<minor>.<patch>`.
    ///
    /// Returns `None` for aliases: an alias never names an install directory.
    #[must_use]
    pub fn dir_name(&self) -> Option<String> {
        match (self.minor, self.patch) {
            (Some(minor), Some(patch)) => Some(format!("v{}.{minor}.{patch}", self.major)),
            _ => None,
        }
    }

    fn key(&self) -> (u64, Option<u64>, Option<u64>) {
        (self.major, self.minor, self.patch)
    }
}

fn parse_component(component: &str, token: &str) -> Result<u64, JdkvmError> {
    component
        .parse::<u64>()
        .map_err(|_| JdkvmError::invalid_arguments(format!("'{token}' is not a version")))
}

impl PartialEq for VersionId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for VersionId {}

impl Hash for VersionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for VersionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.minor, self.patch) {
            (Some(minor), Some(patch)) => write!(f, "{}.{minor}.{patch}", self.major),
            _ => write!(f, "{}", self.major),
        }
    }
}

impl FromStr for VersionId {
    type Err = JdkvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> VersionId {
        VersionId::parse(s).unwrap()
    }

    #[test]
    fn token_without_dot_is_alias() {
        let id = v("17");
        assert!(id.is_alias());
        assert_eq!(id.major(), 17);
        assert_eq!(id.minor(), None);
        assert_eq!(id.dir_name(), None);
    }

    #[test]
    fn partial_exact_versions_are_zero_filled() {
        assert_eq!(v("17.0").to_string(), "17.0.0");
        assert_eq!(v("17.0"), v("17.0.0"));
        assert!(v("17.0").is_exact());
    }

    #[test]
    fn alias_and_exact_with_same_major_are_not_equal() {
        assert_ne!(v("17"), v("17.0.0"));
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        let mut versions = vec![v("9.0.1"), v("17.0.2"), v("8.0.1")];
        versions.sort_by(|a, b| b.cmp(a));
        let sorted: Vec<String> = versions.iter().map(ToString::to_string).collect();
        assert_eq!(sorted, ["17.0.2", "9.0.1", "8.0.1"]);
        assert!(v("17.0.10") > v("17.0.9"));
    }

    #[test]
    fn alias_matches_only_its_major() {
        assert!(v("9").matches(&v("9.0.1")));
        assert!(!v("9").matches(&v("17.0.2")));
        assert!(!v("1").matches(&v("17.0.2")));
    }

    #[test]
    fn exact_matches_full_triple_only() {
        assert!(v("17.0.11").matches(&v("17.0.11")));
        assert!(!v("17.0.11").matches(&v("17.0.1")));
    }

    #[test]
    fn build_suffix_is_ignored_for_comparison() {
        let id = v("17.0.11+9");
        assert_eq!(id, v("17.0.11"));
        assert_eq!(id.raw(), "17.0.11+9");
    }

    #[test]
    fn dir_names_round_trip() {
        let id = VersionId::from_dir_name("v17.0.11").unwrap();
        assert_eq!(id.to_string(), "17.0.11");
        assert_eq!(id.dir_name().as_deref(), Some("v17.0.11"));
    }

    #[test]
    fn malformed_dir_names_are_rejected() {
        assert!(VersionId::from_dir_name("v17").is_none());
        assert!(VersionId::from_dir_name("17.0.11").is_none());
        assert!(VersionId::from_dir_name("vnext").is_none());
        assert!(VersionId::from_dir_name("v1.2.3.4").is_none());
    }

    #[test]
    fn garbage_tokens_are_invalid_arguments() {
        assert!(matches!(
            VersionId::parse(""),
            Err(JdkvmError::InvalidArguments { .. })
        ));
        assert!(VersionId::parse("latest").is_err());
        assert!(VersionId::parse("17.x").is_err());
    }
}
