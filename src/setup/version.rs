//! Config file versioning.
//!
//! The first line of the config file is `config_version = "X.Y.Z"`. Comparing it with
//! the running version decides whether setup has work to do.

use anyhow::anyhow;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Version of the running binary.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// What setup needs to do for an existing (or absent) config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupState {
    /// No config file yet.
    Missing,
    /// Written by an older release (or carries no version line).
    Outdated(String),
    Current,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
struct SemanticVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl FromStr for SemanticVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let mut next = |name: &str| -> anyhow::Result<u32> {
            let part = parts
                .next()
                .ok_or_else(|| anyhow!("Invalid version '{}': missing {} part", s, name))?;
            part.parse()
                .map_err(|_| anyhow!("Invalid {} version '{}' in '{}'", name, part, s))
        };
        let version = SemanticVersion {
            major: next("major")?,
            minor: next("minor")?,
            patch: next("patch")?,
        };
        if parts.next().is_some() {
            return Err(anyhow!("Invalid version '{}': expected major.minor.patch", s));
        }
        Ok(version)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn version_line_regex() -> anyhow::Result<Regex> {
    Ok(Regex::new(r#"^\s*config_version\s*=\s*"([^"]+)""#)?)
}

/// Reads the version stamp from the first line of `content`.
fn config_version(content: &str) -> anyhow::Result<Option<String>> {
    let Some(first_line) = content.lines().next() else {
        return Ok(None);
    };
    Ok(version_line_regex()?
        .captures(first_line)
        .map(|caps| caps[1].to_string()))
}

/// Compares the config file at `config_path` with the running version.
///
/// # Errors
/// If the file exists but cannot be read, or its version stamp is malformed.
pub fn check_setup_state(config_path: &Path) -> anyhow::Result<SetupState> {
    if !config_path.exists() {
        return Ok(SetupState::Missing);
    }
    let content = std::fs::read_to_string(config_path)?;
    let Some(found) = config_version(&content)? else {
        return Ok(SetupState::Outdated("unversioned".to_string()));
    };

    let current: SemanticVersion = CURRENT_VERSION.parse()?;
    match found.parse::<SemanticVersion>()?.cmp(&current) {
        Ordering::Less => Ok(SetupState::Outdated(found)),
        Ordering::Equal => Ok(SetupState::Current),
        Ordering::Greater => {
            tracing::warn!(
                "Config version {} is newer than quickrec {}",
                found,
                CURRENT_VERSION
            );
            Ok(SetupState::Current)
        }
    }
}

/// Rewrites the first line of the config file as the current version stamp.
///
/// Any earlier `config_version` line is dropped; everything else is kept.
pub fn stamp_config_version(config_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(config_path)?;
    let version_line = version_line_regex()?;
    let body: Vec<&str> = content
        .lines()
        .filter(|line| !version_line.is_match(line))
        .collect();

    let mut stamped = format!("config_version = \"{}\"\n", CURRENT_VERSION);
    stamped.push_str(&body.join("\n"));
    if !body.is_empty() {
        stamped.push('\n');
    }
    std::fs::write(config_path, stamped)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse_and_order() {
        let old: SemanticVersion = "0.0.9".parse().unwrap();
        let new: SemanticVersion = "0.1.0".parse().unwrap();
        assert!(old < new);
        assert_eq!(new.to_string(), "0.1.0");
    }

    #[test]
    fn test_invalid_versions_rejected() {
        assert!("0.1".parse::<SemanticVersion>().is_err());
        assert!("0.1.0.2".parse::<SemanticVersion>().is_err());
        assert!("one.two.three".parse::<SemanticVersion>().is_err());
    }

    #[test]
    fn test_version_only_read_from_first_line() {
        assert_eq!(
            config_version("config_version = \"1.2.3\"\n[audio]").unwrap(),
            Some("1.2.3".to_string())
        );
        assert_eq!(config_version("# config_version = \"1.2.3\"").unwrap(), None);
        assert_eq!(
            config_version("[audio]\nconfig_version = \"1.2.3\"").unwrap(),
            None
        );
    }

    #[test]
    fn test_unversioned_config_is_outdated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickrec.toml");
        std::fs::write(&path, "[audio]\n").unwrap();

        assert!(matches!(
            check_setup_state(&path).unwrap(),
            SetupState::Outdated(_)
        ));
        stamp_config_version(&path).unwrap();
        assert_eq!(check_setup_state(&path).unwrap(), SetupState::Current);
    }
}
