//! First-run setup.
//!
//! Writes the default config file when it is missing and stamps it with the running
//! version so later releases can tell which defaults a user has seen.

pub mod version;

use std::path::Path;
pub use version::SetupState;

/// Default configuration written on first run.
pub const DEFAULT_CONFIG: &str = include_str!("../../environments/quickrec.toml");

/// Brings the config file at `config_path` up to date.
///
/// A missing file is created from [`DEFAULT_CONFIG`]. An outdated one keeps its
/// settings and only gets a new version stamp; serde defaults cover any new fields.
///
/// # Errors
/// Returns an error if the file cannot be read or written.
pub fn ensure_config(config_path: &Path) -> anyhow::Result<SetupState> {
    let state = version::check_setup_state(config_path)?;
    match &state {
        SetupState::Missing => {
            if let Some(dir) = config_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(config_path, with_version_line(DEFAULT_CONFIG))?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
        }
        SetupState::Outdated(previous) => {
            version::stamp_config_version(config_path)?;
            tracing::info!(
                "Configuration migrated from {} to {}",
                previous,
                version::CURRENT_VERSION
            );
        }
        SetupState::Current => {
            tracing::debug!("Configuration up to date ({})", version::CURRENT_VERSION);
        }
    }
    Ok(state)
}

fn with_version_line(body: &str) -> String {
    format!(
        "config_version = \"{}\"\n{}",
        version::CURRENT_VERSION,
        body.trim_start_matches('\n')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecorderConfig;

    #[test]
    fn test_first_run_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("quickrec.toml");

        assert_eq!(ensure_config(&path).unwrap(), SetupState::Missing);
        assert!(RecorderConfig::load_from(&path).is_ok());
        assert_eq!(ensure_config(&path).unwrap(), SetupState::Current);
    }

    #[test]
    fn test_outdated_config_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickrec.toml");
        std::fs::write(&path, "config_version = \"0.0.1\"\n[audio]\ndevice = \"2\"\n").unwrap();

        assert_eq!(
            ensure_config(&path).unwrap(),
            SetupState::Outdated("0.0.1".to_string())
        );
        let config = RecorderConfig::load_from(&path).unwrap();
        assert_eq!(config.audio.device, "2");
        assert_eq!(ensure_config(&path).unwrap(), SetupState::Current);
    }
}
