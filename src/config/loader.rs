//! Settings file loading
//!
//! Settings live in ~/.run-notifier.json unless a path is given on the
//! command line. A missing file is not an error.

use crate::config::schema::NotifierSettings;
use crate::error::{NotifierError, Result};
use dirs::home_dir;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the settings file in the home directory
const SETTINGS_FILE: &str = ".run-notifier.json";

/// Get the default settings file path
/// Returns ~/.run-notifier.json, or ./.run-notifier.json without a home directory
pub fn get_config_path() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SETTINGS_FILE)
}

/// Resolve a user-supplied settings path, expanding `~`
pub fn resolve_config_path(path: Option<&str>) -> PathBuf {
    match path {
        Some(path) => PathBuf::from(shellexpand::tilde(path).into_owned()),
        None => get_config_path(),
    }
}

/// Load settings from a specific path
pub fn load_config_from_path(path: &Path) -> Result<NotifierSettings> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Settings file not found, using defaults");
        return Ok(NotifierSettings::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        NotifierError::ConfigError(format!(
            "Failed to read settings file {}: {}",
            path.display(),
            e
        ))
    })?;

    let settings: NotifierSettings = serde_json::from_str(&content).map_err(|e| {
        NotifierError::ConfigError(format!(
            "Failed to parse settings file {}: {}",
            path.display(),
            e
        ))
    })?;

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_nonexistent_config_returns_default() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();
        drop(temp_file);

        let settings = load_config_from_path(&path).unwrap();
        assert_eq!(settings, NotifierSettings::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            r#"{{"default_channel_url": "https://example.com/hook", "timeout_secs": 3, "verbose": true}}"#
        )
        .unwrap();

        let settings = load_config_from_path(temp_file.path()).unwrap();
        assert_eq!(settings.default_channel_url, "https://example.com/hook");
        assert_eq!(settings.timeout_secs, 3);
        assert!(settings.verbose);
        assert_eq!(settings.default_template, crate::config::DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{{ not json").unwrap();

        let result = load_config_from_path(temp_file.path());
        assert!(matches!(result, Err(NotifierError::ConfigError(_))));
    }

    #[test]
    fn test_load_invalid_offset_fails() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, r#"{{"utc_offset": "Eastern"}}"#).unwrap();

        assert!(load_config_from_path(temp_file.path()).is_err());
    }

    #[test]
    fn test_resolve_config_path() {
        assert_eq!(
            resolve_config_path(Some("/etc/run-notifier.json")),
            PathBuf::from("/etc/run-notifier.json")
        );
        assert!(resolve_config_path(None).ends_with(SETTINGS_FILE));
    }
}
