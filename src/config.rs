//! Client configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by a user config file placed in the config directory (the
//! current directory unless `--config` says otherwise).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! default_part = "lips"      # Part shown when a session starts or reloads
//!
//! [backend]
//! base_url = "http://127.0.0.1:8000"
//! load_faces_path = "/load_faces/"
//! process_photo_path = "/change_part_of_face/"
//!
//! [swap]
//! timeout_secs = 60          # Client-side bound on one swap call
//! reload_delay_secs = 5      # Delay before the session reloads after a transport error
//!
//! [upload]
//! accepted_types = ["png", "jpeg"]
//!
//! [download]
//! file_prefix = "Face_Swapping"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! [backend]
//! base_url = "https://faces.example.com"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Client configuration loaded from `config.toml`.
///
/// All fields have defaults matching the stock deployment. Unknown keys are
/// rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Part activated at session start and after every reload.
    pub default_part: String,
    /// Where the compositing backend lives.
    pub backend: BackendConfig,
    /// Swap job timing.
    pub swap: SwapConfig,
    /// User photo allow-list.
    pub upload: UploadConfig,
    /// Naming of downloaded results.
    pub download: DownloadConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_part: "lips".to_string(),
            backend: BackendConfig::default(),
            swap: SwapConfig::default(),
            upload: UploadConfig::default(),
            download: DownloadConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_part.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default_part must not be empty".into(),
            ));
        }
        match url::Url::parse(&self.backend.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "backend.base_url must be an absolute http(s) URL, got '{}'",
                    self.backend.base_url
                )));
            }
        }
        for (key, path) in [
            ("backend.load_faces_path", &self.backend.load_faces_path),
            ("backend.process_photo_path", &self.backend.process_photo_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Validation(format!("{key} must start with '/'")));
            }
        }
        if self.swap.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "swap.timeout_secs must be non-zero".into(),
            ));
        }
        if self.upload.accepted_types.is_empty() {
            return Err(ConfigError::Validation(
                "upload.accepted_types must not be empty".into(),
            ));
        }
        if self.download.file_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "download.file_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Backend location and endpoint paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub base_url: String,
    pub load_faces_path: String,
    pub process_photo_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            load_faces_path: "/load_faces/".to_string(),
            process_photo_path: "/change_part_of_face/".to_string(),
        }
    }
}

/// Swap job timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwapConfig {
    /// Upper bound on a single process-photo call, in seconds.
    pub timeout_secs: u64,
    /// Delay between a transport error notice and the session reload.
    pub reload_delay_secs: u64,
}

impl SwapConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn reload_delay(&self) -> Duration {
        Duration::from_secs(self.reload_delay_secs)
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            reload_delay_secs: 5,
        }
    }
}

/// User photo allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Accepted image subtypes (`png` → `image/png`).
    pub accepted_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_types: vec!["png".to_string(), "jpeg".to_string()],
        }
    }
}

/// Naming of downloaded results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    pub file_prefix: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            file_prefix: "Face_Swapping".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ClientConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ClientConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ClientConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory, over stock defaults.
pub fn load_config(dir: &Path) -> Result<ClientConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Face Part Swap Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Part of the face shown when a session starts (and after a reload).
default_part = "lips"

# ---------------------------------------------------------------------------
# Compositing backend
# ---------------------------------------------------------------------------
[backend]
# Absolute http(s) URL the endpoint paths are resolved against.
base_url = "http://127.0.0.1:8000"
# Endpoint returning the example faces of one part.
load_faces_path = "/load_faces/"
# Endpoint compositing the chosen part onto the user's photo.
process_photo_path = "/change_part_of_face/"

# ---------------------------------------------------------------------------
# Swap jobs
# ---------------------------------------------------------------------------
[swap]
# A swap call taking longer than this counts as a transport error.
timeout_secs = 60
# After a transport error the session reloads once this delay has passed.
reload_delay_secs = 5

# ---------------------------------------------------------------------------
# User photo
# ---------------------------------------------------------------------------
[upload]
# Accepted image types; anything else is rejected before reaching the session.
accepted_types = ["png", "jpeg"]

# ---------------------------------------------------------------------------
# Downloads
# ---------------------------------------------------------------------------
[download]
# Saved results are named <file_prefix>_<dd-mm-YYYY_HH-MM>.<ext>
file_prefix = "Face_Swapping"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) {
        fs::write(dir.join("config.toml"), content).unwrap();
    }

    #[test]
    fn default_config_has_stock_values() {
        let config = ClientConfig::default();
        assert_eq!(config.default_part, "lips");
        assert_eq!(config.backend.load_faces_path, "/load_faces/");
        assert_eq!(config.swap.timeout(), Duration::from_secs(60));
        assert_eq!(config.upload.accepted_types, vec!["png", "jpeg"]);
    }

    #[test]
    fn load_config_without_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn load_config_partial_override() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
default_part = "nose"

[swap]
timeout_secs = 10
"#,
        );
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.default_part, "nose");
        assert_eq!(config.swap.timeout_secs, 10);
        // Untouched sibling key keeps its default
        assert_eq!(config.swap.reload_delay_secs, 5);
        assert_eq!(config.download.file_prefix, "Face_Swapping");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "this is not = [valid toml");
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[swap]\ntimeout = 5\n");
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[analytics]\nenabled = true\n");
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = ClientConfig::default();
        config.swap.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_relative_base_url() {
        let mut config = ClientConfig::default();
        config.backend.base_url = "faces.local".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let mut config = ClientConfig::default();
        config.backend.base_url = "ftp://faces.local".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_path_without_leading_slash() {
        let mut config = ClientConfig::default();
        config.backend.process_photo_path = "change_part_of_face/".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backend.process_photo_path"));
    }

    #[test]
    fn validate_rejects_empty_allow_list() {
        let mut config = ClientConfig::default();
        config.upload.accepted_types.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_default_part() {
        let mut config = ClientConfig::default();
        config.default_part = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[swap]\ntimeout_secs = 0\n");
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value =
            toml::from_str("[backend]\nbase_url = \"x\"\nload_faces_path = \"/a/\"").unwrap();
        let overlay: toml::Value = toml::from_str("[backend]\nbase_url = \"y\"").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["backend"]["base_url"].as_str(), Some("y"));
        assert_eq!(merged["backend"]["load_faces_path"].as_str(), Some("/a/"));
    }

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        assert!(load_raw_config(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let parsed = resolve_config(stock_defaults_value(), Some(value)).unwrap();
        let defaults = ClientConfig::default();
        assert_eq!(parsed.default_part, defaults.default_part);
        assert_eq!(parsed.backend.base_url, defaults.backend.base_url);
        assert_eq!(parsed.swap.timeout_secs, defaults.swap.timeout_secs);
        assert_eq!(parsed.swap.reload_delay_secs, defaults.swap.reload_delay_secs);
        assert_eq!(parsed.upload.accepted_types, defaults.upload.accepted_types);
        assert_eq!(parsed.download.file_prefix, defaults.download.file_prefix);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value();
        for section in ["backend", "swap", "upload", "download"] {
            assert!(value.get(section).is_some(), "missing [{section}]");
        }
    }
}
