//! Settings storage and persistence.
//!
//! Cross-platform: uses the OS config directory. Only user intent is kept
//! here; nothing read back from the controller is written to disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{BuiltinPreset, Preset};
use crate::error::{RazerError, Result};
use crate::protocol::{BrightnessPath, PowerMode};

// =============================================================================
// Config Path
// =============================================================================

const APP_NAME: &str = "razer-laptop-control";
const CONFIG_FILE: &str = "config.json";

/// Get the configuration directory path.
/// - Linux: ~/.config/razer-laptop-control/
/// - Windows: %APPDATA%\razer-laptop-control\
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| RazerError::Config("Could not find config directory".into()))
}

/// Get the full path to the config file.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

// =============================================================================
// Storage Structures
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Open this product id instead of the first supported one.
    #[serde(default)]
    pub product_id: Option<u16>,

    /// Backlight command class override.
    #[serde(default)]
    pub brightness_path: Option<BrightnessPath>,

    /// User presets by lowercase name. These shadow built-ins.
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,
}

impl AppConfig {
    /// Look up a preset, user-defined first, then built-in.
    pub fn preset(&self, name: &str) -> Result<Preset> {
        if let Some(preset) = self.presets.get(&name.to_lowercase()) {
            return Ok(preset.clone());
        }
        BuiltinPreset::from_name(name)
            .map(|builtin| builtin.to_preset())
            .map_err(|_| RazerError::Config(format!("Preset '{}' not found", name)))
    }

    /// Every preset name that [`preset`](Self::preset) would resolve.
    pub fn preset_names(&self) -> Vec<String> {
        let mut names: Vec<String> = BuiltinPreset::ALL
            .iter()
            .map(|builtin| builtin.name().to_string())
            .chain(self.presets.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

// =============================================================================
// Storage Functions
// =============================================================================

/// Load configuration from disk. A missing file yields the default config.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| RazerError::Config(format!("Failed to read config: {}", e)))?;

    serde_json::from_str(&content)
        .map_err(|e| RazerError::Config(format!("Failed to parse config: {}", e)))
}

/// Save configuration to disk.
pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to(&get_config_path()?, config)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| RazerError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| RazerError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, content)
        .map_err(|e| RazerError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Create the config file with an example preset if it does not exist.
///
/// Returns the path and whether a new file was written.
pub fn ensure_config_exists() -> Result<(PathBuf, bool)> {
    let path = get_config_path()?;
    if path.exists() {
        return Ok((path, false));
    }

    info!("Config file not found. Creating default at {:?}", path);
    save_config_to(&path, &example_config())?;
    Ok((path, true))
}

fn example_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.presets.insert(
        "quiet-custom".to_string(),
        Preset {
            power_mode: PowerMode::Custom,
            fan_rpm: 0,
            cpu_boost: Some(0),
            gpu_boost: Some(0),
            brightness: Some(64),
            colour: Some("#00FF00".to_string()),
        },
    );
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("razer-laptop-control-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_missing_file_gives_default() {
        let config = load_config_from(&scratch_path("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = scratch_path("saved.json");
        let mut config = example_config();
        config.product_id = Some(0x0233);
        config.brightness_path = Some(BrightnessPath::Ec);

        save_config_to(&path, &config).unwrap();
        let loaded = load_config_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let path = scratch_path("broken.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_config_from(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, RazerError::Config(_)));
    }

    #[test]
    fn test_partial_json() {
        let config: AppConfig =
            serde_json::from_str(r#"{"brightness_path": "ec"}"#).unwrap();
        assert_eq!(config.brightness_path, Some(BrightnessPath::Ec));
        assert!(config.presets.is_empty());
    }

    #[test]
    fn test_preset_lookup() {
        let mut config = example_config();
        assert_eq!(
            config.preset("Quiet-Custom").unwrap().power_mode,
            PowerMode::Custom
        );
        assert_eq!(
            config.preset("silent").unwrap(),
            BuiltinPreset::Silent.to_preset()
        );
        assert!(config.preset("nope").is_err());

        // User presets shadow built-ins
        let mut mine = BuiltinPreset::Silent.to_preset();
        mine.brightness = Some(0);
        config.presets.insert("silent".into(), mine.clone());
        assert_eq!(config.preset("silent").unwrap(), mine);

        assert_eq!(
            config.preset_names(),
            vec!["balanced", "performance", "quiet-custom", "silent"]
        );
    }
}
