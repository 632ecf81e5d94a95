//! Presets for Razer laptops.
//!
//! A preset bundles a power mode, fan speed, boost levels and backlight
//! settings and applies them in one go.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::device::{ControlTransport, KeyMatrix, RazerLaptop};
use crate::error::{RazerError, Result};
use crate::protocol::PowerMode;
use crate::utils::parsing::parse_hex_color;

// =============================================================================
// Preset
// =============================================================================

/// User-level settings applied together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub power_mode: PowerMode,

    /// Manual fan speed in RPM, 0 for automatic.
    #[serde(default)]
    pub fan_rpm: u32,

    #[serde(default)]
    pub cpu_boost: Option<u8>,

    #[serde(default)]
    pub gpu_boost: Option<u8>,

    #[serde(default)]
    pub brightness: Option<u8>,

    /// Whole-keyboard colour as hex (`#RRGGBB` or `RRGGBB`).
    #[serde(default)]
    pub colour: Option<String>,
}

impl Preset {
    /// Apply every setting of this preset to `laptop`.
    ///
    /// Boost levels are stored before the mode switch so that switching to
    /// Custom sends them. A laptop already in Custom gets the boosts from
    /// `set_custom_boost` alone. The fan is left alone in Custom mode.
    pub fn apply<T: ControlTransport>(&self, laptop: &RazerLaptop<T>) -> Result<()> {
        // Validate before touching the device
        let colour = self.colour.as_deref().map(parse_hex_color).transpose()?;

        let current = laptop.get_state();
        let has_boost = self.cpu_boost.is_some() || self.gpu_boost.is_some();
        if has_boost {
            laptop.set_custom_boost(
                self.cpu_boost.unwrap_or(current.cpu_boost),
                self.gpu_boost.unwrap_or(current.gpu_boost),
            )?;
        }

        let already_custom =
            current.power_mode == PowerMode::Custom && self.power_mode == PowerMode::Custom;
        if !(has_boost && already_custom) {
            laptop.set_power_mode(self.power_mode)?;
        }

        if self.power_mode != PowerMode::Custom {
            laptop.set_fan_rpm(self.fan_rpm)?;
        }

        if let Some(brightness) = self.brightness {
            laptop.set_brightness(u32::from(brightness))?;
        }

        if let Some(colour) = colour {
            laptop.set_matrix(&KeyMatrix::filled(colour))?;
        }

        info!("Preset applied: {:?}", self);
        Ok(())
    }
}

// =============================================================================
// Built-in presets
// =============================================================================

/// Presets available without a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinPreset {
    /// EC-managed fan, Normal mode, dim backlight.
    Silent,
    /// EC-managed fan, Gaming mode.
    Balanced,
    /// Fan pinned at the model maximum, Gaming mode, full backlight.
    Performance,
}

impl BuiltinPreset {
    pub const ALL: [BuiltinPreset; 3] = [
        BuiltinPreset::Silent,
        BuiltinPreset::Balanced,
        BuiltinPreset::Performance,
    ];

    pub fn to_preset(&self) -> Preset {
        match self {
            BuiltinPreset::Silent => Preset {
                power_mode: PowerMode::Normal,
                fan_rpm: 0,
                cpu_boost: None,
                gpu_boost: None,
                brightness: Some(PRESET_BRIGHTNESS_DIM),
                colour: None,
            },
            BuiltinPreset::Balanced => Preset {
                power_mode: PowerMode::Gaming,
                fan_rpm: 0,
                cpu_boost: None,
                gpu_boost: None,
                brightness: Some(PRESET_BRIGHTNESS_MID),
                colour: None,
            },
            // Requests above the model ceiling are clamped on the way out
            BuiltinPreset::Performance => Preset {
                power_mode: PowerMode::Gaming,
                fan_rpm: u32::MAX,
                cpu_boost: None,
                gpu_boost: None,
                brightness: Some(u8::MAX),
                colour: None,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinPreset::Silent => "silent",
            BuiltinPreset::Balanced => "balanced",
            BuiltinPreset::Performance => "performance",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        let lower = name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == lower)
            .ok_or_else(|| {
                RazerError::InvalidArgument(format!(
                    "Unknown preset '{}'. Built-in: silent, balanced, performance",
                    name
                ))
            })
    }
}

impl std::fmt::Display for BuiltinPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

const PRESET_BRIGHTNESS_DIM: u8 = 32;
const PRESET_BRIGHTNESS_MID: u8 = 128;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Rgb;
    use crate::device::transport::mock::MockTransport;
    use crate::protocol::{BLADE_2018_ADV_PID, BLADE_2021_ADV_PID, CLASS_POWER, CMD_SET_BOOST};

    #[test]
    fn test_builtin_names() {
        for preset in BuiltinPreset::ALL {
            assert_eq!(BuiltinPreset::from_name(preset.name()).unwrap(), preset);
        }
        assert_eq!(
            BuiltinPreset::from_name("PERFORMANCE").unwrap(),
            BuiltinPreset::Performance
        );
        assert!(BuiltinPreset::from_name("turbo").is_err());
    }

    #[test]
    fn test_performance_preset_clamps_fan() {
        let transport = MockTransport::new();
        let laptop = RazerLaptop::new(transport.clone(), BLADE_2018_ADV_PID);
        BuiltinPreset::Performance.to_preset().apply(&laptop).unwrap();

        let state = laptop.get_state();
        assert_eq!(state.power_mode, PowerMode::Gaming);
        assert_eq!(state.fan_rpm, 5000);
    }

    #[test]
    fn test_custom_preset_sends_boost_with_mode() {
        let transport = MockTransport::new();
        let laptop = RazerLaptop::new(transport.clone(), BLADE_2021_ADV_PID);
        let preset = Preset {
            power_mode: PowerMode::Custom,
            fan_rpm: 4000,
            cpu_boost: Some(3),
            gpu_boost: None,
            brightness: None,
            colour: Some("#102030".into()),
        };
        preset.apply(&laptop).unwrap();

        let state = laptop.get_state();
        assert_eq!(state.power_mode, PowerMode::Custom);
        assert_eq!((state.cpu_boost, state.gpu_boost), (3, 1));
        assert_eq!(state.fan_rpm, 0);

        let boosts: Vec<u8> = transport
            .reports()
            .iter()
            .filter(|r| r.command_id.0 == CMD_SET_BOOST)
            .map(|r| r.args[2])
            .collect();
        assert_eq!(boosts, vec![3, 1]);
        assert_eq!(laptop.matrix().key(3, 7), Some(Rgb::new(0x10, 0x20, 0x30)));
    }

    #[test]
    fn test_custom_preset_on_custom_laptop_sends_choreography_once() {
        let transport = MockTransport::new();
        let laptop = RazerLaptop::new(transport.clone(), BLADE_2021_ADV_PID);
        laptop.set_power_mode(PowerMode::Custom).unwrap();
        transport.clear();

        let preset = Preset {
            power_mode: PowerMode::Custom,
            fan_rpm: 0,
            cpu_boost: Some(2),
            gpu_boost: Some(2),
            brightness: None,
            colour: None,
        };
        preset.apply(&laptop).unwrap();

        let reports = transport.reports();
        assert_eq!(reports.len(), 8);
        assert!(reports.iter().all(|r| r.command_class == CLASS_POWER));

        let boosts: Vec<u8> = reports
            .iter()
            .filter(|r| r.command_id.0 == CMD_SET_BOOST)
            .map(|r| r.args[2])
            .collect();
        assert_eq!(boosts, vec![2, 2]);
        assert_eq!(laptop.get_state().power_mode, PowerMode::Custom);
    }

    #[test]
    fn test_bad_colour_sends_nothing() {
        let transport = MockTransport::new();
        let laptop = RazerLaptop::new(transport.clone(), BLADE_2018_ADV_PID);
        let preset = Preset {
            colour: Some("zzz".into()),
            ..BuiltinPreset::Silent.to_preset()
        };
        assert!(preset.apply(&laptop).is_err());
        assert!(transport.events().is_empty());
    }

    #[test]
    fn test_preset_json() {
        let preset: Preset =
            serde_json::from_str(r#"{"power_mode": "gaming", "fan_rpm": 4200}"#).unwrap();
        assert_eq!(preset.power_mode, PowerMode::Gaming);
        assert_eq!(preset.fan_rpm, 4200);
        assert_eq!(preset.brightness, None);
    }
}
