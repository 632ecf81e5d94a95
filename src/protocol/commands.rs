//! Command definitions and report builders for the Razer laptop EC.
//!
//! Byte sequences were reverse-engineered from USB captures of Razer
//! Synapse on Blade laptops. Each builder returns a request [`Report`] ready
//! for the transaction engine.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use crate::error::{RazerError, Result};
use crate::protocol::report::Report;

// =============================================================================
// Device identifiers
// =============================================================================

/// Razer Vendor ID.
pub const RAZER_VID: u16 = 0x1532;

/// USB interface that carries the EC control reports (wIndex 0x0002).
pub const EC_INTERFACE: i32 = 2;

pub const BLADE_STEALTH_2016_PID: u16 = 0x0205;
pub const BLADE_QHD_PID: u16 = 0x020F;
pub const BLADE_PRO_2016_PID: u16 = 0x0210;
pub const BLADE_LATE_2016_PID: u16 = 0x0224;
pub const BLADE_PRO_2017_PID: u16 = 0x0225;
pub const BLADE_STEALTH_2017_PID: u16 = 0x0232;
pub const BLADE_2018_ADV_PID: u16 = 0x0233;
pub const BLADE_2018_BASE_PID: u16 = 0x023B;
pub const BLADE_2018_MERCURY_PID: u16 = 0x0240;
pub const BLADE_STEALTH_2019_PID: u16 = 0x0239;
pub const BLADE_2019_ADV_PID: u16 = 0x023A;
pub const BLADE_2019_MERCURY_PID: u16 = 0x0245;
pub const BLADE_2019_BASE_PID: u16 = 0x0246;
pub const BLADE_PRO_2019_PID: u16 = 0x024C;
pub const BLADE_2019_STUDIO_PID: u16 = 0x024D;
pub const BLADE_STEALTH_2020_PID: u16 = 0x0252;
pub const BLADE_2020_ADV_PID: u16 = 0x0253;
pub const BLADE_2020_BASE_PID: u16 = 0x0255;
pub const BLADE_PRO_2020_PID: u16 = 0x0256;
pub const BLADE_2021_ADV_PID: u16 = 0x026D;
pub const BLADE_2021_BASE_PID: u16 = 0x026F;
pub const BLADE_14_2021_PID: u16 = 0x0270;
pub const BLADE_PRO_2021_PID: u16 = 0x0279;

// =============================================================================
// Command classes and ids
// =============================================================================

/// Keyboard backlight and matrix commands.
pub const CLASS_LED: u8 = 0x03;

/// Fan and power management commands.
pub const CLASS_POWER: u8 = 0x0D;

/// EC-side backlight commands used by some firmware.
pub const CLASS_EC_LED: u8 = 0x0E;

pub const CMD_SET_FAN_RPM: u8 = 0x01;
pub const CMD_GET_FAN_RPM: u8 = 0x81;
pub const CMD_SET_POWER_MODE: u8 = 0x02;
pub const CMD_GET_POWER_MODE: u8 = 0x82;
pub const CMD_SET_BOOST: u8 = 0x07;
pub const CMD_GET_BOOST: u8 = 0x87;

pub const CMD_SET_BRIGHTNESS: u8 = 0x03;
pub const CMD_GET_BRIGHTNESS: u8 = 0x83;
pub const CMD_EC_SET_BRIGHTNESS: u8 = 0x04;
pub const CMD_EC_GET_BRIGHTNESS: u8 = 0x84;

/// Render the matrix buffer ("display profile").
pub const CMD_DISPLAY_PROFILE: u8 = 0x0A;

/// Write one row of the matrix buffer.
pub const CMD_SET_ROW: u8 = 0x0B;

// =============================================================================
// Argument constants
// =============================================================================

/// Storage selector for LED settings.
pub const VARSTORE: u8 = 0x01;

/// LED id of the keyboard backlight.
pub const BACKLIGHT_LED: u8 = 0x05;

/// Effect id telling the firmware to show the custom matrix buffer.
pub const EFFECT_CUSTOM_FRAME: u8 = 0x05;

/// Matrix dimensions.
pub const ROWS: usize = 6;
pub const KEYS_PER_ROW: usize = 15;

/// Colour bytes per row (15 keys, RGB).
pub const ROW_BYTES: usize = KEYS_PER_ROW * 3;

/// Row report: marker at args[0], row at args[1], flag at args[3],
/// colour data from args[7].
const ROW_MARKER: u8 = 0xFF;
const ROW_FLAG: u8 = 0x0F;
const ROW_COLOUR_OFFSET: usize = 7;
const ROW_DATA_SIZE: u8 = 0x34;

const POWER_DATA_SIZE: u8 = 0x04;
const VALUE_DATA_SIZE: u8 = 0x03;

// =============================================================================
// Enums
// =============================================================================

/// Performance profile of the EC.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum PowerMode {
    Normal = 0,
    Gaming = 1,
    Creator = 2,
    Custom = 4,
}

impl PowerMode {
    pub fn name(&self) -> &'static str {
        match self {
            PowerMode::Normal => "Normal",
            PowerMode::Gaming => "Gaming",
            PowerMode::Creator => "Creator",
            PowerMode::Custom => "Custom",
        }
    }
}

impl std::fmt::Display for PowerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fan zone selector carried in args[1] of fan and power commands.
///
/// Sequences address zone 1 first, then repeat for zone 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanZone {
    Primary,
    Secondary,
}

impl FanZone {
    pub const fn id(&self) -> u8 {
        match self {
            FanZone::Primary => 0x01,
            FanZone::Secondary => 0x02,
        }
    }
}

/// Boost target selector carried in args[1] of boost commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostTarget {
    Cpu,
    Gpu,
}

impl BoostTarget {
    pub const fn id(&self) -> u8 {
        match self {
            BoostTarget::Cpu => 0x01,
            BoostTarget::Gpu => 0x02,
        }
    }

    /// Highest level the EC accepts for this target.
    pub const fn max_level(&self) -> u8 {
        match self {
            BoostTarget::Cpu => 3,
            BoostTarget::Gpu => 2,
        }
    }
}

impl std::fmt::Display for BoostTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoostTarget::Cpu => write!(f, "CPU"),
            BoostTarget::Gpu => write!(f, "GPU"),
        }
    }
}

/// Which command class carries the backlight brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrightnessPath {
    /// Class 0x03: args `[VARSTORE, BACKLIGHT_LED, value]`.
    #[default]
    Standard,
    /// Class 0x0E: args `[VARSTORE, value]`.
    Ec,
}

// =============================================================================
// Report Builders
// =============================================================================

fn request(class: u8, id: u8, data_size: u8, args: &[u8]) -> Report {
    let mut report = Report::new(class, id, data_size);
    report.args[..args.len()].copy_from_slice(args);
    report
}

/// Read the power mode of a zone. Also used as the begin/end marker of the
/// fan and boost sequences.
pub fn build_power_mode_query(zone: FanZone) -> Report {
    request(
        CLASS_POWER,
        CMD_GET_POWER_MODE,
        POWER_DATA_SIZE,
        &[0x00, zone.id()],
    )
}

/// Set the power mode of a zone and whether its fan is under manual control.
pub fn build_power_mode_cmd(zone: FanZone, mode: PowerMode, manual_fan: bool) -> Report {
    request(
        CLASS_POWER,
        CMD_SET_POWER_MODE,
        POWER_DATA_SIZE,
        &[0x00, zone.id(), mode.into(), manual_fan as u8],
    )
}

/// Set a manual fan speed; `rpm_byte` is RPM / 100.
pub fn build_fan_rpm_cmd(zone: FanZone, rpm_byte: u8) -> Report {
    request(
        CLASS_POWER,
        CMD_SET_FAN_RPM,
        VALUE_DATA_SIZE,
        &[0x00, zone.id(), rpm_byte],
    )
}

pub fn build_fan_rpm_query(zone: FanZone) -> Report {
    request(
        CLASS_POWER,
        CMD_GET_FAN_RPM,
        VALUE_DATA_SIZE,
        &[0x00, zone.id()],
    )
}

/// Read a boost level. The custom-mode sequence sends it before each set.
pub fn build_boost_query(target: BoostTarget) -> Report {
    request(
        CLASS_POWER,
        CMD_GET_BOOST,
        VALUE_DATA_SIZE,
        &[0x00, target.id()],
    )
}

pub fn build_boost_cmd(target: BoostTarget, level: u8) -> Report {
    request(
        CLASS_POWER,
        CMD_SET_BOOST,
        VALUE_DATA_SIZE,
        &[0x00, target.id(), level],
    )
}

pub fn build_brightness_cmd(path: BrightnessPath, value: u8) -> Report {
    match path {
        BrightnessPath::Standard => request(
            CLASS_LED,
            CMD_SET_BRIGHTNESS,
            VALUE_DATA_SIZE,
            &[VARSTORE, BACKLIGHT_LED, value],
        ),
        BrightnessPath::Ec => request(CLASS_EC_LED, CMD_EC_SET_BRIGHTNESS, 0x02, &[VARSTORE, value]),
    }
}

pub fn build_brightness_query(path: BrightnessPath) -> Report {
    match path {
        BrightnessPath::Standard => request(
            CLASS_LED,
            CMD_GET_BRIGHTNESS,
            VALUE_DATA_SIZE,
            &[VARSTORE, BACKLIGHT_LED],
        ),
        BrightnessPath::Ec => request(CLASS_EC_LED, CMD_EC_GET_BRIGHTNESS, 0x01, &[VARSTORE]),
    }
}

/// Extract the brightness byte from a query response.
pub fn parse_brightness(path: BrightnessPath, response: &Report) -> u8 {
    match path {
        BrightnessPath::Standard => response.args[2],
        BrightnessPath::Ec => response.args[1],
    }
}

/// Write one matrix row.
///
/// # Errors
/// Returns `InvalidArgument` if `row` is not 0-5 or `colours` is not
/// exactly 45 bytes.
pub fn build_row_cmd(row: usize, colours: &[u8]) -> Result<Report> {
    if row >= ROWS {
        return Err(RazerError::InvalidArgument(format!(
            "Row {} out of range (0-{})",
            row,
            ROWS - 1
        )));
    }
    if colours.len() != ROW_BYTES {
        return Err(RazerError::InvalidArgument(format!(
            "Row data must be {} bytes, got {}",
            ROW_BYTES,
            colours.len()
        )));
    }

    let mut report = request(
        CLASS_LED,
        CMD_SET_ROW,
        ROW_DATA_SIZE,
        &[ROW_MARKER, row as u8, 0x00, ROW_FLAG],
    );
    report.write_args(ROW_COLOUR_OFFSET, colours)?;
    Ok(report)
}

/// Tell the firmware to render the matrix buffer.
pub fn build_display_cmd() -> Report {
    request(
        CLASS_LED,
        CMD_DISPLAY_PROFILE,
        0x02,
        &[EFFECT_CUSTOM_FRAME, 0x00],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_mode_values() {
        assert_eq!(u8::from(PowerMode::Normal), 0);
        assert_eq!(u8::from(PowerMode::Gaming), 1);
        assert_eq!(u8::from(PowerMode::Creator), 2);
        assert_eq!(u8::from(PowerMode::Custom), 4);
        assert_eq!(PowerMode::try_from(4u8).unwrap(), PowerMode::Custom);
        assert!(PowerMode::try_from(3u8).is_err());
    }

    #[test]
    fn test_fan_mode_cmd() {
        let cmd = build_power_mode_cmd(FanZone::Secondary, PowerMode::Gaming, true);
        let buf = cmd.encode().unwrap();
        assert_eq!(&buf[5..8], &[0x04, 0x0D, 0x02]);
        assert_eq!(&buf[8..12], &[0x00, 0x02, 0x01, 0x01]);
    }

    #[test]
    fn test_fan_rpm_cmd() {
        let buf = build_fan_rpm_cmd(FanZone::Primary, 42).encode().unwrap();
        assert_eq!(&buf[5..11], &[0x03, 0x0D, 0x01, 0x00, 0x01, 42]);
    }

    #[test]
    fn test_markers_are_queries() {
        let marker = build_power_mode_query(FanZone::Primary);
        assert!(marker.command_id.is_query());
        assert_eq!(marker.command_id.set().0, CMD_SET_POWER_MODE);
        assert!(build_boost_query(BoostTarget::Gpu).command_id.is_query());
    }

    #[test]
    fn test_brightness_paths() {
        let standard = build_brightness_cmd(BrightnessPath::Standard, 200);
        assert_eq!(standard.command_class, CLASS_LED);
        assert_eq!(&standard.args[..3], &[VARSTORE, BACKLIGHT_LED, 200]);

        let ec = build_brightness_cmd(BrightnessPath::Ec, 200);
        assert_eq!(ec.command_class, CLASS_EC_LED);
        assert_eq!(&ec.args[..2], &[VARSTORE, 200]);

        let mut response = build_brightness_query(BrightnessPath::Standard);
        response.args[2] = 77;
        assert_eq!(parse_brightness(BrightnessPath::Standard, &response), 77);
    }

    #[test]
    fn test_row_cmd_layout() {
        let colours: Vec<u8> = (0..ROW_BYTES as u8).collect();
        let cmd = build_row_cmd(3, &colours).unwrap();
        let buf = cmd.encode().unwrap();

        assert_eq!(&buf[5..8], &[0x34, CLASS_LED, CMD_SET_ROW]);
        assert_eq!(&buf[8..12], &[0xFF, 0x03, 0x00, 0x0F]);
        assert_eq!(&buf[15..15 + ROW_BYTES], colours.as_slice());
    }

    #[test]
    fn test_row_cmd_validation() {
        assert!(build_row_cmd(6, &[0u8; ROW_BYTES]).is_err());
        assert!(build_row_cmd(0, &[0u8; 44]).is_err());
        assert!(build_row_cmd(0, &[0u8; 46]).is_err());
    }

    #[test]
    fn test_display_cmd() {
        let cmd = build_display_cmd();
        assert_eq!(cmd.command_class, CLASS_LED);
        assert_eq!(cmd.command_id.0, CMD_DISPLAY_PROFILE);
        assert_eq!(&cmd.args[..2], &[0x05, 0x00]);
    }
}
