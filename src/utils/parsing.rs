//! Parsing utilities for CLI arguments and configuration values.

use crate::device::Rgb;
use crate::error::{RazerError, Result};
use crate::protocol::PowerMode;

// =============================================================================
// Color Parsing
// =============================================================================

/// Parse a hex colour string.
///
/// Accepts `#RRGGBB` or `RRGGBB`.
///
/// # Example
/// ```
/// use razer_laptop_control::utils::parsing::parse_hex_color;
///
/// let colour = parse_hex_color("#FF5500").unwrap();
/// assert_eq!((colour.red, colour.green, colour.blue), (255, 85, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Rgb> {
    let digits = hex.trim_start_matches('#');
    let invalid = || RazerError::InvalidArgument(format!("Invalid color hex: {}", hex));

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
    };
    Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

// =============================================================================
// Power and fan
// =============================================================================

/// Parse a power mode name (case-insensitive).
pub fn parse_power_mode(name: &str) -> Result<PowerMode> {
    match name.to_lowercase().as_str() {
        "normal" | "balanced" => Ok(PowerMode::Normal),
        "gaming" => Ok(PowerMode::Gaming),
        "creator" => Ok(PowerMode::Creator),
        "custom" => Ok(PowerMode::Custom),
        _ => Err(RazerError::InvalidArgument(format!(
            "Unknown power mode '{}'. Use: normal, gaming, creator, or custom",
            name
        ))),
    }
}

/// Parse a fan speed: `auto` (returned as 0) or an RPM value.
pub fn parse_fan_rpm(value: &str) -> Result<u32> {
    if value.eq_ignore_ascii_case("auto") {
        return Ok(0);
    }
    value.parse().map_err(|_| {
        RazerError::InvalidArgument(format!(
            "Invalid fan speed '{}'. Use 'auto' or an RPM value",
            value
        ))
    })
}

/// Parse a USB product id given in hex, with or without `0x`.
pub fn parse_product_id(value: &str) -> Result<u16> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    let invalid = || RazerError::InvalidArgument(format!("Invalid product id: {}", value));
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u16::from_str_radix(digits, 16).map_err(|_| invalid())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color_with_hash() {
        assert_eq!(parse_hex_color("#FF0000").unwrap(), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_parse_hex_color_without_hash() {
        assert_eq!(parse_hex_color("00ff00").unwrap(), Rgb::new(0, 255, 0));
    }

    #[test]
    fn test_parse_hex_color_invalid() {
        assert!(parse_hex_color("FFF").is_err());
        assert!(parse_hex_color("").is_err());
        assert!(parse_hex_color("GG0000").is_err());
        assert!(parse_hex_color("ééé").is_err());
        assert!(parse_hex_color("+1+2+3").is_err());
        assert!(parse_hex_color("#-10000").is_err());
    }

    #[test]
    fn test_parse_power_mode() {
        assert_eq!(parse_power_mode("Gaming").unwrap(), PowerMode::Gaming);
        assert_eq!(parse_power_mode("CUSTOM").unwrap(), PowerMode::Custom);
        assert!(parse_power_mode("turbo").is_err());
    }

    #[test]
    fn test_parse_fan_rpm() {
        assert_eq!(parse_fan_rpm("auto").unwrap(), 0);
        assert_eq!(parse_fan_rpm("AUTO").unwrap(), 0);
        assert_eq!(parse_fan_rpm("4200").unwrap(), 4200);
        assert!(parse_fan_rpm("-1").is_err());
        assert!(parse_fan_rpm("fast").is_err());
    }

    #[test]
    fn test_parse_product_id() {
        assert_eq!(parse_product_id("0x0233").unwrap(), 0x0233);
        assert_eq!(parse_product_id("026D").unwrap(), 0x026D);
        assert!(parse_product_id("xyz").is_err());
        assert!(parse_product_id("+233").is_err());
        assert!(parse_product_id("0x").is_err());
    }
}
