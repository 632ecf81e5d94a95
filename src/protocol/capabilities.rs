//! Per-model hardware limits.
//!
//! Pure lookups keyed by USB product id. Products missing from an
//! allow-list are treated as not having the feature.

use crate::protocol::commands::*;

// =============================================================================
// Fan limits
// =============================================================================

/// Lowest manual fan speed the EC accepts, in RPM.
pub const FAN_RPM_FLOOR: u32 = 3500;

/// Fan ceiling for older and Stealth models.
pub const MAX_FAN_RPM_DEFAULT: u32 = 5000;

/// Fan ceiling for the post-2019 Blade chassis.
pub const MAX_FAN_RPM_HIGH: u32 = 5300;

/// Every product this driver knows how to talk to.
pub const SUPPORTED_PIDS: &[u16] = &[
    BLADE_STEALTH_2016_PID,
    BLADE_QHD_PID,
    BLADE_PRO_2016_PID,
    BLADE_LATE_2016_PID,
    BLADE_PRO_2017_PID,
    BLADE_STEALTH_2017_PID,
    BLADE_2018_ADV_PID,
    BLADE_2018_BASE_PID,
    BLADE_2018_MERCURY_PID,
    BLADE_STEALTH_2019_PID,
    BLADE_2019_ADV_PID,
    BLADE_2019_MERCURY_PID,
    BLADE_2019_BASE_PID,
    BLADE_PRO_2019_PID,
    BLADE_2019_STUDIO_PID,
    BLADE_STEALTH_2020_PID,
    BLADE_2020_ADV_PID,
    BLADE_2020_BASE_PID,
    BLADE_PRO_2020_PID,
    BLADE_2021_ADV_PID,
    BLADE_2021_BASE_PID,
    BLADE_14_2021_PID,
    BLADE_PRO_2021_PID,
];

const HIGH_FAN_TIER: &[u16] = &[
    BLADE_2019_ADV_PID,
    BLADE_2019_MERCURY_PID,
    BLADE_2019_BASE_PID,
    BLADE_PRO_2019_PID,
    BLADE_2019_STUDIO_PID,
    BLADE_2020_ADV_PID,
    BLADE_2020_BASE_PID,
    BLADE_PRO_2020_PID,
    BLADE_2021_ADV_PID,
    BLADE_2021_BASE_PID,
    BLADE_14_2021_PID,
    BLADE_PRO_2021_PID,
];

const CREATOR_MODE: &[u16] = &[
    BLADE_2019_STUDIO_PID,
    BLADE_2020_ADV_PID,
    BLADE_PRO_2020_PID,
    BLADE_2021_ADV_PID,
    BLADE_PRO_2021_PID,
];

const BOOST_LEVEL3: &[u16] = &[BLADE_2021_ADV_PID, BLADE_14_2021_PID, BLADE_PRO_2021_PID];

// =============================================================================
// Lookups
// =============================================================================

pub fn is_supported(product_id: u16) -> bool {
    SUPPORTED_PIDS.contains(&product_id)
}

/// Maximum manual fan speed in RPM (always a multiple of 100).
pub fn max_fan_rpm(product_id: u16) -> u32 {
    if HIGH_FAN_TIER.contains(&product_id) {
        MAX_FAN_RPM_HIGH
    } else {
        MAX_FAN_RPM_DEFAULT
    }
}

/// Convert a requested RPM into the one-byte wire value (RPM / 100).
///
/// Requests below [`FAN_RPM_FLOOR`] are raised to it; requests above the
/// model ceiling are lowered to it.
pub fn clamp_fan_rpm(requested_rpm: u32, product_id: u16) -> u8 {
    let rpm = requested_rpm.clamp(FAN_RPM_FLOOR, max_fan_rpm(product_id));
    (rpm / 100) as u8
}

pub fn creator_mode_allowed(product_id: u16) -> bool {
    CREATOR_MODE.contains(&product_id)
}

pub fn boost_mode_level3_allowed(product_id: u16) -> bool {
    BOOST_LEVEL3.contains(&product_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_default_tier() {
        let pid = BLADE_2018_ADV_PID;
        assert_eq!(max_fan_rpm(pid), 5000);
        assert_eq!(clamp_fan_rpm(6000, pid), 50);
        assert_eq!(clamp_fan_rpm(1000, pid), 35);
        assert_eq!(clamp_fan_rpm(4200, pid), 42);
        assert_eq!(clamp_fan_rpm(4250, pid), 42);
    }

    #[test]
    fn test_clamp_high_tier() {
        let pid = BLADE_2020_ADV_PID;
        assert_eq!(max_fan_rpm(pid), 5300);
        assert_eq!(clamp_fan_rpm(9000, pid), 53);
        assert_eq!(clamp_fan_rpm(u32::MAX, pid), 53);
    }

    #[test]
    fn test_unknown_product_gets_defaults() {
        assert!(!is_supported(0xFFFF));
        assert_eq!(max_fan_rpm(0xFFFF), MAX_FAN_RPM_DEFAULT);
        assert!(!creator_mode_allowed(0xFFFF));
        assert!(!boost_mode_level3_allowed(0xFFFF));
    }

    #[test]
    fn test_allow_lists_are_supported_products() {
        for pid in HIGH_FAN_TIER.iter().chain(CREATOR_MODE).chain(BOOST_LEVEL3) {
            assert!(is_supported(*pid), "0x{:04X} missing from SUPPORTED_PIDS", pid);
        }
    }

    #[test]
    fn test_gating() {
        assert!(creator_mode_allowed(BLADE_2020_ADV_PID));
        assert!(!creator_mode_allowed(BLADE_2018_ADV_PID));
        assert!(boost_mode_level3_allowed(BLADE_PRO_2021_PID));
        assert!(!boost_mode_level3_allowed(BLADE_2020_ADV_PID));
    }
}
