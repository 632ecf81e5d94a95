//! Raw report transport.
//!
//! The EC is reached through HID feature reports on interface 2 of the
//! keyboard device (class SET_REPORT/GET_REPORT, wValue 0x0300). The
//! [`ControlTransport`] trait hides that so the engine can be driven by a
//! recording mock in tests.

use std::ffi::CStr;

use hidapi::{DeviceInfo, HidApi, HidDevice};
use tracing::{debug, warn};

use crate::error::{RazerError, Result};
use crate::protocol::{EC_INTERFACE, Pacing, RAZER_VID, REPORT_LEN, capabilities};

/// Feature report number used by the EC (hidapi wants it as the first byte).
const FEATURE_REPORT_ID: u8 = 0x00;

/// Buffer length including the leading report number.
const FEATURE_BUF_LEN: usize = REPORT_LEN + 1;

// =============================================================================
// Trait
// =============================================================================

/// Byte-level access to the controller.
pub trait ControlTransport: Send {
    /// Send one encoded report.
    fn write_control_report(&mut self, report: &[u8; REPORT_LEN]) -> Result<()>;

    /// Read the controller's pending response. May return fewer than 90
    /// bytes; the engine treats that as a short response.
    fn read_control_report(&mut self) -> Result<Vec<u8>>;

    /// Wait out a pacing window after a write.
    fn pause(&mut self, pacing: Pacing) {
        if !pacing.is_none() {
            std::thread::sleep(pacing.min);
        }
    }
}

// =============================================================================
// HidTransport
// =============================================================================

/// hidapi-backed transport for a connected Blade.
pub struct HidTransport {
    device: HidDevice,
    product_id: u16,
}

impl HidTransport {
    /// Open the first supported Razer laptop.
    ///
    /// # Errors
    /// Returns `DeviceNotFound` if no supported product is connected.
    pub fn open() -> Result<Self> {
        Self::open_matching(capabilities::is_supported)
    }

    /// Open a specific product id, supported or not.
    pub fn open_product(product_id: u16) -> Result<Self> {
        Self::open_matching(|pid| pid == product_id)
    }

    /// Open by hidraw path. The product id is looked up from enumeration.
    pub fn open_path(path: &CStr) -> Result<Self> {
        let api = HidApi::new()?;
        let product_id = api
            .device_list()
            .find(|info| info.path() == path)
            .map(|info| info.product_id())
            .ok_or(RazerError::DeviceNotFound)?;
        let device = api.open_path(path)?;

        Ok(Self { device, product_id })
    }

    fn open_matching(wanted: impl Fn(u16) -> bool) -> Result<Self> {
        let api = HidApi::new()?;

        let candidates: Vec<&DeviceInfo> = api
            .device_list()
            .filter(|info| info.vendor_id() == RAZER_VID && wanted(info.product_id()))
            .collect();

        let info = select_ec_interface(&candidates, |info| info.interface_number())
            .ok_or(RazerError::DeviceNotFound)?;

        debug!(
            "Opening 0x{:04X} on interface {} ({})",
            info.product_id(),
            info.interface_number(),
            info.path().to_string_lossy()
        );

        let device = info.open_device(&api)?;
        Ok(Self {
            device,
            product_id: info.product_id(),
        })
    }

    /// List connected Razer laptops.
    ///
    /// Returns (path, product_id, product name) for every EC interface found.
    pub fn list_devices() -> Result<Vec<(String, u16, Option<String>)>> {
        let api = HidApi::new()?;

        let devices = api
            .device_list()
            .filter(|info| {
                info.vendor_id() == RAZER_VID
                    && capabilities::is_supported(info.product_id())
                    && info.interface_number() == EC_INTERFACE
            })
            .map(|info| {
                (
                    info.path().to_string_lossy().into_owned(),
                    info.product_id(),
                    info.product_string().map(String::from),
                )
            })
            .collect();

        Ok(devices)
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }
}

/// Pick the candidate on the EC interface.
///
/// Keyboard nodes expose several interfaces and only interface 2 carries
/// the EC; reports written to any other node are dropped by the firmware.
fn select_ec_interface<T>(candidates: &[T], interface: impl Fn(&T) -> i32) -> Option<&T> {
    let found = candidates
        .iter()
        .find(|candidate| interface(candidate) == EC_INTERFACE);
    if found.is_none() && !candidates.is_empty() {
        let seen: Vec<i32> = candidates.iter().map(&interface).collect();
        warn!(
            "Razer device found but no EC interface {} (saw interfaces {:?})",
            EC_INTERFACE, seen
        );
    }
    found
}

impl ControlTransport for HidTransport {
    fn write_control_report(&mut self, report: &[u8; REPORT_LEN]) -> Result<()> {
        let mut buf = [0u8; FEATURE_BUF_LEN];
        buf[0] = FEATURE_REPORT_ID;
        buf[1..].copy_from_slice(report);
        self.device.send_feature_report(&buf)?;
        Ok(())
    }

    fn read_control_report(&mut self) -> Result<Vec<u8>> {
        let mut buf = [0u8; FEATURE_BUF_LEN];
        buf[0] = FEATURE_REPORT_ID;
        let n = self.device.get_feature_report(&mut buf)?;

        // The returned length counts the report number
        Ok(buf.get(1..n.min(FEATURE_BUF_LEN)).unwrap_or(&[]).to_vec())
    }
}

// =============================================================================
// Test transport
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_ec_interface() {
        let nodes = [(0, "keyboard"), (1, "consumer"), (2, "ec")];
        let picked = select_ec_interface(&nodes, |node| node.0).unwrap();
        assert_eq!(picked.1, "ec");
    }

    #[test]
    fn test_select_ec_interface_never_falls_back() {
        let nodes = [(0, "keyboard"), (1, "consumer")];
        assert!(select_ec_interface(&nodes, |node| node.0).is_none());

        let none: [(i32, &str); 0] = [];
        assert!(select_ec_interface(&none, |node| node.0).is_none());
    }
}
