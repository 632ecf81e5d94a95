//! Razer Blade laptop command layer.
//!
//! High-level operations (fan, power mode, boost, backlight, key matrix)
//! built on the transaction engine. Each operation holds the device lock
//! from validation through the last write, so sequences from concurrent
//! callers never interleave on the wire.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::device::engine::{self, Sequence, StepFault};
use crate::device::state::{
    DeviceState, KeyMatrix, Row, StateSnapshot, pack_row, row_out_of_range, unpack_row,
};
use crate::device::transport::{ControlTransport, HidTransport};
use crate::error::{ErrorKind, RazerError, Result};
use crate::protocol::{
    BoostTarget, BrightnessPath, FanZone, Pacing, PowerMode, ROWS, Report, build_boost_cmd,
    build_boost_query, build_brightness_cmd, build_brightness_query, build_display_cmd,
    build_fan_rpm_cmd, build_fan_rpm_query, build_power_mode_cmd, build_power_mode_query,
    build_row_cmd, capabilities, parse_brightness,
};

struct Inner<T> {
    transport: T,
    state: DeviceState,
    brightness_path: BrightnessPath,
    last_faults: Vec<StepFault>,
}

impl<T: ControlTransport> Inner<T> {
    fn run(&mut self, sequence: Sequence) {
        self.last_faults = sequence.transmit(&mut self.transport);
        if !self.last_faults.is_empty() {
            warn!("{} step(s) failed", self.last_faults.len());
        }
    }

    fn exchange(&mut self, request: &Report, pacing: Pacing) -> Result<Report> {
        let exchange = engine::request_response(&mut self.transport, request, pacing)?;
        self.last_faults = exchange
            .fault
            .map(|kind| StepFault {
                command_class: request.command_class,
                command_id: request.command_id.0,
                kind,
            })
            .into_iter()
            .collect();

        match exchange.fault {
            // The controller answered; a bad status is logged, the data kept
            Some(ErrorKind::DeviceBusy)
            | Some(ErrorKind::DeviceFailure)
            | Some(ErrorKind::DeviceTimeout)
            | Some(ErrorKind::DeviceNotSupported)
            | Some(ErrorKind::UnmatchedResponse) => Ok(exchange.response),
            _ => exchange.into_result(),
        }
    }

    /// Fail if the last exchange recorded a fault, even one whose data was
    /// kept.
    fn require_clean_answer(&self) -> Result<()> {
        match self.last_faults.first() {
            None => Ok(()),
            Some(fault) => Err(RazerError::DeviceStatus {
                kind: fault.kind,
                class: fault.command_class,
                id: fault.command_id,
            }),
        }
    }

    fn read_fan_rpm(&mut self) -> Result<u32> {
        let response = self.exchange(&build_fan_rpm_query(FanZone::Primary), Pacing::SHORT)?;
        Ok(u32::from(response.args[2]) * 100)
    }

    fn read_power_mode(&mut self) -> Result<(PowerMode, bool)> {
        let response = self.exchange(&build_power_mode_query(FanZone::Primary), Pacing::SHORT)?;
        let mode = PowerMode::try_from(response.args[2]).map_err(|_| {
            RazerError::InvalidResponse {
                message: format!("unknown power mode 0x{:02X}", response.args[2]),
            }
        })?;
        Ok((mode, response.args[3] != 0))
    }

    fn read_boost(&mut self, target: BoostTarget) -> Result<u8> {
        let response = self.exchange(&build_boost_query(target), Pacing::SHORT)?;
        let level = response.args[2];
        if level > target.max_level() {
            return Err(RazerError::InvalidResponse {
                message: format!("{} boost {} out of range", target, level),
            });
        }
        Ok(level)
    }
}

// =============================================================================
// RazerLaptop
// =============================================================================

/// Handle to one laptop's embedded controller.
///
/// All methods take `&self`; wrap the handle in an `Arc` to share it
/// between threads.
///
/// # Example
///
/// ```no_run
/// use razer_laptop_control::device::RazerLaptop;
/// use razer_laptop_control::protocol::PowerMode;
///
/// let laptop = RazerLaptop::open()?;
/// laptop.set_power_mode(PowerMode::Gaming)?;
/// laptop.set_fan_rpm(4200)?;
/// println!("{}", laptop.get_state());
/// # Ok::<(), razer_laptop_control::error::RazerError>(())
/// ```
pub struct RazerLaptop<T: ControlTransport = HidTransport> {
    inner: Mutex<Inner<T>>,
}

impl RazerLaptop<HidTransport> {
    /// Open the first supported laptop.
    pub fn open() -> Result<Self> {
        let transport = HidTransport::open()?;
        let product_id = transport.product_id();
        info!("Connected to Razer laptop 0x{:04X}", product_id);
        Ok(Self::new(transport, product_id))
    }

    /// Open a specific product id.
    pub fn open_product(product_id: u16) -> Result<Self> {
        let transport = HidTransport::open_product(product_id)?;
        if !capabilities::is_supported(product_id) {
            warn!(
                "Product 0x{:04X} is not in the supported list; using default limits",
                product_id
            );
        }
        Ok(Self::new(transport, product_id))
    }
}

impl<T: ControlTransport> RazerLaptop<T> {
    pub fn new(transport: T, product_id: u16) -> Self {
        Self {
            inner: Mutex::new(Inner {
                transport,
                state: DeviceState::new(product_id),
                brightness_path: BrightnessPath::default(),
                last_faults: Vec::new(),
            }),
        }
    }

    /// Use a different command class for the backlight.
    pub fn with_brightness_path(self, path: BrightnessPath) -> Self {
        self.inner.lock().brightness_path = path;
        self
    }

    pub fn product_id(&self) -> u16 {
        self.inner.lock().state.product_id
    }

    pub fn get_state(&self) -> StateSnapshot {
        self.inner.lock().state.snapshot()
    }

    pub fn matrix(&self) -> KeyMatrix {
        self.inner.lock().state.matrix.clone()
    }

    /// Faults recorded by the most recent operation.
    pub fn last_faults(&self) -> Vec<StepFault> {
        self.inner.lock().last_faults.clone()
    }

    // -------------------------------------------------------------------------
    // Fan and power
    // -------------------------------------------------------------------------

    /// Set a manual fan speed, or hand control back to the EC with 0.
    ///
    /// Non-zero requests are clamped to the model's range and stored rounded
    /// down to a multiple of 100. Ignored (with a warning) in Custom mode,
    /// where the EC owns the fan.
    pub fn set_fan_rpm(&self, rpm: u32) -> Result<()> {
        let mut inner = self.inner.lock();
        let mode = inner.state.power_mode;

        if mode == PowerMode::Custom {
            warn!("Fan speed is managed by the EC in Custom mode; ignoring {} RPM", rpm);
            inner.last_faults.clear();
            return Ok(());
        }

        let mut sequence = Sequence::new();
        let stored_rpm = if rpm == 0 {
            sequence.push(
                build_power_mode_cmd(FanZone::Primary, mode, false),
                Pacing::LONG,
            )?;
            0
        } else {
            let rpm_byte = capabilities::clamp_fan_rpm(rpm, inner.state.product_id);
            for (zone, last_pacing) in [
                (FanZone::Primary, Pacing::SHORT),
                (FanZone::Secondary, Pacing::NONE),
            ] {
                sequence
                    .push(build_power_mode_query(zone), Pacing::SHORT)?
                    .push(build_power_mode_cmd(zone, mode, true), Pacing::LONG)?
                    .push(build_fan_rpm_cmd(zone, rpm_byte), last_pacing)?;
            }
            u32::from(rpm_byte) * 100
        };

        debug!("Fan: {} RPM requested, {} applied", rpm, stored_rpm);
        inner.run(sequence);
        inner.state.fan_rpm = stored_rpm;
        Ok(())
    }

    /// Switch the power profile.
    ///
    /// Creator falls back to Gaming on models without it. Custom re-sends the
    /// stored CPU and GPU boost levels.
    pub fn set_power_mode(&self, mode: PowerMode) -> Result<()> {
        let mut inner = self.inner.lock();
        let product_id = inner.state.product_id;

        let mode = if mode == PowerMode::Creator && !capabilities::creator_mode_allowed(product_id)
        {
            info!(
                "Creator mode not available on 0x{:04X}; using Gaming",
                product_id
            );
            PowerMode::Gaming
        } else {
            mode
        };

        let manual = inner.state.manual_fan();
        let sequence = if mode == PowerMode::Custom {
            custom_sequence(&inner.state)?
        } else {
            let mut sequence = Sequence::new();
            sequence.push(
                build_power_mode_cmd(FanZone::Primary, mode, manual),
                Pacing::NONE,
            )?;
            sequence
        };

        debug!("Power mode -> {}", mode);
        inner.state.power_mode = mode;
        inner.run(sequence);
        Ok(())
    }

    /// Store CPU and GPU boost levels, sending them if Custom mode is active.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for CPU above 3 or GPU above 2.
    pub fn set_custom_boost(&self, cpu: u8, gpu: u8) -> Result<()> {
        for (target, level) in [(BoostTarget::Cpu, cpu), (BoostTarget::Gpu, gpu)] {
            if level > target.max_level() {
                return Err(RazerError::InvalidArgument(format!(
                    "{} boost {} out of range (0-{})",
                    target,
                    level,
                    target.max_level()
                )));
            }
        }

        let mut inner = self.inner.lock();
        let cpu = if cpu == 3 && !capabilities::boost_mode_level3_allowed(inner.state.product_id) {
            info!("CPU boost 3 not available on this model; using 2");
            2
        } else {
            cpu
        };

        inner.state.cpu_boost = cpu;
        inner.state.gpu_boost = gpu;

        if inner.state.power_mode != PowerMode::Custom {
            debug!(
                "Boost stored (CPU {} GPU {}); applied on next switch to Custom",
                cpu, gpu
            );
            inner.last_faults.clear();
            return Ok(());
        }

        let sequence = custom_sequence(&inner.state)?;
        inner.run(sequence);
        Ok(())
    }

    /// Read the current fan speed of the primary zone in RPM.
    pub fn query_fan_rpm(&self) -> Result<u32> {
        self.inner.lock().read_fan_rpm()
    }

    /// Read the power mode the EC reports for the primary zone, with its
    /// manual-fan flag.
    pub fn query_power_mode(&self) -> Result<(PowerMode, bool)> {
        self.inner.lock().read_power_mode()
    }

    /// Replace the host-side power mode, fan speed and (in Custom) boost
    /// levels with what the controller reports.
    ///
    /// A fresh handle assumes Normal mode with an automatic fan; call this
    /// after opening a controller that may already be configured.
    ///
    /// # Errors
    /// Fails, leaving the state untouched, if any answer is short or
    /// carries a fault.
    pub fn sync_from_device(&self) -> Result<StateSnapshot> {
        let mut inner = self.inner.lock();
        let product_id = inner.state.product_id;

        let (mode, manual) = inner.read_power_mode()?;
        inner.require_clean_answer()?;

        let fan_rpm = if manual {
            let rpm = inner.read_fan_rpm()?;
            inner.require_clean_answer()?;
            u32::from(capabilities::clamp_fan_rpm(rpm, product_id)) * 100
        } else {
            0
        };

        let (mut cpu_boost, mut gpu_boost) = (inner.state.cpu_boost, inner.state.gpu_boost);
        if mode == PowerMode::Custom {
            cpu_boost = inner.read_boost(BoostTarget::Cpu)?;
            inner.require_clean_answer()?;
            gpu_boost = inner.read_boost(BoostTarget::Gpu)?;
            inner.require_clean_answer()?;
        }

        inner.state.power_mode = mode;
        inner.state.fan_rpm = fan_rpm;
        inner.state.cpu_boost = cpu_boost;
        inner.state.gpu_boost = gpu_boost;

        let snapshot = inner.state.snapshot();
        info!("State loaded from controller: {}", snapshot);
        Ok(snapshot)
    }

    // -------------------------------------------------------------------------
    // Backlight
    // -------------------------------------------------------------------------

    /// Set keyboard backlight brightness (0-255).
    pub fn set_brightness(&self, value: u32) -> Result<()> {
        let value = u8::try_from(value).map_err(|_| {
            RazerError::InvalidArgument(format!("Brightness {} out of range (0-255)", value))
        })?;

        let mut inner = self.inner.lock();
        let mut sequence = Sequence::new();
        sequence.push(
            build_brightness_cmd(inner.brightness_path, value),
            Pacing::NONE,
        )?;
        inner.run(sequence);
        Ok(())
    }

    /// Read keyboard backlight brightness.
    ///
    /// # Errors
    /// Returns `ShortResponse` if the controller gave no usable answer.
    pub fn get_brightness(&self) -> Result<u8> {
        let mut inner = self.inner.lock();
        let path = inner.brightness_path;
        let response = inner.exchange(&build_brightness_query(path), Pacing::NONE)?;
        Ok(parse_brightness(path, &response))
    }

    // -------------------------------------------------------------------------
    // Key matrix
    // -------------------------------------------------------------------------

    /// Write one row of key colours. Call [`display_matrix`](Self::display_matrix)
    /// to show it.
    pub fn program_row(&self, row: usize, colours: &Row) -> Result<()> {
        if row >= ROWS {
            return Err(row_out_of_range(row));
        }

        let mut inner = self.inner.lock();
        let mut sequence = Sequence::new();
        sequence.push(
            build_row_cmd(row, &pack_row(colours))?,
            Pacing::MATRIX,
        )?;

        inner.state.matrix.set_row(row, colours)?;
        inner.run(sequence);
        Ok(())
    }

    /// Same as [`program_row`](Self::program_row) with raw RGB bytes.
    ///
    /// # Errors
    /// Returns `InvalidArgument` unless `bytes` holds exactly 45 bytes.
    pub fn program_row_bytes(&self, row: usize, bytes: &[u8]) -> Result<()> {
        let colours = unpack_row(bytes)?;
        self.program_row(row, &colours)
    }

    /// Show the programmed matrix.
    pub fn display_matrix(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let mut sequence = Sequence::new();
        sequence.push(build_display_cmd(), Pacing::MATRIX)?;
        inner.run(sequence);
        Ok(())
    }

    /// Program all six rows and display them, as one operation.
    pub fn set_matrix(&self, matrix: &KeyMatrix) -> Result<()> {
        let mut inner = self.inner.lock();
        let mut sequence = Sequence::new();
        for (row, colours) in matrix.rows().iter().enumerate() {
            sequence.push(
                build_row_cmd(row, &pack_row(colours))?,
                Pacing::MATRIX,
            )?;
        }
        sequence.push(build_display_cmd(), Pacing::MATRIX)?;

        inner.state.matrix = matrix.clone();
        inner.run(sequence);
        Ok(())
    }
}

/// Mode switch to Custom with both boost levels, zone 1 then zone 2.
fn custom_sequence(state: &DeviceState) -> Result<Sequence> {
    let manual = state.manual_fan();
    let mut sequence = Sequence::new();

    sequence
        .push(build_power_mode_query(FanZone::Primary), Pacing::SHORT)?
        .push(
            build_power_mode_cmd(FanZone::Primary, PowerMode::Custom, manual),
            Pacing::LONG,
        )?;
    for (target, level) in [
        (BoostTarget::Cpu, state.cpu_boost),
        (BoostTarget::Gpu, state.gpu_boost),
    ] {
        sequence
            .push(build_boost_query(target), Pacing::SHORT)?
            .push(build_boost_cmd(target, level), Pacing::SHORT)?;
    }
    sequence
        .push(build_power_mode_query(FanZone::Secondary), Pacing::SHORT)?
        .push(
            build_power_mode_cmd(FanZone::Secondary, PowerMode::Custom, manual),
            Pacing::LONG,
        )?;

    Ok(sequence)
}
