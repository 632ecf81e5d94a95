//! Host-side record of what was last sent to the controller.
//!
//! The EC cannot report most of these values back, so the driver keeps its
//! own copy. It only changes through the command layer.

use serde::{Deserialize, Serialize};

use crate::error::{RazerError, Result};
use crate::protocol::{KEYS_PER_ROW, PowerMode, ROW_BYTES, ROWS};

/// Boost level the firmware starts with.
pub const DEFAULT_BOOST: u8 = 1;

/// Bytes in a full matrix (6 rows of 45).
pub const MATRIX_BYTES: usize = ROWS * ROW_BYTES;

// =============================================================================
// Colours
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: Self = Self::new(0x00, 0x00, 0x00);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

/// One row of key colours.
pub type Row = [Rgb; KEYS_PER_ROW];

/// Pack a row into its 45-byte wire form (R, G, B per key).
pub fn pack_row(row: &Row) -> [u8; ROW_BYTES] {
    let mut buf = [0u8; ROW_BYTES];
    for (chunk, colour) in buf.chunks_exact_mut(3).zip(row) {
        chunk.copy_from_slice(&[colour.red, colour.green, colour.blue]);
    }
    buf
}

/// Parse 45 bytes into a row.
pub fn unpack_row(bytes: &[u8]) -> Result<Row> {
    if bytes.len() != ROW_BYTES {
        return Err(RazerError::InvalidArgument(format!(
            "Row data must be {} bytes, got {}",
            ROW_BYTES,
            bytes.len()
        )));
    }

    let mut row = [Rgb::BLACK; KEYS_PER_ROW];
    for (colour, chunk) in row.iter_mut().zip(bytes.chunks_exact(3)) {
        *colour = Rgb::new(chunk[0], chunk[1], chunk[2]);
    }
    Ok(row)
}

// =============================================================================
// KeyMatrix
// =============================================================================

/// Per-key colours, 6 rows of 15 keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMatrix {
    rows: [Row; ROWS],
}

impl Default for KeyMatrix {
    fn default() -> Self {
        Self::filled(Rgb::WHITE)
    }
}

impl KeyMatrix {
    pub fn filled(colour: Rgb) -> Self {
        Self {
            rows: [[colour; KEYS_PER_ROW]; ROWS],
        }
    }

    /// Build a matrix from 270 bytes, row-major.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for any other length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != MATRIX_BYTES {
            return Err(RazerError::InvalidArgument(format!(
                "Matrix data must be {} bytes, got {}",
                MATRIX_BYTES,
                bytes.len()
            )));
        }

        let mut matrix = Self::filled(Rgb::BLACK);
        for (row, chunk) in matrix.rows.iter_mut().zip(bytes.chunks_exact(ROW_BYTES)) {
            *row = unpack_row(chunk)?;
        }
        Ok(matrix)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.rows.iter().flat_map(pack_row).collect()
    }

    pub fn rows(&self) -> &[Row; ROWS] {
        &self.rows
    }

    pub fn row(&self, row: usize) -> Option<&Row> {
        self.rows.get(row)
    }

    pub fn row_bytes(&self, row: usize) -> Option<[u8; ROW_BYTES]> {
        self.rows.get(row).map(pack_row)
    }

    pub fn key(&self, row: usize, column: usize) -> Option<Rgb> {
        self.rows.get(row)?.get(column).copied()
    }

    pub fn set_row(&mut self, row: usize, colours: &Row) -> Result<()> {
        let slot = self.rows.get_mut(row).ok_or_else(|| row_out_of_range(row))?;
        *slot = *colours;
        Ok(())
    }

    pub fn set_key(&mut self, row: usize, column: usize, colour: Rgb) -> Result<()> {
        let slot = self
            .rows
            .get_mut(row)
            .ok_or_else(|| row_out_of_range(row))?
            .get_mut(column)
            .ok_or_else(|| {
                RazerError::InvalidArgument(format!(
                    "Column {} out of range (0-{})",
                    column,
                    KEYS_PER_ROW - 1
                ))
            })?;
        *slot = colour;
        Ok(())
    }
}

pub(crate) fn row_out_of_range(row: usize) -> RazerError {
    RazerError::InvalidArgument(format!("Row {} out of range (0-{})", row, ROWS - 1))
}

// =============================================================================
// DeviceState
// =============================================================================

/// Everything the driver has told the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub product_id: u16,
    /// Last manual fan speed in RPM, 0 when the EC runs the fan itself.
    pub fan_rpm: u32,
    pub power_mode: PowerMode,
    pub cpu_boost: u8,
    pub gpu_boost: u8,
    pub matrix: KeyMatrix,
}

impl DeviceState {
    pub fn new(product_id: u16) -> Self {
        Self {
            product_id,
            fan_rpm: 0,
            power_mode: PowerMode::Normal,
            cpu_boost: DEFAULT_BOOST,
            gpu_boost: DEFAULT_BOOST,
            matrix: KeyMatrix::default(),
        }
    }

    pub fn manual_fan(&self) -> bool {
        self.fan_rpm != 0
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            product_id: self.product_id,
            fan_rpm: self.fan_rpm,
            power_mode: self.power_mode,
            cpu_boost: self.cpu_boost,
            gpu_boost: self.gpu_boost,
        }
    }
}

/// Copy of the scalar state, cheap to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub product_id: u16,
    pub fan_rpm: u32,
    pub power_mode: PowerMode,
    pub cpu_boost: u8,
    pub gpu_boost: u8,
}

impl std::fmt::Display for StateSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fan = if self.fan_rpm == 0 {
            "auto".to_string()
        } else {
            format!("{} RPM", self.fan_rpm)
        };
        write!(
            f,
            "Product 0x{:04X} | Mode: {} | Fan: {} | Boost CPU {} GPU {}",
            self.product_id, self.power_mode, fan, self.cpu_boost, self.gpu_boost
        )
    }
}
