//! 90-byte control report codec.
//!
//! Every message exchanged with the EC, request or response, has the same
//! fixed layout. Offsets below were taken from USB captures of the vendor
//! software and match what the firmware accepts byte-for-byte.

use byteorder::{BigEndian, ByteOrder};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::error::{RazerError, Result};

// =============================================================================
// Layout
// =============================================================================

/// Total report length on the wire.
pub const REPORT_LEN: usize = 90;

/// Size of the argument block.
pub const ARGS_LEN: usize = 80;

/// Transaction id used for every request sent by this driver.
pub const DEFAULT_TRANSACTION_ID: u8 = 0x1F;

const OFFSET_STATUS: usize = 0;
const OFFSET_TRANSACTION_ID: usize = 1;
const OFFSET_REMAINING_PACKETS: usize = 2;
const OFFSET_PROTOCOL_TYPE: usize = 4;
const OFFSET_DATA_SIZE: usize = 5;
const OFFSET_COMMAND_CLASS: usize = 6;
const OFFSET_COMMAND_ID: usize = 7;
const OFFSET_ARGS: usize = 8;
const OFFSET_CRC: usize = 88;
const OFFSET_RESERVED: usize = 89;

/// First and last byte covered by the checksum.
const CRC_START: usize = 2;
const CRC_END: usize = 87;

// =============================================================================
// Field types
// =============================================================================

/// Response status byte. Ignored by the firmware on requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum Status {
    New = 0x00,
    Busy = 0x01,
    Success = 0x02,
    Failure = 0x03,
    Timeout = 0x04,
    NotSupported = 0x05,
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Transaction id: 3-bit device selector in bits 7..5, 5-bit id in bits 4..0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionId(pub u8);

impl TransactionId {
    pub const fn device(self) -> u8 {
        self.0 >> 5
    }

    pub const fn id(self) -> u8 {
        self.0 & 0x1F
    }

    pub const fn from_parts(device: u8, id: u8) -> Self {
        Self(((device & 0x07) << 5) | (id & 0x1F))
    }
}

/// Command id: direction in bit 7 (set = host to device), 7-bit id below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandId(pub u8);

impl CommandId {
    const DIRECTION_BIT: u8 = 0x80;

    /// True for device-to-host (get) commands.
    pub const fn is_query(self) -> bool {
        self.0 & Self::DIRECTION_BIT != 0
    }

    pub const fn id(self) -> u8 {
        self.0 & !Self::DIRECTION_BIT
    }

    /// The get counterpart of a set command (and vice versa for `set`).
    pub const fn query(self) -> Self {
        Self(self.0 | Self::DIRECTION_BIT)
    }

    pub const fn set(self) -> Self {
        Self(self.0 & !Self::DIRECTION_BIT)
    }
}

// =============================================================================
// Report
// =============================================================================

/// One control report.
///
/// `crc` holds the checksum read by [`Report::decode`]; [`Report::encode`]
/// always recomputes it. The trailing reserved byte is not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub status: Status,
    pub transaction_id: TransactionId,
    pub remaining_packets: u16,
    pub protocol_type: u8,
    pub data_size: u8,
    pub command_class: u8,
    pub command_id: CommandId,
    pub args: [u8; ARGS_LEN],
    pub crc: u8,
}

impl Report {
    /// Blank request for `class`/`id` with the driver's transaction id.
    pub fn new(command_class: u8, command_id: u8, data_size: u8) -> Self {
        Self {
            status: Status::New,
            transaction_id: TransactionId(DEFAULT_TRANSACTION_ID),
            remaining_packets: 0,
            protocol_type: 0,
            data_size,
            command_class,
            command_id: CommandId(command_id),
            args: [0u8; ARGS_LEN],
            crc: 0,
        }
    }

    /// Copy `payload` to the start of the argument block.
    ///
    /// # Errors
    /// Returns `PayloadTooLarge` if `payload` exceeds 80 bytes.
    pub fn with_args(mut self, payload: &[u8]) -> Result<Self> {
        self.write_args(0, payload)?;
        Ok(self)
    }

    /// Copy `payload` into the argument block starting at `offset`.
    pub fn write_args(&mut self, offset: usize, payload: &[u8]) -> Result<()> {
        let end = offset + payload.len();
        if end > ARGS_LEN {
            return Err(RazerError::PayloadTooLarge {
                len: end,
                max: ARGS_LEN,
            });
        }
        self.args[offset..end].copy_from_slice(payload);
        Ok(())
    }

    pub fn with_transaction_id(mut self, transaction_id: u8) -> Self {
        self.transaction_id = TransactionId(transaction_id);
        self
    }

    /// Serialize to the 90-byte wire form with a fresh checksum.
    ///
    /// # Errors
    /// Returns `PayloadTooLarge` if `data_size` claims more than 80 bytes.
    pub fn encode(&self) -> Result<[u8; REPORT_LEN]> {
        if self.data_size as usize > ARGS_LEN {
            return Err(RazerError::PayloadTooLarge {
                len: self.data_size as usize,
                max: ARGS_LEN,
            });
        }

        let mut buf = [0u8; REPORT_LEN];
        buf[OFFSET_STATUS] = self.status.into();
        buf[OFFSET_TRANSACTION_ID] = self.transaction_id.0;
        BigEndian::write_u16(
            &mut buf[OFFSET_REMAINING_PACKETS..OFFSET_PROTOCOL_TYPE],
            self.remaining_packets,
        );
        buf[OFFSET_PROTOCOL_TYPE] = self.protocol_type;
        buf[OFFSET_DATA_SIZE] = self.data_size;
        buf[OFFSET_COMMAND_CLASS] = self.command_class;
        buf[OFFSET_COMMAND_ID] = self.command_id.0;
        buf[OFFSET_ARGS..OFFSET_CRC].copy_from_slice(&self.args);
        buf[OFFSET_CRC] = checksum(&buf);
        buf[OFFSET_RESERVED] = 0;

        Ok(buf)
    }

    /// Parse a report. The checksum is stored, not validated.
    ///
    /// # Errors
    /// Returns `ShortBuffer` if `buf` holds fewer than 90 bytes.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < REPORT_LEN {
            return Err(RazerError::ShortBuffer {
                len: buf.len(),
                expected: REPORT_LEN,
            });
        }

        let mut args = [0u8; ARGS_LEN];
        args.copy_from_slice(&buf[OFFSET_ARGS..OFFSET_CRC]);

        Ok(Self {
            status: Status::from(buf[OFFSET_STATUS]),
            transaction_id: TransactionId(buf[OFFSET_TRANSACTION_ID]),
            remaining_packets: BigEndian::read_u16(
                &buf[OFFSET_REMAINING_PACKETS..OFFSET_PROTOCOL_TYPE],
            ),
            protocol_type: buf[OFFSET_PROTOCOL_TYPE],
            data_size: buf[OFFSET_DATA_SIZE],
            command_class: buf[OFFSET_COMMAND_CLASS],
            command_id: CommandId(buf[OFFSET_COMMAND_ID]),
            args,
            crc: buf[OFFSET_CRC],
        })
    }

    /// True if `self` is the response to `request`.
    pub fn matches(&self, request: &Report) -> bool {
        self.remaining_packets == request.remaining_packets
            && self.command_class == request.command_class
            && self.command_id == request.command_id
    }

    /// Stand-in response used when the controller returned nothing usable.
    pub fn synthetic_failure(request: &Report) -> Self {
        Self {
            status: Status::Failure,
            args: [0u8; ARGS_LEN],
            crc: 0,
            ..request.clone()
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = (self.data_size as usize).min(ARGS_LEN);
        write!(
            f,
            "status={:?} txn=0x{:02X} class=0x{:02X} id=0x{:02X} size={} args={:02X?}",
            self.status,
            self.transaction_id.0,
            self.command_class,
            self.command_id.0,
            self.data_size,
            &self.args[..used]
        )
    }
}

/// XOR of bytes 2 through 87.
///
/// Buffers shorter than a full report are checksummed over what is present.
pub fn checksum(buf: &[u8]) -> u8 {
    let end = (CRC_END + 1).min(buf.len());
    buf.get(CRC_START..end)
        .unwrap_or(&[])
        .iter()
        .fold(0u8, |acc, b| acc ^ b)
}
