//! Transaction engine.
//!
//! Moves reports across a [`ControlTransport`] with the pacing each step
//! needs, classifies what comes back, and logs faults. Nothing here
//! retries: a failed step is reported and the caller decides.

use tracing::{debug, trace, warn};

use crate::device::transport::ControlTransport;
use crate::error::{ErrorKind, RazerError, Result};
use crate::protocol::{Pacing, REPORT_LEN, Report, Status};

// =============================================================================
// Faults
// =============================================================================

/// A fault recorded for one step of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepFault {
    pub command_class: u8,
    pub command_id: u8,
    pub kind: ErrorKind,
}

impl std::fmt::Display for StepFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "0x{:02X}/0x{:02X}: {}",
            self.command_class, self.command_id, self.kind
        )
    }
}

/// Map a response status to the fault it represents, if any.
///
/// `New` means the firmware has not written a status yet; it is not
/// treated as an error.
pub fn status_fault(status: Status) -> Option<ErrorKind> {
    match status {
        Status::Success | Status::New => None,
        Status::Busy => Some(ErrorKind::DeviceBusy),
        Status::Failure | Status::Unknown(_) => Some(ErrorKind::DeviceFailure),
        Status::Timeout => Some(ErrorKind::DeviceTimeout),
        Status::NotSupported => Some(ErrorKind::DeviceNotSupported),
    }
}

// =============================================================================
// Single transactions
// =============================================================================

fn write_paced<T: ControlTransport + ?Sized>(
    transport: &mut T,
    request: &Report,
    buf: &[u8; REPORT_LEN],
    pacing: Pacing,
) -> Result<()> {
    debug!(
        "-> 0x{:02X}/0x{:02X} pause {}",
        request.command_class, request.command_id.0, pacing
    );
    trace!("-> {}", request);
    let result = transport.write_control_report(buf);
    transport.pause(pacing);
    if let Err(e) = &result {
        warn!(
            "Write of 0x{:02X}/0x{:02X} failed: {}",
            request.command_class, request.command_id.0, e
        );
    }
    result
}

/// Encode and write `request` without reading a response.
///
/// # Errors
/// Returns codec errors before touching the transport, or the transport's
/// own error if the write fails.
pub fn send<T: ControlTransport + ?Sized>(
    transport: &mut T,
    request: &Report,
    pacing: Pacing,
) -> Result<()> {
    let buf = request.encode()?;
    write_paced(transport, request, &buf, pacing)
}

/// Outcome of a request/response exchange.
///
/// `response` is always present. When the controller gave nothing usable
/// it is a synthetic copy of the request with status Failure.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub response: Report,
    pub fault: Option<ErrorKind>,
    /// Bytes actually received.
    pub received: usize,
}

impl Exchange {
    pub fn is_ok(&self) -> bool {
        self.fault.is_none()
    }

    /// Turn the exchange into a plain result, treating any fault as an
    /// error.
    pub fn into_result(self) -> Result<Report> {
        let class = self.response.command_class;
        let id = self.response.command_id.0;
        match self.fault {
            None => Ok(self.response),
            Some(ErrorKind::ShortResponse) => Err(RazerError::ShortResponse {
                len: self.received,
            }),
            Some(ErrorKind::UnmatchedResponse) => {
                Err(RazerError::UnmatchedResponse { class, id })
            }
            Some(ErrorKind::Transport) => Err(RazerError::Transport(format!(
                "exchange 0x{:02X}/0x{:02X} failed",
                class, id
            ))),
            Some(kind) => Err(RazerError::DeviceStatus { kind, class, id }),
        }
    }

    fn failed(request: &Report, kind: ErrorKind, received: usize) -> Self {
        Self {
            response: Report::synthetic_failure(request),
            fault: Some(kind),
            received,
        }
    }
}

/// Write `request`, wait, then read and classify the response.
///
/// # Errors
/// Only codec errors are returned, before anything is written. Transport
/// and controller faults are carried in the [`Exchange`].
pub fn request_response<T: ControlTransport + ?Sized>(
    transport: &mut T,
    request: &Report,
    pacing: Pacing,
) -> Result<Exchange> {
    let buf = request.encode()?;
    if write_paced(transport, request, &buf, pacing).is_err() {
        return Ok(Exchange::failed(request, ErrorKind::Transport, 0));
    }

    let raw = match transport.read_control_report() {
        Ok(raw) => raw,
        Err(e) => {
            warn!(
                "Read for 0x{:02X}/0x{:02X} failed: {}",
                request.command_class, request.command_id.0, e
            );
            return Ok(Exchange::failed(request, ErrorKind::ShortResponse, 0));
        }
    };

    if raw.len() != REPORT_LEN {
        warn!(
            "Short response for 0x{:02X}/0x{:02X}: {} bytes",
            request.command_class,
            request.command_id.0,
            raw.len()
        );
        return Ok(Exchange::failed(
            request,
            ErrorKind::ShortResponse,
            raw.len(),
        ));
    }

    let response = Report::decode(&raw)?;
    trace!("<- {}", response);

    let fault = if !response.matches(request) {
        warn!(
            "Response mismatch: sent 0x{:02X}/0x{:02X}, got 0x{:02X}/0x{:02X}",
            request.command_class,
            request.command_id.0,
            response.command_class,
            response.command_id.0
        );
        Some(ErrorKind::UnmatchedResponse)
    } else {
        let fault = status_fault(response.status);
        match fault {
            Some(kind) => warn!(
                "Controller reported {} for 0x{:02X}/0x{:02X}",
                kind, request.command_class, request.command_id.0
            ),
            None if response.status == Status::New => debug!(
                "Response for 0x{:02X}/0x{:02X} still has status New",
                request.command_class, request.command_id.0
            ),
            None => {}
        }
        fault
    };

    Ok(Exchange {
        response,
        fault,
        received: REPORT_LEN,
    })
}

// =============================================================================
// Sequences
// =============================================================================

struct Step {
    request: Report,
    buf: [u8; REPORT_LEN],
    pacing: Pacing,
}

/// An ordered list of write-only steps.
///
/// Every step is encoded when pushed, so an encoding error surfaces before
/// the first byte goes out.
#[derive(Default)]
pub struct Sequence {
    steps: Vec<Step>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: Report, pacing: Pacing) -> Result<&mut Self> {
        let buf = request.encode()?;
        self.steps.push(Step {
            request,
            buf,
            pacing,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Write every step in order. A failed step is logged and recorded; the
    /// remaining steps are still sent.
    pub fn transmit<T: ControlTransport + ?Sized>(self, transport: &mut T) -> Vec<StepFault> {
        let mut faults = Vec::new();
        for step in &self.steps {
            if let Err(e) = write_paced(transport, &step.request, &step.buf, step.pacing) {
                faults.push(StepFault {
                    command_class: step.request.command_class,
                    command_id: step.request.command_id.0,
                    kind: e.kind(),
                });
            }
        }
        faults
    }
}
