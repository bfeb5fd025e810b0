//! Error types for the weather station, one per subsystem.
//!
//! All are `Copy` so they can be logged and passed around without
//! allocation. The device binary lifts them into `anyhow::Error` at boot.
//!
//! Nothing here is fatal to the running station: frame failures become
//! sentinel readings, bus faults abort one channel, network faults abandon one
//! request. The types exist so each of those paths is explicit.

use core::fmt;

use embedded_hal::i2c::ErrorKind;

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

/// A transport-level failure on one sensor transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusError {
    /// 7-bit address of the device that failed.
    pub address: u8,
    pub kind: ErrorKind,
}

impl BusError {
    pub fn new(address: u8, kind: ErrorKind) -> Self {
        Self { address, kind }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device 0x{:02X}: {}", self.address, self.kind)
    }
}

impl std::error::Error for BusError {}

// ---------------------------------------------------------------------------
// Frame errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The status bits say this frame belongs to the other channel.
    WrongChannel,
    /// The received checksum does not match the payload.
    CrcMismatch { expected: u8, received: u8 },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongChannel => write!(f, "status bit does not match requested channel"),
            Self::CrcMismatch { expected, received } => {
                write!(f, "CRC mismatch (computed 0x{expected:02X}, received 0x{received:02X})")
            }
        }
    }
}

impl std::error::Error for FrameError {}

// ---------------------------------------------------------------------------
// Publish errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The endpoint URI could not be used by this client.
    InvalidUri,
    /// Could not connect to the endpoint.
    Connect,
    /// The request could not be written or the response could not be read.
    Io,
    /// The endpoint answered with a non-success status.
    Status(u16),
    /// No signing token has been generated yet.
    NoToken,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUri => write!(f, "unsupported or malformed URI"),
            Self::Connect => write!(f, "connect failed"),
            Self::Io => write!(f, "request I/O failed"),
            Self::Status(code) => write!(f, "endpoint returned status {code}"),
            Self::NoToken => write!(f, "no signing token available"),
        }
    }
}

impl std::error::Error for PublishError {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The config document could not be parsed.
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` names the field and the rule.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "config document malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
