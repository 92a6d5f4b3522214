//! Error types for mspiflash-core
//!
//! This module provides a no_std compatible error type shared by every layer
//! of the driver.

use core::fmt;

/// The condition a poll loop was waiting for when it gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTarget {
    /// Done flag in the SPI control register (transfer finished)
    SpiDone,
    /// Write-in-progress bit in the flash status register cleared
    FlashReady,
}

impl fmt::Display for WaitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiDone => write!(f, "SPI transfer done flag"),
            Self::FlashReady => write!(f, "flash write-in-progress to clear"),
        }
    }
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The indirect register transport failed to move data
    Transport,
    /// A bounded poll ran out of attempts
    DeviceUnresponsive(WaitTarget),
    /// Source buffer holds fewer bytes than the requested count
    BufferTooSmall,
    /// Byte count is not a whole number of 32-bit words
    InvalidAlignment,
    /// Address does not fit the 24-bit address phase
    AddressOutOfBounds,
    /// Transfer width outside 1..=4 bytes
    InvalidByteCount,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "indirect register transfer failed"),
            Self::DeviceUnresponsive(target) => {
                write!(f, "device unresponsive: gave up waiting for {}", target)
            }
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::InvalidAlignment => write!(f, "byte count is not a multiple of 4"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidByteCount => write!(f, "transfer byte count must be 1 to 4"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
