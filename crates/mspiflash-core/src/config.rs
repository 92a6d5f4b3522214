//! Driver configuration

use crate::poll::PollPolicy;
use crate::regs::RegisterMap;

/// Default number of bytes handed to one page program call by
/// [`FlashProgrammer::write_image`](crate::program::FlashProgrammer::write_image)
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// What to do with a byte count that is not a multiple of 4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TailPolicy {
    /// Fill the last word with 0xFF. Programming 0xFF leaves cells as they are.
    #[default]
    PadErased,
    /// Refuse with [`Error::InvalidAlignment`](crate::Error::InvalidAlignment)
    Reject,
}

/// Configuration for [`FlashProgrammer`](crate::program::FlashProgrammer)
///
/// The default reproduces the bare-metal behaviour: fixed register map,
/// unbounded busy-polls, chunks of 1024 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Register offsets of the master SPI block
    pub registers: RegisterMap,
    /// Poll policy for the SPICTL done flag
    pub done_poll: PollPolicy,
    /// Poll policy for the flash write-in-progress bit
    pub status_poll: PollPolicy,
    /// Handling of a partial final word
    pub tail: TailPolicy,
    /// Bytes per page program call in `write_image`
    pub chunk_size: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            registers: RegisterMap::default(),
            done_poll: PollPolicy::unbounded(),
            status_poll: PollPolicy::unbounded(),
            tail: TailPolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl DriverConfig {
    /// Use `policy` for both the done flag and the busy bit
    pub fn with_poll(mut self, policy: PollPolicy) -> Self {
        self.done_poll = policy;
        self.status_poll = policy;
        self
    }

    /// Set the tail policy
    pub fn with_tail(mut self, tail: TailPolicy) -> Self {
        self.tail = tail;
        self
    }

    /// Set the `write_image` chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}
