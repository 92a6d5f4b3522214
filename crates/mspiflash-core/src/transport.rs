//! Indirect register transport trait
//!
//! The host chip's control registers are not memory mapped. They are reached
//! through a byte-oriented transfer primitive that moves `N` bytes to or from
//! a numbered register. That primitive is the only thing a board has to
//! provide to use this driver.

use crate::error::Result;

/// Byte-oriented access to the host chip's numbered registers
///
/// Implementations move data synchronously: when a call returns `Ok`, the
/// bytes have reached (or been fetched from) the register.
///
/// ## Example
///
/// ```ignore
/// impl IndirectTransport for HostLink {
///     fn write_register(&mut self, register: u32, data: &[u8]) -> Result<()> {
///         self.spi_transfer(register, Some(data), None)
///     }
///
///     fn read_register(&mut self, register: u32, buf: &mut [u8]) -> Result<()> {
///         self.spi_transfer(register, None, Some(buf))
///     }
///
///     fn delay_us(&mut self, us: u32) {
///         self.timer.delay_us(us);
///     }
/// }
/// ```
pub trait IndirectTransport {
    /// Write `data` to the numbered register
    fn write_register(&mut self, register: u32, data: &[u8]) -> Result<()>;

    /// Fill `buf` from the numbered register
    fn read_register(&mut self, register: u32, buf: &mut [u8]) -> Result<()>;

    /// Delay for the specified number of microseconds
    ///
    /// Only called between poll attempts when a non-zero poll interval is
    /// configured.
    fn delay_us(&mut self, us: u32);
}

impl<T: IndirectTransport + ?Sized> IndirectTransport for &mut T {
    fn write_register(&mut self, register: u32, data: &[u8]) -> Result<()> {
        (**self).write_register(register, data)
    }

    fn read_register(&mut self, register: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read_register(register, buf)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
