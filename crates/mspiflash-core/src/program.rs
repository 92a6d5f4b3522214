//! Page program sequencer
//!
//! [`FlashProgrammer`] owns the transport, so holding `&mut` to it is the
//! only lock the shared SPICTL/SPITX/SPIRX registers need.
//!
//! A page program works around the 4-byte limit of the indirect transport by
//! chaining single-word transfers while chip select stays asserted
//! (`Enable` before every `Transfer`, never `Idle` mid-page). The flash sees
//! one long program command.
//!
//! Erase happens only when the target address starts a 4 KiB sector.
//! Writing into the middle of a sector without erasing it first ANDs the new
//! data into whatever the cells already hold.

use crate::config::{DriverConfig, TailPolicy};
use crate::error::{Error, Result};
use crate::indirect;
use crate::mspi::{disable_master_spi, enable_master_spi, set_mode};
use crate::opcodes::{self, MAX_ADDR_3B, SECTOR_SIZE};
use crate::protocol::{self, StatusFlags};
use crate::regs::MspiMode;
use crate::transport::IndirectTransport;

/// Outcome of [`FlashProgrammer::write_image`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Number of page program calls
    pub chunks: usize,
    /// Number of sectors erased on the way
    pub sectors_erased: usize,
    /// Total bytes written
    pub bytes_written: usize,
}

/// Callback for progress reporting during image writes
pub trait WriteProgress {
    /// Called once before the first chunk
    fn writing(&mut self, bytes_to_write: usize);

    /// Called after every chunk with the running total
    fn write_progress(&mut self, bytes_written: usize);

    /// Called when the operation is complete
    fn complete(&mut self, stats: &WriteStats);
}

/// A no-op progress reporter
pub struct NoProgress;

impl WriteProgress for NoProgress {
    fn writing(&mut self, _bytes_to_write: usize) {}
    fn write_progress(&mut self, _bytes_written: usize) {}
    fn complete(&mut self, _stats: &WriteStats) {}
}

/// Pack four bytes into a transmit word, first byte in the top lane
///
/// A short final chunk is padded with 0xFF.
pub fn pack_word(chunk: &[u8]) -> u32 {
    let mut bytes = [0xFFu8; 4];
    let len = chunk.len().min(4);
    bytes[..len].copy_from_slice(&chunk[..len]);
    u32::from_be_bytes(bytes)
}

/// Erases and programs an SPI NOR part behind the master SPI block
pub struct FlashProgrammer<T> {
    transport: T,
    config: DriverConfig,
}

impl<T: IndirectTransport> FlashProgrammer<T> {
    /// Create a programmer over `transport`
    pub fn new(transport: T, config: DriverConfig) -> Self {
        Self { transport, config }
    }

    /// Get the configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Get a reference to the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Take the transport back
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Read the flash status register
    pub fn read_status(&mut self) -> Result<StatusFlags> {
        enable_master_spi(&mut self.transport, &self.config.registers)?;
        protocol::read_flash_status(&mut self.transport, &self.config)
    }

    /// Erase the sector containing `addr` and wait for it to finish
    pub fn erase_sector(&mut self, addr: u32) -> Result<()> {
        if addr > MAX_ADDR_3B {
            return Err(Error::AddressOutOfBounds);
        }
        enable_master_spi(&mut self.transport, &self.config.registers)?;
        self.erase_unchecked(addr)?;
        protocol::wait_ready(&mut self.transport, &self.config)?;
        Ok(())
    }

    /// Program `count` bytes of `buf` at `address`
    ///
    /// If `address` starts a sector, the sector is erased first. The call
    /// returns once the flash reports the program finished.
    ///
    /// `buf` must hold at least `count` bytes. A `count` that is not a
    /// multiple of 4 is handled per [`TailPolicy`]; bytes past `count` are
    /// never read.
    pub fn program_page(&mut self, address: u32, buf: &[u8], count: usize) -> Result<()> {
        self.check_page(address, buf, count)?;

        enable_master_spi(&mut self.transport, &self.config.registers)?;

        if opcodes::is_sector_aligned(address) {
            self.erase_unchecked(address)?;
        }

        protocol::wait_ready(&mut self.transport, &self.config)?;
        protocol::write_enable(&mut self.transport, &self.config)?;

        log::debug!("Page program {} bytes at {:#08x}", count, address);
        let regs = self.config.registers;
        protocol::begin(
            &mut self.transport,
            &self.config,
            opcodes::command_word(opcodes::PP, address),
        )?;
        // set_transfer_byte_count already enters Transfer; no second Transfer
        protocol::clock_out(&mut self.transport, &self.config, 4)?;

        for chunk in buf[..count].chunks(4) {
            indirect::write(&mut self.transport, regs.spitx, pack_word(chunk))?;
            set_mode(&mut self.transport, &regs, MspiMode::Enable)?;
            set_mode(&mut self.transport, &regs, MspiMode::Transfer)?;
        }

        let busy_polls = protocol::wait_ready(&mut self.transport, &self.config)?;
        log::trace!("Page program done after {} busy polls", busy_polls);
        Ok(())
    }

    /// Write a whole image starting at `address`
    ///
    /// The image is cut into chunks of at most `chunk_size` bytes that never
    /// straddle a sector boundary, so every sector the image enters at its
    /// first byte is erased before it is programmed. A sector the image
    /// enters mid-way is not erased.
    pub fn write_image<P: WriteProgress>(
        &mut self,
        address: u32,
        data: &[u8],
        progress: &mut P,
    ) -> Result<WriteStats> {
        if !data.is_empty() && (address as u64 + data.len() as u64 - 1) > MAX_ADDR_3B as u64 {
            return Err(Error::AddressOutOfBounds);
        }
        if !opcodes::is_sector_aligned(address) {
            log::warn!(
                "Image starts mid-sector at {:#08x}; that sector is not erased",
                address
            );
        }

        let chunk_size = (self.config.chunk_size & !3).max(4);
        let mut stats = WriteStats::default();
        progress.writing(data.len());

        let mut offset = 0;
        while offset < data.len() {
            let addr = address + offset as u32;
            let to_sector_end = (SECTOR_SIZE - (addr % SECTOR_SIZE)) as usize;
            let len = chunk_size.min(to_sector_end).min(data.len() - offset);

            self.program_page(addr, &data[offset..offset + len], len)?;

            if opcodes::is_sector_aligned(addr) {
                stats.sectors_erased += 1;
            }
            stats.chunks += 1;
            stats.bytes_written += len;
            offset += len;
            progress.write_progress(stats.bytes_written);
        }

        log::info!(
            "Wrote {} bytes in {} chunks ({} sectors erased)",
            stats.bytes_written,
            stats.chunks,
            stats.sectors_erased
        );
        progress.complete(&stats);
        Ok(stats)
    }

    /// Disable master SPI so the LED outputs work again
    pub fn release(&mut self) -> Result<()> {
        disable_master_spi(&mut self.transport, &self.config.registers)
    }

    fn check_page(&self, address: u32, buf: &[u8], count: usize) -> Result<()> {
        if count > buf.len() {
            return Err(Error::BufferTooSmall);
        }
        let last = address as u64 + count.saturating_sub(1) as u64;
        if address > MAX_ADDR_3B || last > MAX_ADDR_3B as u64 {
            return Err(Error::AddressOutOfBounds);
        }
        if count % 4 != 0 && self.config.tail == TailPolicy::Reject {
            return Err(Error::InvalidAlignment);
        }
        Ok(())
    }

    fn erase_unchecked(&mut self, addr: u32) -> Result<()> {
        protocol::wait_ready(&mut self.transport, &self.config)?;
        protocol::write_enable(&mut self.transport, &self.config)?;
        protocol::erase_sector(&mut self.transport, &self.config, addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indirect::tests::RegisterFile;
    use crate::regs::SPICTL_DONE;

    fn programmer(config: DriverConfig) -> FlashProgrammer<RegisterFile> {
        let mut bus = RegisterFile::new();
        bus.regs[config.registers.spictl as usize] = SPICTL_DONE;
        FlashProgrammer::new(bus, config)
    }

    #[test]
    fn test_pack_word_big_endian() {
        assert_eq!(pack_word(&[0x01, 0x02, 0x03, 0x04]), 0x0102_0304);
        assert_eq!(pack_word(&[0xAA]), 0xAAFF_FFFF);
        assert_eq!(pack_word(&[0x12, 0x34, 0x56]), 0x1234_56FF);
    }

    #[test]
    fn test_buffer_too_small() {
        let mut p = programmer(DriverConfig::default());
        assert_eq!(
            p.program_page(0x1004, &[0u8; 4], 8),
            Err(Error::BufferTooSmall)
        );
        assert_eq!(p.transport().writes, 0);
    }

    #[test]
    fn test_address_out_of_range() {
        let mut p = programmer(DriverConfig::default());
        let buf = [0u8; 8];
        assert_eq!(
            p.program_page(0x0100_0000, &buf, 4),
            Err(Error::AddressOutOfBounds)
        );
        assert_eq!(
            p.program_page(0x00FF_FFFC, &buf, 8),
            Err(Error::AddressOutOfBounds)
        );
        assert_eq!(p.erase_sector(0x0100_0000), Err(Error::AddressOutOfBounds));
    }

    #[test]
    fn test_reject_partial_word() {
        let mut p = programmer(DriverConfig::default().with_tail(TailPolicy::Reject));
        assert_eq!(
            p.program_page(0x1004, &[0u8; 8], 6),
            Err(Error::InvalidAlignment)
        );
    }

    #[test]
    fn test_release_clears_master_enable() {
        let mut p = programmer(DriverConfig::default());
        p.read_status().unwrap();
        let spictl = p.config().registers.spictl as usize;
        assert!(crate::regs::SpiCtl(p.transport().regs[spictl]).master_enabled());
        p.release().unwrap();
        assert!(!crate::regs::SpiCtl(p.transport().regs[spictl]).master_enabled());
    }
}
