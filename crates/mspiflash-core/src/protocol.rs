//! Flash command primitives
//!
//! Each primitive opens its own transaction from `Idle`, so a primitive may
//! be issued right after any other one. Erase and program commands must be
//! preceded by [`write_enable`] and followed by [`wait_ready`] before the
//! next command, or the flash ignores them.

use crate::config::DriverConfig;
use crate::error::{Result, WaitTarget};
use crate::indirect;
use crate::mspi::{set_mode, set_transfer_byte_count, wait_until_done};
use crate::opcodes;
use crate::poll::poll_until;
use crate::regs::MspiMode;
use crate::transport::IndirectTransport;
use bitflags::bitflags;

bitflags! {
    /// Flash status register 1
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u8 {
        /// Write in progress - erase or program still running
        const WIP = 1 << 0;
        /// Write enable latch
        const WEL = 1 << 1;
    }
}

impl StatusFlags {
    /// Whether an erase or program is still running
    pub fn is_busy(self) -> bool {
        self.contains(Self::WIP)
    }
}

/// Open a transaction: release chip select, assert it, stage `word`
pub(crate) fn begin<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    config: &DriverConfig,
    word: u32,
) -> Result<()> {
    let regs = &config.registers;
    set_mode(transport, regs, MspiMode::Idle)?;
    set_mode(transport, regs, MspiMode::Enable)?;
    indirect::write(transport, regs.spitx, word)
}

/// Clock `bytes` of the staged word out and wait for the block to finish
pub(crate) fn clock_out<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    config: &DriverConfig,
    bytes: u8,
) -> Result<()> {
    set_transfer_byte_count(transport, &config.registers, bytes)?;
    wait_until_done(transport, &config.registers, config.done_poll)
}

/// Read flash status register 1
///
/// The opcode leads a 4-byte frame, then an `Update` keeps chip select held
/// while a second frame clocks more status bytes in. The part repeats the
/// status for as long as it is clocked, so the low byte of SPIRX holds it.
pub fn read_flash_status<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    config: &DriverConfig,
) -> Result<StatusFlags> {
    let regs = &config.registers;
    begin(transport, config, opcodes::opcode_word(opcodes::RDSR))?;
    clock_out(transport, config, 4)?;

    set_mode(transport, regs, MspiMode::Update)?;
    set_mode(transport, regs, MspiMode::Transfer)?;
    wait_until_done(transport, regs, config.done_poll)?;

    let rx = indirect::read(transport, regs.spirx)?;
    Ok(StatusFlags::from_bits_retain(rx as u8))
}

/// Send a single-byte command such as [`opcodes::WREN`]
pub fn send_command<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    config: &DriverConfig,
    opcode: u8,
) -> Result<()> {
    begin(transport, config, opcodes::opcode_word(opcode))?;
    clock_out(transport, config, 1)?;
    set_mode(transport, &config.registers, MspiMode::Idle)
}

/// Send the Write Enable command
pub fn write_enable<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    config: &DriverConfig,
) -> Result<()> {
    send_command(transport, config, opcodes::WREN)
}

/// Erase the 4 KiB sector containing `addr`
///
/// Opcode and 3-byte address leave in one 4-byte frame. Does not send
/// write-enable or wait for completion.
pub fn erase_sector<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    config: &DriverConfig,
    addr: u32,
) -> Result<()> {
    log::debug!("Sector erase at {:#08x}", addr);
    begin(transport, config, opcodes::command_word(opcodes::SE_20, addr))?;
    clock_out(transport, config, 4)?;
    set_mode(transport, &config.registers, MspiMode::Idle)
}

/// Wait for the WIP (Write In Progress) bit to clear
///
/// Returns the number of status reads that still saw the part busy.
pub fn wait_ready<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    config: &DriverConfig,
) -> Result<u32> {
    poll_until(transport, config.status_poll, WaitTarget::FlashReady, |t| {
        Ok(!read_flash_status(t, config)?.is_busy())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indirect::tests::RegisterFile;
    use crate::regs::SPICTL_DONE;

    fn ready_bus(config: &DriverConfig) -> RegisterFile {
        let mut bus = RegisterFile::new();
        bus.regs[config.registers.spictl as usize] = SPICTL_DONE;
        bus
    }

    #[test]
    fn test_status_flags() {
        assert!(StatusFlags::from_bits_retain(0x03).is_busy());
        assert!(!StatusFlags::from_bits_retain(0xFE).is_busy());
        assert!(StatusFlags::from_bits_retain(0x02).contains(StatusFlags::WEL));
    }

    #[test]
    fn test_send_command_ends_idle() {
        let config = DriverConfig::default();
        let mut bus = ready_bus(&config);
        write_enable(&mut bus, &config).unwrap();

        let ctl = bus.regs[config.registers.spictl as usize];
        assert_eq!(MspiMode::from_bits(ctl), MspiMode::Idle);
        assert_eq!(bus.regs[config.registers.spitx as usize], 0x0600_0000);
        assert_eq!(crate::regs::SpiCtl(ctl).byte_count(), 1);
    }

    #[test]
    fn test_status_read_declares_four_bytes() {
        let config = DriverConfig::default();
        let mut bus = ready_bus(&config);
        read_flash_status(&mut bus, &config).unwrap();

        let ctl = bus.regs[config.registers.spictl as usize];
        assert_eq!(ctl & crate::regs::SPICTL_NUMBYTES, 3 << crate::regs::SPICTL_NUMBYTES_OFF);
        assert_eq!(MspiMode::from_bits(ctl), MspiMode::Transfer);
        assert_eq!(bus.regs[config.registers.spitx as usize], 0x0500_0000);
    }

    #[test]
    fn test_erase_stages_opcode_and_address() {
        let config = DriverConfig::default();
        let mut bus = ready_bus(&config);
        erase_sector(&mut bus, &config, 0x0003_2000).unwrap();
        assert_eq!(bus.regs[config.registers.spitx as usize], 0x2003_2000);
    }

    #[test]
    fn test_status_taken_from_low_rx_byte() {
        let config = DriverConfig::default();
        let mut bus = ready_bus(&config);
        bus.regs[config.registers.spirx as usize] = 0xFFFF_FF01;
        let status = read_flash_status(&mut bus, &config).unwrap();
        assert!(status.is_busy());
    }

    #[test]
    fn test_wait_ready_times_out_on_stuck_busy() {
        let config =
            DriverConfig::default().with_poll(crate::poll::PollPolicy::bounded(0, 4));
        let mut bus = ready_bus(&config);
        bus.regs[config.registers.spirx as usize] = 0x01;
        assert_eq!(
            wait_ready(&mut bus, &config),
            Err(crate::Error::DeviceUnresponsive(WaitTarget::FlashReady))
        );
    }
}
