//! Master SPI mode control
//!
//! Every bus transaction is a walk through the SPICTL mode field:
//!
//! ```text
//! Idle -> Enable -> Transfer -> [Update -> Transfer]* -> Idle
//! ```
//!
//! `Enable` asserts chip select, each entry into `Transfer` clocks out the
//! low `byte_count` bytes of SPITX, and `Update` keeps chip select held
//! while more data is staged. A transaction must end in `Idle` or the next
//! command is appended to it.

use crate::error::{Error, Result, WaitTarget};
use crate::indirect;
use crate::poll::{poll_until, PollPolicy};
use crate::regs::{MspiMode, RegisterMap, SpiCtl, MAX_TRANSFER_BYTES};
use crate::transport::IndirectTransport;

fn modify_ctl<T, F>(transport: &mut T, regs: &RegisterMap, f: F) -> Result<SpiCtl>
where
    T: IndirectTransport + ?Sized,
    F: FnOnce(SpiCtl) -> SpiCtl,
{
    indirect::modify(transport, regs.spictl, |raw| f(SpiCtl(raw)).bits()).map(SpiCtl)
}

/// Read the live SPICTL value
pub fn read_ctl<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    regs: &RegisterMap,
) -> Result<SpiCtl> {
    indirect::read(transport, regs.spictl).map(SpiCtl)
}

/// Hand the pins to the master SPI block and park it in `Idle`
///
/// Caution: while master SPI is enabled the chip's LED outputs do not work.
pub fn enable_master_spi<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    regs: &RegisterMap,
) -> Result<()> {
    let ctl = modify_ctl(transport, regs, |ctl| {
        ctl.with_master_enable(true).with_mode(MspiMode::Idle)
    })?;
    log::debug!("Master SPI enabled (SPICTL={:#010x})", ctl.bits());
    Ok(())
}

/// Give the pins back to the LED function
pub fn disable_master_spi<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    regs: &RegisterMap,
) -> Result<()> {
    let ctl = modify_ctl(transport, regs, |ctl| {
        ctl.with_master_enable(false).with_mode(MspiMode::Idle)
    })?;
    log::debug!("Master SPI disabled (SPICTL={:#010x})", ctl.bits());
    Ok(())
}

/// Change the mode field
pub fn set_mode<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    regs: &RegisterMap,
    mode: MspiMode,
) -> Result<()> {
    modify_ctl(transport, regs, |ctl| ctl.with_mode(mode))?;
    Ok(())
}

/// Declare the width of the next transfer and start it
///
/// `bytes` is 1..=4. The mode moves to `Transfer` right after the byte
/// count is written.
pub fn set_transfer_byte_count<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    regs: &RegisterMap,
    bytes: u8,
) -> Result<()> {
    if bytes == 0 || bytes > MAX_TRANSFER_BYTES {
        return Err(Error::InvalidByteCount);
    }
    modify_ctl(transport, regs, |ctl| ctl.with_byte_count(bytes))?;
    set_mode(transport, regs, MspiMode::Transfer)
}

/// Spin until the hardware raises the done flag
pub fn wait_until_done<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    regs: &RegisterMap,
    policy: PollPolicy,
) -> Result<()> {
    poll_until(transport, policy, WaitTarget::SpiDone, |t| {
        Ok(read_ctl(t, regs)?.is_done())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indirect::tests::RegisterFile;
    use crate::regs::{SPICTL_DONE, SPICTL_MSPI_EN};

    #[test]
    fn test_enable_sets_bit_and_idles() {
        let regs = RegisterMap::default();
        let mut bus = RegisterFile::new();
        bus.regs[regs.spictl as usize] = 0x0000_0003;

        enable_master_spi(&mut bus, &regs).unwrap();
        assert_eq!(bus.regs[regs.spictl as usize], SPICTL_MSPI_EN);

        disable_master_spi(&mut bus, &regs).unwrap();
        assert_eq!(bus.regs[regs.spictl as usize], 0);
    }

    #[test]
    fn test_set_mode_keeps_other_fields() {
        let regs = RegisterMap::default();
        let mut bus = RegisterFile::new();
        bus.regs[regs.spictl as usize] = 0xABCD_EF00;

        set_mode(&mut bus, &regs, MspiMode::Update).unwrap();
        let ctl = read_ctl(&mut bus, &regs).unwrap();
        assert_eq!(ctl.mode(), MspiMode::Update);
        assert_eq!(ctl.bits() & !0x3, 0xABCD_EF00);
    }

    #[test]
    fn test_byte_count_then_transfer() {
        let regs = RegisterMap::default();
        let mut bus = RegisterFile::new();
        bus.regs[regs.spictl as usize] = SPICTL_MSPI_EN | MspiMode::Enable as u32;

        set_transfer_byte_count(&mut bus, &regs, 4).unwrap();
        let ctl = read_ctl(&mut bus, &regs).unwrap();
        assert_eq!(ctl.byte_count(), 4);
        assert_eq!(ctl.mode(), MspiMode::Transfer);
        assert!(ctl.master_enabled());
    }

    #[test]
    fn test_byte_count_out_of_range() {
        let regs = RegisterMap::default();
        let mut bus = RegisterFile::new();
        assert_eq!(
            set_transfer_byte_count(&mut bus, &regs, 0),
            Err(Error::InvalidByteCount)
        );
        assert_eq!(
            set_transfer_byte_count(&mut bus, &regs, 5),
            Err(Error::InvalidByteCount)
        );
        assert_eq!(bus.writes, 0);
    }

    #[test]
    fn test_wait_until_done() {
        let regs = RegisterMap::default();
        let mut bus = RegisterFile::new();

        assert_eq!(
            wait_until_done(&mut bus, &regs, PollPolicy::bounded(0, 8)),
            Err(Error::DeviceUnresponsive(WaitTarget::SpiDone))
        );

        bus.regs[regs.spictl as usize] = SPICTL_DONE;
        wait_until_done(&mut bus, &regs, PollPolicy::unbounded()).unwrap();
    }
}
