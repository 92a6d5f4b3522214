//! 32-bit indirect register access
//!
//! Every register on the host chip is 32 bits wide and travels over the
//! transport as four little-endian bytes.

use crate::error::Result;
use crate::transport::IndirectTransport;

/// Write a 32-bit value to a numbered register
pub fn write<T: IndirectTransport + ?Sized>(
    transport: &mut T,
    register: u32,
    value: u32,
) -> Result<()> {
    log::trace!("indirect write reg {:#04x} <- {:#010x}", register, value);
    transport.write_register(register, &value.to_le_bytes())
}

/// Read a 32-bit value from a numbered register
///
/// Registers may reflect live hardware state, so two reads in a row can
/// return different values.
pub fn read<T: IndirectTransport + ?Sized>(transport: &mut T, register: u32) -> Result<u32> {
    let mut buf = [0u8; 4];
    transport.read_register(register, &mut buf)?;
    let value = u32::from_le_bytes(buf);
    log::trace!("indirect read reg {:#04x} -> {:#010x}", register, value);
    Ok(value)
}

/// Read-modify-write a register through a pure transform
///
/// The register is always re-read first; nothing is cached.
pub fn modify<T, F>(transport: &mut T, register: u32, f: F) -> Result<u32>
where
    T: IndirectTransport + ?Sized,
    F: FnOnce(u32) -> u32,
{
    let value = f(read(transport, register)?);
    write(transport, register, value)?;
    Ok(value)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;

    /// Plain register file: every register stores what was last written
    pub(crate) struct RegisterFile {
        pub regs: [u32; 256],
        pub writes: usize,
        pub fail: bool,
    }

    impl RegisterFile {
        pub fn new() -> Self {
            Self {
                regs: [0; 256],
                writes: 0,
                fail: false,
            }
        }
    }

    impl IndirectTransport for RegisterFile {
        fn write_register(&mut self, register: u32, data: &[u8]) -> Result<()> {
            if self.fail {
                return Err(Error::Transport);
            }
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(data);
            self.regs[register as usize] = u32::from_le_bytes(bytes);
            self.writes += 1;
            Ok(())
        }

        fn read_register(&mut self, register: u32, buf: &mut [u8]) -> Result<()> {
            if self.fail {
                return Err(Error::Transport);
            }
            buf.copy_from_slice(&self.regs[register as usize].to_le_bytes());
            Ok(())
        }

        fn delay_us(&mut self, _us: u32) {}
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let mut bus = RegisterFile::new();
        for (reg, value) in [(0u32, 0u32), (0x10, 0xDEAD_BEEF), (0xFF, u32::MAX)] {
            write(&mut bus, reg, value).unwrap();
            assert_eq!(read(&mut bus, reg).unwrap(), value);
        }
    }

    #[test]
    fn test_value_is_sent_little_endian() {
        let mut bus = RegisterFile::new();
        write(&mut bus, 3, 0x0102_0304).unwrap();
        assert_eq!(bus.regs[3].to_le_bytes(), [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_modify_rereads_register() {
        let mut bus = RegisterFile::new();
        bus.regs[7] = 0xF0;
        let written = modify(&mut bus, 7, |v| v | 0x0F).unwrap();
        assert_eq!(written, 0xFF);
        assert_eq!(bus.regs[7], 0xFF);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let mut bus = RegisterFile::new();
        bus.fail = true;
        assert_eq!(read(&mut bus, 0), Err(Error::Transport));
        assert_eq!(write(&mut bus, 0, 1), Err(Error::Transport));
    }
}
