//! Master SPI register map and control register layout
//!
//! The master SPI block is driven through three 32-bit registers:
//!
//! - SPICTL: mode, byte count, chip select, done flag and master enable
//! - SPITX: word staged for the next transfer
//! - SPIRX: bytes shifted in during the last transfer
//!
//! SPICTL is never cached. The hardware sets the done flag on its own, so
//! every change is a read-modify-write of the live register.

// ============================================================================
// Register offsets
// ============================================================================

/// SPI control register
pub const REG_SPICTL: u32 = 0x10;
/// SPI transmit register
pub const REG_SPITX: u32 = 0x40;
/// SPI receive register
pub const REG_SPIRX: u32 = 0x50;

// ============================================================================
// SPICTL fields
// ============================================================================

/// Mode field (bits 1:0)
pub const SPICTL_MODE: u32 = 0x0000_0003;
/// Byte count field (bits 3:2), holds bytes per transfer minus one
pub const SPICTL_NUMBYTES: u32 = 0x0000_000C;
/// Byte count field offset
pub const SPICTL_NUMBYTES_OFF: u32 = 2;
/// Chip select field (bits 5:4)
pub const SPICTL_SS: u32 = 0x0000_0030;
/// Chip select field offset
pub const SPICTL_SS_OFF: u32 = 4;
/// Transfer done flag, set by hardware
pub const SPICTL_DONE: u32 = 0x0000_0040;
/// Master SPI enable. Takes the pins away from the LED function.
pub const SPICTL_MSPI_EN: u32 = 0x0000_0100;

/// Largest transfer the block can clock in one go
pub const MAX_TRANSFER_BYTES: u8 = 4;

/// Register offsets of the master SPI block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    /// Control register
    pub spictl: u32,
    /// Transmit register
    pub spitx: u32,
    /// Receive register
    pub spirx: u32,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            spictl: REG_SPICTL,
            spitx: REG_SPITX,
            spirx: REG_SPIRX,
        }
    }
}

/// Master SPI mode (SPICTL bits 1:0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MspiMode {
    /// Chip select released
    #[default]
    Idle = 0,
    /// Chip select asserted
    Enable = 1,
    /// Clock the staged word out on the bus
    Transfer = 2,
    /// Latch new data into the output buffer
    Update = 3,
}

impl MspiMode {
    /// Decode the two mode bits
    pub const fn from_bits(bits: u32) -> Self {
        match bits & SPICTL_MODE {
            0 => Self::Idle,
            1 => Self::Enable,
            2 => Self::Transfer,
            _ => Self::Update,
        }
    }

    /// Whether chip select is held in this mode
    pub const fn selects_chip(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// SPICTL register value
///
/// All transforms are pure; compose them and write the result once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpiCtl(pub u32);

impl SpiCtl {
    /// Raw register value
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Current mode
    pub const fn mode(self) -> MspiMode {
        MspiMode::from_bits(self.0)
    }

    /// Replace the mode field, leaving every other bit alone
    pub const fn with_mode(self, mode: MspiMode) -> Self {
        Self((self.0 & !SPICTL_MODE) | mode as u32)
    }

    /// Bytes moved by the next transfer (1..=4)
    pub const fn byte_count(self) -> u8 {
        (((self.0 & SPICTL_NUMBYTES) >> SPICTL_NUMBYTES_OFF) + 1) as u8
    }

    /// Replace the byte count field
    ///
    /// `bytes` must be in 1..=4; the field stores `bytes - 1`.
    pub const fn with_byte_count(self, bytes: u8) -> Self {
        let field = ((bytes.wrapping_sub(1) as u32) << SPICTL_NUMBYTES_OFF) & SPICTL_NUMBYTES;
        Self((self.0 & !SPICTL_NUMBYTES) | field)
    }

    /// Chip select line
    pub const fn chip_select(self) -> u8 {
        ((self.0 & SPICTL_SS) >> SPICTL_SS_OFF) as u8
    }

    /// Replace the chip select field
    pub const fn with_chip_select(self, cs: u8) -> Self {
        Self((self.0 & !SPICTL_SS) | (((cs as u32) << SPICTL_SS_OFF) & SPICTL_SS))
    }

    /// Whether master SPI owns the pins
    pub const fn master_enabled(self) -> bool {
        self.0 & SPICTL_MSPI_EN != 0
    }

    /// Set or clear the master SPI enable bit
    pub const fn with_master_enable(self, enable: bool) -> Self {
        if enable {
            Self(self.0 | SPICTL_MSPI_EN)
        } else {
            Self(self.0 & !SPICTL_MSPI_EN)
        }
    }

    /// Whether the last transfer finished
    pub const fn is_done(self) -> bool {
        self.0 & SPICTL_DONE != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_field_is_isolated() {
        let base = SpiCtl(0xFFFF_FFFF);
        for mode in [
            MspiMode::Idle,
            MspiMode::Enable,
            MspiMode::Transfer,
            MspiMode::Update,
        ] {
            let ctl = base.with_mode(mode);
            assert_eq!(ctl.mode(), mode);
            assert_eq!(ctl.bits() & !SPICTL_MODE, 0xFFFF_FFFC);
        }
    }

    #[test]
    fn test_byte_count_encoding() {
        assert_eq!(SpiCtl(0).with_byte_count(1).bits(), 0x0);
        assert_eq!(SpiCtl(0).with_byte_count(4).bits(), 0xC);
        assert_eq!(SpiCtl(0xFFFF_FFFF).with_byte_count(2).bits(), 0xFFFF_FFF7);
        for n in 1..=MAX_TRANSFER_BYTES {
            assert_eq!(SpiCtl(0x1F3).with_byte_count(n).byte_count(), n);
        }
    }

    #[test]
    fn test_master_enable_and_chip_select() {
        let ctl = SpiCtl(0).with_master_enable(true).with_chip_select(2);
        assert!(ctl.master_enabled());
        assert_eq!(ctl.chip_select(), 2);
        assert_eq!(ctl.bits(), 0x120);
        assert!(!ctl.with_master_enable(false).master_enabled());
    }

    #[test]
    fn test_done_flag() {
        assert!(!SpiCtl(0).is_done());
        assert!(SpiCtl(SPICTL_DONE).is_done());
    }
}
