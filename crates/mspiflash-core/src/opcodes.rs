//! SPI NOR flash opcodes used by the driver
//!
//! Only the four commands needed to program the attached part are defined.
//! The transmit register is left-aligned: a transfer of `n` bytes clocks the
//! top `n` bytes of SPITX. Every command is staged with its opcode in the top
//! byte, and commands that carry an address put the 24-bit address below it.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;

// ============================================================================
// Status register
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;

// ============================================================================
// Program / erase - 3-byte address
// ============================================================================

/// Page Program
pub const PP: u8 = 0x02;
/// Sector Erase (4KB)
pub const SE_20: u8 = 0x20;

// ============================================================================
// Geometry
// ============================================================================

/// Size of the region erased by [`SE_20`]
pub const SECTOR_SIZE: u32 = 4096;
/// Highest address reachable with a 3-byte address phase
pub const MAX_ADDR_3B: u32 = 0x00FF_FFFF;

/// Stage a bare opcode as a transmit word
pub const fn opcode_word(opcode: u8) -> u32 {
    (opcode as u32) << 24
}

/// Stage an opcode and a 3-byte address as a single transmit word
pub const fn command_word(opcode: u8, addr: u32) -> u32 {
    ((opcode as u32) << 24) | (addr & MAX_ADDR_3B)
}

/// Whether `addr` starts a sector
pub const fn is_sector_aligned(addr: u32) -> bool {
    addr & (SECTOR_SIZE - 1) == 0
}
