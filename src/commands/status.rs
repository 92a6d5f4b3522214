//! Status and erase commands

use super::dump_flash;
use crate::error::Result;
use mspiflash_core::protocol::StatusFlags;
use mspiflash_core::{DriverConfig, FlashProgrammer};
use mspiflash_sim::SimChip;
use std::path::Path;

/// Run the status command
pub fn run_status(chip: SimChip, config: DriverConfig) -> Result<()> {
    let mut programmer = FlashProgrammer::new(chip, config);
    let status = programmer.read_status()?;
    programmer.release()?;

    println!("Status register: {:#04x}", status.bits());
    println!(
        "  WIP: {}",
        if status.contains(StatusFlags::WIP) {
            "busy"
        } else {
            "idle"
        }
    );
    println!(
        "  WEL: {}",
        if status.contains(StatusFlags::WEL) {
            "set"
        } else {
            "clear"
        }
    );
    Ok(())
}

/// Run the sector erase command
pub fn run_erase(
    chip: SimChip,
    config: DriverConfig,
    address: u32,
    dump: Option<&Path>,
) -> Result<()> {
    let mut programmer = FlashProgrammer::new(chip, config);
    let sector = address & !(mspiflash_core::opcodes::SECTOR_SIZE - 1);
    println!("Erasing sector at 0x{:06X}...", sector);

    programmer.erase_sector(address)?;
    programmer.release()?;

    println!("Erase complete");
    dump_flash(programmer.transport(), dump)
}
