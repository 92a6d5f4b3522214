//! Command implementations

mod list;
mod program;
mod status;

pub use list::list_targets;
pub use program::run_program;
pub use status::{run_erase, run_status};

use crate::error::{CliError, Result};
use mspiflash_sim::SimChip;
use std::path::Path;

/// Read file contents into a Vec
fn read_file(path: &Path) -> Result<Vec<u8>> {
    let data = std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    println!("Read {} bytes from {:?}", data.len(), path);
    Ok(data)
}

/// Write the simulated flash contents to `path`, if asked to
fn dump_flash(chip: &SimChip, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    std::fs::write(path, chip.data()).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    println!("Flash contents written to {:?}", path);
    Ok(())
}
