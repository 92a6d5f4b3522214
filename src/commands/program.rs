//! Program command with progress reporting

use super::{dump_flash, read_file};
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use mspiflash_core::{opcodes, DriverConfig, FlashProgrammer, WriteProgress, WriteStats};
use mspiflash_sim::SimChip;
use std::path::Path;

/// Create a standard progress bar style
fn create_progress_bar_style() -> std::result::Result<ProgressStyle, Box<dyn std::error::Error>> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
        .progress_chars("#>-"))
}

/// Progress reporter using an indicatif progress bar
pub struct IndicatifProgress {
    bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self { bar: None }
    }
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteProgress for IndicatifProgress {
    fn writing(&mut self, bytes_to_write: usize) {
        let pb = ProgressBar::new(bytes_to_write as u64);
        pb.set_style(create_progress_bar_style().unwrap_or_else(|_| ProgressStyle::default_bar()));
        self.bar = Some(pb);
    }

    fn write_progress(&mut self, bytes_written: usize) {
        if let Some(pb) = &self.bar {
            pb.set_position(bytes_written as u64);
        }
    }

    fn complete(&mut self, stats: &WriteStats) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message("Write complete");
        }
        println!(
            "Wrote {} bytes in {} page programs, {} sectors erased",
            stats.bytes_written, stats.chunks, stats.sectors_erased
        );
    }
}

/// Run the program command
pub fn run_program(
    chip: SimChip,
    config: DriverConfig,
    input: &Path,
    address: u32,
    release: bool,
    dump: Option<&Path>,
) -> Result<()> {
    let data = read_file(input)?;
    if !opcodes::is_sector_aligned(address) {
        println!(
            "Warning: 0x{:06X} is not sector aligned; the first sector will not be erased",
            address
        );
    }

    let mut programmer = FlashProgrammer::new(chip, config);
    let mut progress = IndicatifProgress::new();
    programmer.write_image(address, &data, &mut progress)?;

    if release {
        programmer.release()?;
    }

    dump_flash(programmer.transport(), dump)
}
