//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
pub fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

const TARGET_HELP: &str = "Target to drive [available: sim] \
    (e.g. sim:size=1M,busy=3,latency=0,stuck=done)";

#[derive(Parser)]
#[command(name = "mspiflash")]
#[command(author, version, about = "Master-SPI NOR flash programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// How to treat a byte count that is not a multiple of 4
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TailArg {
    /// Pad the last word with 0xFF
    #[default]
    Pad,
    /// Refuse the write
    Reject,
}

/// Driver options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct DriverArgs {
    /// Give up after this many polls of a flag (default: wait forever)
    #[arg(long)]
    pub max_polls: Option<u32>,

    /// Delay between polls in microseconds
    #[arg(long, default_value_t = 0)]
    pub poll_interval_us: u32,

    /// Partial final word handling
    #[arg(long, value_enum, default_value_t = TailArg::Pad)]
    pub tail: TailArg,

    /// Bytes per page program call
    #[arg(long, default_value_t = 1024)]
    pub chunk_size: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the flash status register
    Status {
        /// Target to drive
        #[arg(short, long, help = TARGET_HELP)]
        target: String,

        #[command(flatten)]
        driver: DriverArgs,
    },

    /// Erase the 4 KiB sector containing an address
    Erase {
        /// Target to drive
        #[arg(short, long, help = TARGET_HELP)]
        target: String,

        /// Address inside the sector (hex, e.g., 0x10000)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,

        /// Write the simulated flash contents to this file afterwards
        #[arg(long)]
        dump: Option<PathBuf>,

        #[command(flatten)]
        driver: DriverArgs,
    },

    /// Program a file into flash
    Program {
        /// Target to drive
        #[arg(short, long, help = TARGET_HELP)]
        target: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Start address (hex or decimal); sector aligned to erase first
        #[arg(short, long, value_parser = parse_hex_u32, default_value = "0")]
        address: u32,

        /// Keep master SPI enabled afterwards (LED outputs stay off)
        #[arg(long)]
        no_release: bool,

        /// Write the simulated flash contents to this file afterwards
        #[arg(long)]
        dump: Option<PathBuf>,

        #[command(flatten)]
        driver: DriverArgs,
    },

    /// List supported targets
    ListTargets,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommand_pages() {
        let names: Vec<String> = Cli::command()
            .get_subcommands()
            .map(|c| c.get_name().to_string())
            .collect();
        assert_eq!(names, ["status", "erase", "program", "list-targets"]);
    }

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x1000"), Ok(0x1000));
        assert_eq!(parse_hex_u32("4096"), Ok(4096));
        assert!(parse_hex_u32("0xZZ").is_err());
    }
}
