//! mspiflash - Program SPI NOR flash behind a master SPI block
//!
//! The flash hangs off a host chip whose master SPI block is only reachable
//! through an indirect register bus. This front end drives the
//! `mspiflash-core` sequencer over a target transport; the bundled target is
//! the `mspiflash-sim` simulator, useful for dry runs of an image layout.

mod cli;
mod commands;
mod error;
mod targets;

use clap::Parser;
use cli::{Cli, Commands};
use targets::{driver_config, open_target};

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let result = match cli.command {
        Commands::Status { target, driver } => {
            open_target(&target).and_then(|chip| commands::run_status(chip, driver_config(&driver)))
        }
        Commands::Erase {
            target,
            address,
            dump,
            driver,
        } => open_target(&target).and_then(|chip| {
            commands::run_erase(chip, driver_config(&driver), address, dump.as_deref())
        }),
        Commands::Program {
            target,
            input,
            address,
            no_release,
            dump,
            driver,
        } => open_target(&target).and_then(|chip| {
            commands::run_program(
                chip,
                driver_config(&driver),
                &input,
                address,
                !no_release,
                dump.as_deref(),
            )
        }),
        Commands::ListTargets => {
            commands::list_targets();
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
