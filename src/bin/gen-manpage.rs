//! Man page generator for mspiflash
//!
//! Writes `mspiflash.1` plus one `mspiflash-<command>.1` page per
//! subcommand.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
mod cli;

fn render(cmd: clap::Command, dir: &Path, name: &str) -> std::io::Result<PathBuf> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;
    let path = dir.join(format!("{}.1", name));
    fs::write(&path, buffer)?;
    Ok(path)
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();
    let root = cmd.get_name().to_string();

    for sub in cmd.get_subcommands() {
        let name = format!("{}-{}", root, sub.get_name());
        let path = render(sub.clone(), &output_dir, &name)?;
        println!("Generated {}", path.display());
    }

    let path = render(cmd, &output_dir, &root)?;
    println!("Generated {}", path.display());
    println!("\nView with: man -l {}", path.display());

    Ok(())
}
