use clap::Parser;
use retro_lib::{MachineConfig, Registry};
use std::path::PathBuf;
use tracing::info;

use crate::error::Result;

/// Headless runner for the emulation core.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Machine to emulate (e.g. "gb", "nes")
    #[arg(short, long)]
    machine: String,

    /// Cartridge image
    cart: PathBuf,

    /// Boot ROM image, for machines that need one
    #[arg(short, long)]
    bootrom: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let config = MachineConfig {
        cart: args.cart,
        bootrom: args.bootrom,
    };

    let registry = Registry::with_builtins();
    let mut session = registry.build(&args.machine, &config)?;

    // Headless frontends: no input events, no debugger. A machine with no
    // clocks registered returns immediately.
    session.run(&mut (), &mut ());
    session.deinit();

    info!("session ended");
    Ok(())
}
