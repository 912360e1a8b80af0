//! Phasor - steady-state network solver
//!
//! Loads a saved network, solves it and prints branch currents and voltage
//! drops at a chosen instant.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=phasor_core=debug phasor loop.net --time 0.005 --potentials
//! ```

use std::path::PathBuf;

use clap::Parser;
use phasor_core::{error::Result, persist, NetworkConfig};
use tracing_subscriber::EnvFilter;

/// Steady-state phasor solver for saved networks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the saved network file
    #[arg(value_name = "NETWORK_FILE")]
    network_file: PathBuf,

    /// Instant (seconds) at which to project the phasors
    #[arg(short, long, default_value_t = 0.0)]
    time: f64,

    /// Also print normalized node potentials
    #[arg(short, long)]
    potentials: bool,

    /// Terminal snapping radius used while loading
    #[arg(long, default_value_t = phasor_core::DEFAULT_MERGE_RADIUS)]
    merge_radius: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = NetworkConfig::new().with_merge_radius(args.merge_radius);

    let mut network = persist::load_file(&args.network_file, config)?;
    network.evaluate(true)?;

    println!("valid: {}", network.is_valid());
    println!("angular frequencies: {:?}", network.simulated_angular_frequencies());

    let ids: Vec<_> = network.components().map(|c| (c.id, c.kind.class_name())).collect();
    for (id, class) in ids {
        let current = network.branch_current(id, args.time)?;
        let drop = network.branch_voltage_drop(id, args.time)?;
        println!("{:>5} {:<20} I = {:>12.6}  V = {:>12.6}", id.to_string(), class, current, drop);
    }

    if args.potentials {
        for (vertex, potential) in network.potentials(args.time)? {
            println!("{:>5} {:.6}", vertex.to_string(), potential);
        }
    }

    Ok(())
}
