//! LightSeq CLI
//!
//! Command-line tools for lightseq tables and devices.
//!
//! # Commands
//!
//! - `diff` - Show the operations between two snapshots of a table
//! - `send` - Paint a device with one colour
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use lightseq_protocol::TableName;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LightSeq command-line tools.
#[derive(Parser)]
#[command(name = "lightseq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the operations that turn one table snapshot into another
    Diff {
        /// Table the snapshots belong to
        #[arg(short, long)]
        table: TableName,

        /// Previous snapshot (JSON array of documents)
        previous: PathBuf,

        /// Current snapshot (JSON array of documents)
        current: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Paint a device with one colour
    Send {
        /// Device address (ip:port)
        #[arg(short, long)]
        addr: SocketAddr,

        /// Colour as RRGGBB hex
        #[arg(short, long)]
        color: String,

        /// Number of pixels to paint
        #[arg(short, long, default_value = "1")]
        pixels: usize,

        /// Output id on the device
        #[arg(short, long, default_value = "1")]
        output: u8,

        /// Brightness to set first (clamped to 0-255)
        #[arg(short, long, allow_negative_numbers = true)]
        brightness: Option<i64>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Diff {
            table,
            previous,
            current,
            format,
        } => {
            commands::diff::run(table, &previous, &current, &format)?;
        }
        Commands::Send {
            addr,
            color,
            pixels,
            output,
            brightness,
        } => {
            let color = commands::send::parse_color(&color)?;
            commands::send::run(addr, color, pixels, output, brightness)?;
        }
        Commands::Version => {
            println!("lightseq CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
