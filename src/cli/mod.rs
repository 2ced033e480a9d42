//! CLI Module
//!
//! Command-line interface for the Memoria simulator.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Memoria Simulator - headless driver for the layer browsing engine
#[derive(Parser, Debug)]
#[command(name = "memoria-sim")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the planned layers for an amount of content
    #[command(name = "layout")]
    Layout {
        /// Number of content items
        count: usize,
    },

    /// Run a navigation script against a headless engine
    #[command(name = "simulate")]
    Simulate {
        /// Number of content items
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,

        /// Comma-separated steps: in, out, grab, release, accept
        #[arg(short, long, default_value = "in,out")]
        script: String,

        /// Fixed tick length in seconds
        #[arg(long, default_value_t = 0.02)]
        dt: f32,

        /// Write the event log to this CSV file
        #[arg(short, long)]
        events: Option<PathBuf>,
    },

    /// Print the configuration after clamping
    #[command(name = "check-config")]
    CheckConfig,
}
