use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser, Debug)]
#[clap(
    version,
    about = "CareVox - a smart voice for golden years"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Path to the appointments file
    #[clap(long, value_parser)]
    pub appointments_file: Option<PathBuf>,

    /// Print announcements instead of speaking them
    #[clap(short, long)]
    pub quiet: bool,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the carevox application
    #[clap(subcommand)]
    pub command: Commands,
}
