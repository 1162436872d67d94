use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Nestling: embed a client's surfaces into host windows.
#[derive(Parser, Debug)]
#[command(name = "nestling", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter override (e.g. `nestling=debug`).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Embedding socket name override.
    #[arg(long, global = true)]
    pub socket_name: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a recorded session trace against a headless host and print
    /// what the compositor did.
    Replay {
        /// JSON trace file.
        trace: PathBuf,
    },
}

pub fn parse() -> Args {
    Args::parse()
}
