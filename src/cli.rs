//! Command-line interface for the Neutron game server.

use clap::{Parser, Subcommand};

/// Neutron - board game server with AI opponents
#[derive(Parser, Debug)]
#[command(name = "neutron_games")]
#[command(about = "Neutron board game server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game server
    Serve {
        /// Port to bind to (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides HOST)
        #[arg(long)]
        host: Option<String>,
    },
}
