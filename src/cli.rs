use clap::{Parser, Subcommand};

/// PlateKeeper: license plate access control for residential buildings
#[derive(Parser)]
#[command(name = "platekeeper", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Manage buildings (tenants)
    Building {
        #[command(subcommand)]
        command: BuildingCommands,
    },
}

#[derive(Subcommand)]
pub enum BuildingCommands {
    /// Create a building and print its API token
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
    },
    /// List all buildings (tokens are not shown)
    List,
    /// Replace a building's API token, invalidating the old one
    RotateToken {
        #[arg(long)]
        id: String,
    },
}
