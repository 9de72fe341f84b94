use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "recipegate")]
#[command(about = "Package-registry protocol gateway", long_about = None, version)]
pub struct Cli {
    /// Configuration file (default: $RECIPEGATE_CONFIG or config/recipegate.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP gateway
    Serve(ServeArgs),
    /// Create or update the index schema
    Migrate,
    /// Print the service status and index totals
    Status,
    /// Open or close the availability gate
    #[command(subcommand)]
    Maintenance(MaintenanceAction),
    /// Fold recorded downloads into package and project counters
    Tracklog {
        /// Keep processed audit rows instead of deleting them
        #[arg(long)]
        skip_delete: bool,
    },
    /// List recorded downloads not yet rolled up
    Info,
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind, overriding server.bind_addr
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(Subcommand, Debug)]
pub enum MaintenanceAction {
    /// Reject every request with 503 until disabled
    Enable {
        /// Message returned to clients
        #[arg(long)]
        reason: Option<String>,
    },
    /// Put the service back in service
    Disable,
}
