mod cli;

use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands, MaintenanceAction};
use recipegate::config::Config;
use recipegate::gate::ServiceStatus;
use recipegate::index::{SearchIndex, SqliteIndex};
use recipegate::observability::init_tracing;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    match cli.command {
        Commands::Serve(args) => recipegate::api::run(config, args.address).await?,
        Commands::Migrate => {
            let index = SqliteIndex::connect(&config.index).await?;
            index.migrate().await?;
        }
        Commands::Status => {
            let index = SqliteIndex::connect(&config.index).await?;
            let report = json!({
                "service_status": index.read_service_status().await?,
                "index": index.summary().await?,
                "gate_policy": config.gate_policy(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Maintenance(action) => {
            let status = match action {
                MaintenanceAction::Enable { reason } => ServiceStatus::maintenance(reason),
                MaintenanceAction::Disable => ServiceStatus::in_service(),
            };
            let index = SqliteIndex::connect(&config.index).await?;
            index.migrate().await?;
            index.set_service_status(&status).await?;
        }
        Commands::Tracklog { skip_delete } => {
            let index = SqliteIndex::connect(&config.index).await?;
            index.migrate().await?;
            let report = index.roll_up_downloads(Utc::now(), !skip_delete).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Info => {
            let index = SqliteIndex::connect(&config.index).await?;
            index.migrate().await?;
            let pending = index.pending_downloads(Utc::now()).await?;
            for entry in &pending {
                println!(
                    "> {} {} {} {} {} {}",
                    entry.t.to_rfc3339(),
                    entry.package_name,
                    entry.package_version,
                    entry.package_username,
                    entry.package_channel,
                    entry.revision
                );
            }
            println!("{} pending downloads", pending.len());
        }
    }

    Ok(())
}
