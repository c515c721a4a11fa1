use clap::Subcommand;
use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::services::GroupService;

#[derive(Subcommand)]
pub enum InviteCommands {
    #[command(about = "Delete expired or already used invite codes")]
    Purge,
}

pub async fn handle(cmd: InviteCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        InviteCommands::Purge => {
            let config = AppConfig::from_env();
            let pool = DatabaseManager::connect(&config.database).await?;
            let removed = GroupService::new(pool).purge_invites().await?;
            output_success(
                output_format,
                &format!("Purged {} invite codes", removed),
                Some(json!({ "purged": removed })),
            )
        }
    }
}
