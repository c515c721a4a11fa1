use clap::Subcommand;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum SchemaCommands {
    #[command(about = "Create missing tables and indexes using DATABASE_URL")]
    Apply,
}

pub async fn handle(cmd: SchemaCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SchemaCommands::Apply => {
            let config = AppConfig::from_env();
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::ensure_schema(&pool).await?;
            output_success(output_format, "Database schema applied", None)
        }
    }
}
