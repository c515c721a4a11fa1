use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::output_success;
use crate::cli::{OutputFormat, Remote};
use crate::database::models::menu::LegacyPayload;

#[derive(Subcommand)]
pub enum MenuCommands {
    #[command(about = "Import legacy menu documents from a JSON file")]
    Import {
        #[arg(help = "JSON file holding one document or an array of documents")]
        file: PathBuf,
    },
}

pub async fn handle(cmd: MenuCommands, remote: &Remote, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        MenuCommands::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let payload = parse_documents(&content)?;

            let client = ApiClient::new(remote)?;
            let response = client.post("/api/menus/legacy", &payload).await?;
            let imported = response
                .get("menus")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0);

            output_success(
                output_format,
                &format!("Imported {} menus from {}", imported, file.display()),
                Some(json!({ "imported": imported })),
            )
        }
    }
}

/// Checks the file parses as legacy documents before anything is sent.
fn parse_documents(content: &str) -> anyhow::Result<Value> {
    let value: Value = serde_json::from_str(content).context("menu file is not valid JSON")?;
    let documents = serde_json::from_value::<LegacyPayload>(value.clone())
        .context("menu file does not contain legacy menu documents")?
        .into_documents();
    if documents.is_empty() {
        anyhow::bail!("menu file contains no documents");
    }
    Ok(value)
}
