pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "organiser")]
#[command(about = "Baby Organiser CLI - schema, invite and inventory maintenance")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "API base URL (default: $ORGANISER_SERVER or http://localhost:3000)")]
    pub server: Option<String>,

    #[arg(long, global = true, help = "Access token (default: $ORGANISER_TOKEN)")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Database schema management")]
    Schema {
        #[command(subcommand)]
        cmd: commands::schema::SchemaCommands,
    },

    #[command(about = "Group invite maintenance")]
    Invites {
        #[command(subcommand)]
        cmd: commands::invites::InviteCommands,
    },

    #[command(about = "Food inventory of the token's active group")]
    Items {
        #[command(subcommand)]
        cmd: commands::items::ItemCommands,
    },

    #[command(about = "Menu import")]
    Menus {
        #[command(subcommand)]
        cmd: commands::menus::MenuCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Connection settings for commands that talk to a running server.
#[derive(Debug, Clone)]
pub struct Remote {
    pub server: String,
    pub token: Option<String>,
}

impl Remote {
    pub fn from_cli(cli: &Cli) -> Self {
        let server = cli
            .server
            .clone()
            .or_else(|| std::env::var("ORGANISER_SERVER").ok())
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let token = cli.token.clone().or_else(|| std::env::var("ORGANISER_TOKEN").ok());
        Self {
            server: server.trim_end_matches('/').to_string(),
            token,
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let remote = Remote::from_cli(&cli);

    match cli.command {
        Commands::Schema { cmd } => commands::schema::handle(cmd, output_format).await,
        Commands::Invites { cmd } => commands::invites::handle(cmd, output_format).await,
        Commands::Items { cmd } => commands::items::handle(cmd, &remote, output_format).await,
        Commands::Menus { cmd } => commands::menus::handle(cmd, &remote, output_format).await,
    }
}
