use clap::Subcommand;
use serde_json::Value;

use crate::cli::client::ApiClient;
use crate::cli::utils::{format_table, output_empty_collection};
use crate::cli::{OutputFormat, Remote};

#[derive(Subcommand)]
pub enum ItemCommands {
    #[command(about = "List food items")]
    List {
        #[arg(long = "type", help = "Only items of this type")]
        food_type: Option<String>,
        #[arg(long, help = "Only items with stock left")]
        in_stock: bool,
    },
}

pub async fn handle(cmd: ItemCommands, remote: &Remote, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ItemCommands::List { food_type, in_stock } => {
            let client = ApiClient::new(remote)?;
            let items = client.get(&list_path(food_type.as_deref(), in_stock)).await?;
            print_items(&items, output_format)
        }
    }
}

fn list_path(food_type: Option<&str>, in_stock: bool) -> String {
    let mut params = url::form_urlencoded::Serializer::new(String::new());
    if let Some(food_type) = food_type {
        params.append_pair("type", food_type);
    }
    if in_stock {
        params.append_pair("inStock", "true");
    }
    let query = params.finish();
    if query.is_empty() {
        "/api/items".to_string()
    } else {
        format!("/api/items?{}", query)
    }
}

fn print_items(items: &Value, output_format: OutputFormat) -> anyhow::Result<()> {
    let rows = items.as_array().cloned().unwrap_or_default();
    if rows.is_empty() {
        return output_empty_collection(output_format, "items", "No food items found");
    }

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Text => {
            let text = |item: &Value, key: &str| match item.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "-".to_string(),
                Some(other) => other.to_string(),
            };
            let table: Vec<Vec<String>> = rows
                .iter()
                .map(|item| {
                    vec![
                        text(item, "id"),
                        text(item, "name"),
                        text(item, "quantity"),
                        text(item, "unit"),
                        text(item, "type"),
                        text(item, "expiryDate"),
                    ]
                })
                .collect();
            println!(
                "{}",
                format_table(&["ID", "NAME", "QTY", "UNIT", "TYPE", "EXPIRES"], &table)
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_filter_query() {
        assert_eq!(list_path(None, false), "/api/items");
        assert_eq!(list_path(Some("fruit puree"), true), "/api/items?type=fruit+puree&inStock=true");
    }
}
