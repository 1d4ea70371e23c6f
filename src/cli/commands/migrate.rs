use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::DatabaseManager;

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = DatabaseManager::connect_postgres(&config.database).await?;
    store.migrate().await?;

    let url = config.database.url.as_deref().map(DatabaseManager::redact_url);
    output_success(output_format, "Migrations applied", Some(json!({ "database": url })))
}
