use clap::Subcommand;
use serde_json::{json, Map, Value};

use crate::api::format::present;
use crate::cli::utils::{output_success, output_table};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::user::ROLE_USER;
use crate::database::models::USER;
use crate::database::{DatabaseManager, QueryOptions};
use crate::services::UserService;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user")]
    Create {
        #[arg(long, help = "First name")]
        name: String,
        #[arg(long, help = "Last name")]
        last_name: String,
        #[arg(long, help = "Email address (must be unique)")]
        email: String,
        #[arg(long, help = "Password: at least 8 characters with a letter and a digit")]
        password: String,
        #[arg(long, default_value = ROLE_USER, help = "Role: user or admin")]
        role: String,
    },

    #[command(about = "List users one page at a time")]
    List {
        #[arg(long, help = "Only users with this role")]
        role: Option<String>,
        #[arg(long, help = "Sort criteria, e.g. name:asc,email:desc")]
        sort_by: Option<String>,
        #[arg(long, help = "Page size (default 10)")]
        limit: Option<i64>,
        #[arg(long, help = "Page number (default 1)")]
        page: Option<i64>,
    },
}

pub async fn handle(cmd: UserCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = DatabaseManager::connect(&config.database).await?;
    let users = UserService::new(store);

    match cmd {
        UserCommands::Create { name, last_name, email, password, role } => {
            let body: Map<String, Value> = [
                ("name", name),
                ("lastName", last_name),
                ("email", email),
                ("password", password),
                ("role", role),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v)))
            .collect();

            let user = present(users.create_user(body).await?, &USER);
            let message = format!("Created user {}", user["email"].as_str().unwrap_or_default());
            output_success(output_format, &message, Some(json!({ "user": user })))
        }
        UserCommands::List { role, sort_by, limit, page } => {
            let filter = match role {
                Some(role) => json!({ "role": role }),
                None => json!({}),
            };
            let options = QueryOptions { sort_by, limit, page };
            let page = users.query_users(filter, &options).await?;

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
                OutputFormat::Text => {
                    output_table(&page.results, &["id", "email", "name", "lastName", "role", "status"]);
                    println!(
                        "page {}/{} ({} users)",
                        page.page,
                        page.total_pages.max(1),
                        page.total_results
                    );
                }
            }
            Ok(())
        }
    }
}
