//! Shape category commands.

use clap::{Args, Subcommand};

use modelhub_core::config::AppConfig;
use modelhub_core::error::AppError;
use modelhub_service::CatalogService;

use crate::output;

/// Arguments for the category command
#[derive(Debug, Args)]
pub struct CategoryArgs {
    /// Category subcommand
    #[command(subcommand)]
    pub command: CategoryCommand,
}

/// Category subcommands
#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    /// List all categories
    List,
    /// Add a category
    Create {
        /// Category name
        name: String,
    },
}

/// Execute category commands
pub async fn execute(args: &CategoryArgs, config: &AppConfig) -> Result<(), AppError> {
    let catalog = CatalogService::new(super::open_store(config).await?);

    match &args.command {
        CategoryCommand::List => output::print_json(&catalog.list_categories().await?),
        CategoryCommand::Create { name } => {
            let category = catalog.create_category(name).await?;
            output::print_success(&format!("Category '{}' created", category.name));
            output::print_json(&category)
        }
    }
}
