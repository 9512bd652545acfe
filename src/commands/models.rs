//! Model and annotation listings.

use clap::{Args, Subcommand};
use uuid::Uuid;

use modelhub_core::config::AppConfig;
use modelhub_core::error::AppError;
use modelhub_core::types::PageRequest;
use modelhub_entity::annotation::{AnnotationFilter, CategoryFilter, FlagFilter};
use modelhub_service::CatalogService;

use crate::output;

/// Arguments for the models command
#[derive(Debug, Args)]
pub struct ModelsArgs {
    /// Models subcommand
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Paging options
#[derive(Debug, Args)]
pub struct PageArgs {
    /// Rows per page (1-100)
    #[arg(long)]
    pub limit: Option<String>,
    /// Rows to skip
    #[arg(long)]
    pub offset: Option<String>,
}

impl PageArgs {
    fn page(&self) -> PageRequest {
        PageRequest::from_query(self.limit.as_deref(), self.offset.as_deref())
    }
}

/// Models subcommands
#[derive(Debug, Subcommand)]
pub enum ModelsCommand {
    /// List ingested models, newest first
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// List annotation records, most recently updated first
    Annotations {
        /// `all`, `none`, or a category name
        #[arg(long)]
        category: Option<String>,
        /// Shape flag: yes or no
        #[arg(long, default_value = "")]
        shape: String,
        /// Part flag: yes or no
        #[arg(long, default_value = "")]
        part: String,
        /// Mobility flag: yes or no
        #[arg(long, default_value = "")]
        mobility: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one model's annotation record
    Show {
        /// Model id
        model_id: Uuid,
    },
}

/// Execute models commands
pub async fn execute(args: &ModelsArgs, config: &AppConfig) -> Result<(), AppError> {
    let catalog = CatalogService::new(super::open_store(config).await?);

    match &args.command {
        ModelsCommand::List { page } => output::print_json(&catalog.list_models(&page.page()).await?),
        ModelsCommand::Annotations {
            category,
            shape,
            part,
            mobility,
            page,
        } => {
            let filter = AnnotationFilter {
                category: CategoryFilter::parse(category.as_deref()),
                shape_annotated: shape.parse::<FlagFilter>()?,
                part_annotated: part.parse::<FlagFilter>()?,
                mobility_annotated: mobility.parse::<FlagFilter>()?,
            };
            output::print_json(&catalog.list_annotations(&filter, &page.page()).await?)
        }
        ModelsCommand::Show { model_id } => {
            output::print_json(&catalog.get_annotation(*model_id).await?)
        }
    }
}
