//! Command implementations for planner-cli

pub mod plan;
pub mod resolve;
pub mod versions;

pub use plan::run_plan;
pub use resolve::run_resolve;
pub use versions::run_versions;

use planner_core::ResolverConfig;
use planner_repository::CatalogRepository;

use crate::cli::CatalogArgs;
use crate::error::Result;

/// Load the catalog and resolver configuration named on the command line.
pub(crate) fn load(args: &CatalogArgs) -> Result<(CatalogRepository, ResolverConfig)> {
    let repository = CatalogRepository::from_path(&args.catalog)?;
    let config = match &args.config {
        Some(path) => ResolverConfig::from_path(path)?,
        None => ResolverConfig::default(),
    };
    Ok((repository, config))
}
