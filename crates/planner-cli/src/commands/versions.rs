//! Versions command implementation

use colored::Colorize;
use serde_json::json;

use planner_model::Namespace;
use planner_repository::{ExtensionRepository, VersionCatalog};

use super::load;
use crate::cli::CatalogArgs;
use crate::error::{CliError, Result};

/// Run the versions command
///
/// Lists local and remote versions merged, newest first. Pre-releases are
/// listed even when the resolver configuration would skip them, but are
/// marked as such.
pub fn run_versions(args: &CatalogArgs, namespace: Option<&str>, name: &str) -> Result<()> {
    let (repository, config) = load(args)?;
    let versions = VersionCatalog::new(&repository).descending(name);
    if versions.is_empty() && repository.core_extension(name).is_none() {
        return Err(CliError::user(format!("no version of '{name}' is known")));
    }

    let namespace = namespace.map(Namespace::new);
    let installed = namespace
        .as_ref()
        .and_then(|ns| repository.installed_version(name, ns));
    let core = repository.core_extension(name);

    if args.json {
        let output = json!({
            "name": name,
            "versions": versions.iter().map(|v| json!({
                "version": v.to_string(),
                "prerelease": !v.pre.is_empty(),
                "searchable": config.accepts(v),
            })).collect::<Vec<_>>(),
            "installed": installed.as_ref().map(|v| v.to_string()),
            "core": core.as_ref().map(|e| e.version.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {}", "Versions of".blue().bold(), name.bold());
    if let Some(core) = &core {
        println!(
            "  {} {} (provided by the platform)",
            "core".magenta(),
            core.version
        );
    }
    for version in &versions {
        let mut line = format!("  {version}");
        if installed.as_ref() == Some(version) {
            line = format!("{} {}", line.green().bold(), "(installed)".green());
        }
        if !version.pre.is_empty() {
            let note = if config.accepts(version) {
                "(pre-release)"
            } else {
                "(pre-release, skipped)"
            };
            line = format!("{line} {}", note.dimmed());
        }
        println!("{line}");
    }

    Ok(())
}
