//! Resolve command implementation
//!
//! Runs a flavor resolution job over a catalog and reports every flavor
//! found.

use std::sync::Arc;

use colored::Colorize;
use serde_json::json;

use planner_core::{FlavorResolutionJob, JobState, LogProgress, ResolutionRequest, ResolutionStatus};
use planner_model::{ExtensionId, Namespace};

use super::load;
use crate::cli::CatalogArgs;
use crate::error::{CliError, Result};

/// Run the resolve command
///
/// Fails when the job itself fails. Candidates that do not resolve are
/// simply absent from the output.
pub fn run_resolve(
    args: &CatalogArgs,
    namespace: &str,
    query: Option<&str>,
    known: &[String],
) -> Result<()> {
    let (repository, config) = load(args)?;

    let mut request = ResolutionRequest::new(Namespace::new(namespace));
    for id in known {
        request = request.with_known(ExtensionId::parse(id)?);
    }
    if let Some(query) = query {
        request = request.with_search(query);
    }
    if request.known.is_empty() && request.search_query.is_none() {
        return Err(CliError::user(
            "nothing to resolve: pass --known or --query",
        ));
    }

    let job = FlavorResolutionJob::new(Arc::new(repository))
        .with_config(config)
        .with_reporter(Arc::new(LogProgress::new()));
    let handle = job.start(request)?;
    let state = handle.await_terminal();
    let status = handle.status();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status_json(&status))?);
    } else {
        print_status(&status);
    }

    match state {
        JobState::Failed => Err(CliError::user(format!(
            "resolution failed: {}",
            status.error().unwrap_or_else(|| "unknown error".to_string())
        ))),
        _ => Ok(()),
    }
}

fn print_status(status: &ResolutionStatus) {
    let found = status.found();
    println!(
        "{} {} in {} ({})",
        "Resolved".blue().bold(),
        format!("{} flavor(s)", found.len()).bold(),
        status.namespace().to_string().yellow(),
        status.state().to_string().cyan()
    );

    if found.is_empty() {
        println!("  {}", "No installable flavor found.".dimmed());
        return;
    }

    println!();
    for extension in found.iter() {
        match &extension.description {
            Some(description) => println!(
                "  {} {} {}",
                "+".green(),
                extension.to_string().bold(),
                description.dimmed()
            ),
            None => println!("  {} {}", "+".green(), extension.to_string().bold()),
        }
    }

    if let (Some(started), Some(finished)) = (status.started_at(), status.finished_at()) {
        println!();
        println!(
            "{}",
            format!("Finished in {} ms", (finished - started).num_milliseconds()).dimmed()
        );
    }
}

fn status_json(status: &ResolutionStatus) -> serde_json::Value {
    let flavors: Vec<_> = status
        .found()
        .iter()
        .map(|e| {
            json!({
                "name": e.name,
                "version": e.version.to_string(),
                "description": e.description,
            })
        })
        .collect();
    json!({
        "job": status.snapshot(),
        "flavors": flavors,
    })
}
