//! Plan command implementation
//!
//! Builds and prints the installation plan of one extension.

use colored::Colorize;
use serde_json::{Value, json};

use planner_core::{
    CancellationToken, InstallError, PlanNode, PlanTreeBuilder, SilentProgress, ValidationCache,
    VersionSearch,
};
use planner_model::{ExtensionId, Namespace, Version};
use planner_repository::{DefaultNamespaceChecker, VersionCatalog};

use super::load;
use crate::cli::CatalogArgs;
use crate::error::{CliError, Result};

/// Run the plan command
///
/// A versioned id is planned as is. Without a version, versions are tried
/// newest first and the first one that plans is shown.
pub fn run_plan(args: &CatalogArgs, namespace: &str, extension: &str) -> Result<()> {
    let (repository, config) = load(args)?;
    let id = ExtensionId::parse(extension)?;
    let namespace = Namespace::new(namespace);

    let checker = DefaultNamespaceChecker;
    let builder = PlanTreeBuilder::new(&repository, &checker, &config);
    let mut cache = ValidationCache::new();

    let (plan, failures) = match id.version() {
        Some(_) => match builder.build_root(&id, &namespace, &mut cache) {
            Ok(plan) => (Some(plan), Vec::new()),
            Err(e) => (None, vec![(id.clone(), e)]),
        },
        None => {
            let versions: Vec<Version> = VersionCatalog::new(&repository)
                .descending(id.name())
                .into_iter()
                .filter(|v| config.accepts(v))
                .collect();
            if versions.is_empty() {
                return Err(CliError::user(format!(
                    "no version of '{}' is known",
                    id.name()
                )));
            }
            let cancel = CancellationToken::new();
            let outcome = VersionSearch::new(&builder, &SilentProgress, &cancel).find_working(
                id.name(),
                &namespace,
                &versions,
                &mut cache,
            )?;
            let failures = outcome
                .failures
                .into_iter()
                .map(|(version, e)| (id.with_version(version), e))
                .collect();
            (outcome.working, failures)
        }
    };

    if args.json {
        let output = json!({
            "extension": id.to_string(),
            "namespace": namespace,
            "installable": plan.is_some(),
            "plan": plan.as_ref().map(node_json),
            "install_order": plan.as_ref().map(|p| {
                p.install_order().iter().map(|n| n.id().to_string()).collect::<Vec<_>>()
            }),
            "rejected": failures
                .iter()
                .map(|(id, e)| json!({ "id": id.to_string(), "reason": e.to_string() }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_plan(plan.as_ref(), &failures, &namespace);
    }

    match plan {
        Some(_) => Ok(()),
        None => Err(CliError::user(format!(
            "'{id}' cannot be installed in {namespace}"
        ))),
    }
}

fn node_json(node: &PlanNode) -> Value {
    json!({
        "id": node.id().to_string(),
        "action": node.action().to_string(),
        "children": node.children().iter().map(node_json).collect::<Vec<_>>(),
    })
}

fn print_plan(plan: Option<&PlanNode>, failures: &[(ExtensionId, InstallError)], namespace: &Namespace) {
    for (id, error) in failures {
        println!(
            "{} {}: {}",
            "Rejected".red().bold(),
            id.to_string().yellow(),
            error
        );
    }

    let Some(plan) = plan else {
        return;
    };

    if !failures.is_empty() {
        println!();
    }
    println!(
        "{} {} in {}",
        "Plan".blue().bold(),
        plan.id().to_string().bold(),
        namespace.to_string().yellow()
    );
    println!();
    print!("{plan}");

    let order = plan.install_order();
    println!();
    if order.is_empty() {
        println!("{} Everything is already installed.", "OK".green().bold());
        return;
    }
    println!("{}", "Install order:".bold());
    for (i, node) in order.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, node.id().to_string().green(), node.action());
    }
}
