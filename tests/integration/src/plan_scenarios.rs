//! Plan trees and version search over realistic dependency graphs

use planner_core::{
    CancellationToken, InstallError, PlanAction, PlanNode, PlanTreeBuilder, RecordingProgress,
    ResolverConfig, ValidationCache, VersionSearch,
};
use planner_model::{ExtensionId, Version};
use planner_repository::{DefaultNamespaceChecker, VersionCatalog};
use planner_test_utils::{FakeRepository, ext, ns, version};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn plan(
    repository: &FakeRepository,
    config: &ResolverConfig,
    id: &str,
    namespace: &str,
) -> Result<PlanNode, InstallError> {
    let builder = PlanTreeBuilder::new(repository, &DefaultNamespaceChecker, config);
    builder.build_root(
        &ExtensionId::parse(id).unwrap(),
        &ns(namespace),
        &mut ValidationCache::new(),
    )
}

fn order(plan: &PlanNode) -> Vec<String> {
    plan.install_order().iter().map(|n| n.id().to_string()).collect()
}

/// A small site: a flavor on top of a UI kit, a search engine and the
/// platform API, with a shared icon set.
fn site() -> FakeRepository {
    FakeRepository::new()
        .remote(
            ext("site-flavor", "2.0")
                .flavor()
                .dep("ui-kit", ">=1.2")
                .dep("search", "*")
                .dep("platform-api", ">=15.0"),
        )
        .remote(ext("ui-kit", "1.4").dep("icons", ">=1.0"))
        .remote(ext("ui-kit", "1.2").dep("icons", ">=1.0"))
        .local(ext("ui-kit", "1.0"))
        .remote(ext("search", "3.0").dep("icons", "*"))
        .remote(ext("icons", "1.1"))
        .core(ext("platform-api", "15.2"))
}

// =============================================================================
// Plan shape
// =============================================================================

#[test]
fn test_diamond_is_installed_once_dependencies_first() {
    let plan = plan(&site(), &ResolverConfig::default(), "site-flavor@2.0", "wiki").unwrap();

    assert_eq!(
        order(&plan),
        vec!["icons@1.1.0", "ui-kit@1.4.0", "search@3.0.0", "site-flavor@2.0.0"]
    );
    assert_eq!(plan.node_count(), 6);
    assert_eq!(plan.depth(), 3);
    assert_eq!(plan.children()[2].action(), &PlanAction::None);
}

#[test]
fn test_installed_dependencies_are_upgraded_or_kept() {
    let repository = site()
        .installed("wiki", "ui-kit", "1.0")
        .installed("wiki", "icons", "1.1");
    let plan = plan(&repository, &ResolverConfig::default(), "site-flavor@2.0", "wiki").unwrap();

    let ui_kit = &plan.children()[0];
    assert_eq!(ui_kit.id().to_string(), "ui-kit@1.4.0");
    assert_eq!(ui_kit.action(), &PlanAction::Upgrade { from: version("1.0") });
    assert_eq!(ui_kit.children()[0].action(), &PlanAction::None);
    assert_eq!(order(&plan), vec!["ui-kit@1.4.0", "search@3.0.0", "site-flavor@2.0.0"]);
}

#[test]
fn test_recommended_constraint_pins_dependency() {
    let config = ResolverConfig::default()
        .with_recommended("ui-kit", "==1.2.0".parse().unwrap());
    let plan = plan(&site(), &config, "site-flavor@2.0", "wiki").unwrap();

    assert_eq!(plan.children()[0].id().to_string(), "ui-kit@1.2.0");
}

#[test]
fn test_incompatible_core_extension() {
    let repository = site().remote(ext("legacy", "1.0").dep("platform-api", "<15.0"));
    let err = plan(&repository, &ResolverConfig::default(), "legacy@1.0", "wiki").unwrap_err();

    assert!(matches!(err, InstallError::IncompatibleCoreExtension { ref core_version, .. } if *core_version == version("15.2")));
}

#[rstest]
#[case::allowed("wiki:main", true)]
#[case::refused("blog", false)]
fn test_transitive_namespace_restriction(#[case] namespace: &str, #[case] installable: bool) {
    let repository = FakeRepository::new()
        .remote(ext("flavor", "1.0").dep("wiki-only", "*"))
        .remote(ext("wiki-only", "1.0").namespaces(&["re:^wiki:"]));

    let result = plan(&repository, &ResolverConfig::default(), "flavor@1.0", namespace);
    assert_eq!(result.is_ok(), installable);
    if let Err(e) = result {
        assert!(matches!(e, InstallError::NamespaceNotAllowed { .. }));
    }
}

#[test]
fn test_all_sibling_failures_are_reported() {
    let repository = FakeRepository::new()
        .remote(ext("flavor", "1.0").dep("gone", "*").dep("icons", ">=9.0").dep("ok", "*"))
        .remote(ext("icons", "1.0"))
        .remote(ext("ok", "1.0"));
    let config = ResolverConfig::default().with_abort_on_first_failure(false);

    match plan(&repository, &config, "flavor@1.0", "wiki").unwrap_err() {
        InstallError::DependenciesFailed { extension, failures } => {
            assert_eq!(extension.to_string(), "flavor@1.0.0");
            assert_eq!(failures.len(), 2);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_long_chain_resolves() {
    let repository = FakeRepository::new()
        .remotes((0..100).map(|i| ext(&format!("e{i}"), "1.0").dep(&format!("e{}", i + 1), "*")))
        .remote(ext("e100", "1.0"));

    let plan = plan(&repository, &ResolverConfig::default(), "e0@1.0", "wiki").unwrap();
    assert_eq!(plan.depth(), 101);
    assert_eq!(order(&plan).first().map(String::as_str), Some("e100@1.0.0"));
}

// =============================================================================
// Version search
// =============================================================================

#[test]
fn test_search_falls_back_to_older_version() {
    let repository = site()
        .remote(ext("site-flavor", "3.0").flavor().dep("ui-kit", ">=5.0"))
        .remote(ext("site-flavor", "2.5").flavor().dep("platform-api", ">=16.0"));
    let config = ResolverConfig::default();
    let builder = PlanTreeBuilder::new(&repository, &DefaultNamespaceChecker, &config);
    let progress = RecordingProgress::new();
    let cancel = CancellationToken::new();

    let versions: Vec<Version> = VersionCatalog::new(&repository).descending("site-flavor");
    let outcome = VersionSearch::new(&builder, &progress, &cancel)
        .find_working("site-flavor", &ns("wiki"), &versions, &mut ValidationCache::new())
        .unwrap();

    assert_eq!(outcome.extension().map(|e| e.version.clone()), Some(version("2.0")));
    assert_eq!(outcome.attempts(), 3);
    assert_eq!(progress.open_levels(), 0);
    assert_eq!(repository.clear_calls(), 3);
}
