//! Installation plan trees.
//!
//! A [`PlanNode`] says "install this extension in this namespace" once all
//! of its mandatory dependencies have themselves resolved to nodes. Nodes
//! are built bottom-up and never modified afterwards. A tree never contains
//! the same extension name twice on any root-to-leaf path.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use planner_model::{Extension, ExtensionId, Namespace, Version};

/// What the installer has to do for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    /// Fresh installation.
    Install,
    /// Replace the version already installed in the namespace.
    Upgrade { from: Version },
    /// Already satisfied by an installed or core extension.
    None,
}

impl PlanAction {
    pub fn requires_install(&self) -> bool {
        !matches!(self, PlanAction::None)
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanAction::Install => f.write_str("install"),
            PlanAction::Upgrade { from } => write!(f, "upgrade from {from}"),
            PlanAction::None => f.write_str("satisfied"),
        }
    }
}

/// One extension of a plan tree together with its resolved dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
    extension: Arc<Extension>,
    namespace: Namespace,
    action: PlanAction,
    children: Vec<PlanNode>,
}

impl PlanNode {
    pub fn new(
        extension: Arc<Extension>,
        namespace: Namespace,
        action: PlanAction,
        children: Vec<PlanNode>,
    ) -> Self {
        Self {
            extension,
            namespace,
            action,
            children,
        }
    }

    /// A leaf for a dependency that needs no installation.
    pub fn satisfied(extension: Arc<Extension>, namespace: Namespace) -> Self {
        Self::new(extension, namespace, PlanAction::None, Vec::new())
    }

    pub fn extension(&self) -> &Arc<Extension> {
        &self.extension
    }

    pub fn id(&self) -> ExtensionId {
        self.extension.id()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn action(&self) -> &PlanAction {
        &self.action
    }

    /// Resolved dependencies, in declaration order.
    pub fn children(&self) -> &[PlanNode] {
        &self.children
    }

    /// Every extension name in this subtree.
    pub fn names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        names.insert(self.extension.name.as_str());
        for child in &self.children {
            child.collect_names(names);
        }
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.extension.name == name || self.children.iter().any(|c| c.contains_name(name))
    }

    /// Number of nodes in the subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(PlanNode::node_count).sum::<usize>()
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(PlanNode::depth).max().unwrap_or(0)
    }

    /// Nodes needing work, dependencies first.
    ///
    /// A name shared by several subtrees appears once, at its first
    /// position in post-order.
    pub fn install_order(&self) -> Vec<&PlanNode> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        self.post_order(&mut seen, &mut order);
        order
    }

    fn post_order<'a>(&'a self, seen: &mut BTreeSet<&'a str>, order: &mut Vec<&'a PlanNode>) {
        for child in &self.children {
            child.post_order(seen, order);
        }
        if self.action.requires_install() && seen.insert(self.extension.name.as_str()) {
            order.push(self);
        }
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, prefix: &str, last: bool, root: bool) -> fmt::Result {
        let (branch, indent) = match (root, last) {
            (true, _) => ("", ""),
            (false, true) => ("└── ", "    "),
            (false, false) => ("├── ", "│   "),
        };
        writeln!(f, "{prefix}{branch}{} [{}]", self.extension, self.action)?;

        let child_prefix = format!("{prefix}{indent}");
        for (i, child) in self.children.iter().enumerate() {
            child.fmt_tree(f, &child_prefix, i + 1 == self.children.len(), false)?;
        }
        Ok(())
    }
}

/// Renders the tree with box-drawing branches, one node per line.
impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, "", true, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(name: &str, action: PlanAction, children: Vec<PlanNode>) -> PlanNode {
        PlanNode::new(
            Arc::new(Extension::new(name, Version::new(1, 0, 0))),
            Namespace::new("wiki"),
            action,
            children,
        )
    }

    fn sample() -> PlanNode {
        node(
            "flavor",
            PlanAction::Install,
            vec![
                node(
                    "ui-kit",
                    PlanAction::Install,
                    vec![node("icons", PlanAction::Install, vec![])],
                ),
                node(
                    "search",
                    PlanAction::Upgrade {
                        from: Version::new(0, 9, 0),
                    },
                    vec![node("icons", PlanAction::Install, vec![])],
                ),
                node("platform", PlanAction::None, vec![]),
            ],
        )
    }

    #[test]
    fn test_tree_metrics() {
        let plan = sample();
        assert_eq!(plan.node_count(), 6);
        assert_eq!(plan.depth(), 3);
        assert!(plan.contains_name("icons"));
        assert!(!plan.contains_name("missing"));
        assert_eq!(
            plan.names().into_iter().collect::<Vec<_>>(),
            vec!["flavor", "icons", "platform", "search", "ui-kit"]
        );
    }

    #[test]
    fn test_install_order_is_dependency_first() {
        let plan = sample();
        let order: Vec<String> = plan
            .install_order()
            .iter()
            .map(|n| n.extension().name.clone())
            .collect();
        assert_eq!(order, vec!["icons", "ui-kit", "search", "flavor"]);
    }

    #[test]
    fn test_display_tree() {
        let rendered = sample().to_string();
        let expected = "\
flavor@1.0.0 [install]
├── ui-kit@1.0.0 [install]
│   └── icons@1.0.0 [install]
├── search@1.0.0 [upgrade from 0.9.0]
│   └── icons@1.0.0 [install]
└── platform@1.0.0 [satisfied]
";
        assert_eq!(rendered, expected);
    }
}
