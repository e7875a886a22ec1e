//! Namespace eligibility checks.

use planner_model::{AllowedNamespaces, Namespace};

/// Decides whether a namespace restriction admits a namespace.
pub trait NamespaceChecker: Send + Sync {
    fn is_allowed(&self, allowed: &AllowedNamespaces, namespace: &Namespace) -> bool;
}

/// Matches namespaces against the restriction's own patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNamespaceChecker;

impl NamespaceChecker for DefaultNamespaceChecker {
    fn is_allowed(&self, allowed: &AllowedNamespaces, namespace: &Namespace) -> bool {
        allowed.allows(namespace)
    }
}
