//! Per-run memo of dependency validity.
//!
//! Keys are a dependency (with the constraint actually used, after any
//! recommended override) and the target namespace. Entries are written
//! once per key; a later write for the same key is ignored. A cache must
//! never outlive the job run that created it, since validity depends on the
//! namespace and on the repository contents at that time.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use planner_model::{ExtensionDependency, Namespace};

use crate::plan::PlanNode;

/// What is known about a dependency in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Unknown,
    Valid,
    Invalid,
}

#[derive(Debug, Clone)]
enum Memo {
    Valid(PlanNode),
    Invalid,
}

type Key = (ExtensionDependency, Namespace);

#[derive(Debug, Default)]
pub struct ValidationCache {
    entries: HashMap<Key, Memo>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcome(&self, dependency: &ExtensionDependency, namespace: &Namespace) -> ValidationOutcome {
        match self.get(dependency, namespace) {
            Some(Memo::Valid(_)) => ValidationOutcome::Valid,
            Some(Memo::Invalid) => ValidationOutcome::Invalid,
            None => ValidationOutcome::Unknown,
        }
    }

    /// The plan recorded for a valid dependency.
    pub fn valid_plan(&self, dependency: &ExtensionDependency, namespace: &Namespace) -> Option<&PlanNode> {
        match self.get(dependency, namespace) {
            Some(Memo::Valid(plan)) => Some(plan),
            _ => None,
        }
    }

    /// Record a successful resolution. Returns `false` if the key was
    /// already known.
    pub fn record_valid(&mut self, dependency: ExtensionDependency, namespace: Namespace, plan: PlanNode) -> bool {
        self.record((dependency, namespace), Memo::Valid(plan))
    }

    /// Record a failed resolution. Returns `false` if the key was already
    /// known.
    pub fn record_invalid(&mut self, dependency: ExtensionDependency, namespace: Namespace) -> bool {
        self.record((dependency, namespace), Memo::Invalid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, dependency: &ExtensionDependency, namespace: &Namespace) -> Option<&Memo> {
        // Keys are owned tuples; lookups clone the two small values.
        self.entries.get(&(dependency.clone(), namespace.clone()))
    }

    fn record(&mut self, key: Key, memo: Memo) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(existing) => {
                tracing::trace!(dependency = %existing.key().0, "Validation outcome already recorded");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(memo);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use planner_model::{Extension, Version, VersionConstraint};

    use super::*;

    fn dep(constraint: &str) -> ExtensionDependency {
        ExtensionDependency::new("ui-kit", VersionConstraint::parse(constraint).unwrap())
    }

    fn plan() -> PlanNode {
        PlanNode::satisfied(
            Arc::new(Extension::new("ui-kit", Version::new(1, 0, 0))),
            Namespace::new("wiki"),
        )
    }

    #[test]
    fn test_unknown_until_recorded() {
        let mut cache = ValidationCache::new();
        let ns = Namespace::new("wiki");
        assert_eq!(cache.outcome(&dep(">=1.0"), &ns), ValidationOutcome::Unknown);

        assert!(cache.record_valid(dep(">=1.0"), ns.clone(), plan()));
        assert_eq!(cache.outcome(&dep(">=1.0"), &ns), ValidationOutcome::Valid);
        assert_eq!(cache.valid_plan(&dep(">=1.0"), &ns), Some(&plan()));
    }

    #[test]
    fn test_write_once() {
        let mut cache = ValidationCache::new();
        let ns = Namespace::new("wiki");
        assert!(cache.record_invalid(dep(">=1.0"), ns.clone()));
        assert!(!cache.record_valid(dep(">=1.0"), ns.clone(), plan()));
        assert_eq!(cache.outcome(&dep(">=1.0"), &ns), ValidationOutcome::Invalid);
        assert!(cache.valid_plan(&dep(">=1.0"), &ns).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_includes_constraint_and_namespace() {
        let mut cache = ValidationCache::new();
        cache.record_invalid(dep(">=1.0"), Namespace::new("wikiA"));

        assert_eq!(
            cache.outcome(&dep(">=1.0"), &Namespace::new("wikiB")),
            ValidationOutcome::Unknown
        );
        assert_eq!(
            cache.outcome(&dep("==1.4.0"), &Namespace::new("wikiA")),
            ValidationOutcome::Unknown
        );
        // Equivalent spellings share an entry.
        assert_eq!(
            cache.outcome(&dep(">= 1.0.0"), &Namespace::new("wikiA")),
            ValidationOutcome::Invalid
        );
    }
}
