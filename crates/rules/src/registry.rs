//! Rule lookup by identifier.

use std::collections::HashMap;
use std::sync::Arc;

use docrules_core::RuleId;

use crate::rule::DocumentRule;

/// Resolves rule identifiers to live rule instances.
///
/// The registry is injected into both the dispatcher and the job bridge; it
/// is keyed by the same identifiers used in folder configuration. `None` is
/// an ordinary outcome (a typo or an uninstalled plugin) and makes the
/// request a skip, not a failure.
pub trait RuleRegistry: Send + Sync {
    fn resolve(&self, rule_id: &RuleId) -> Option<Arc<dyn DocumentRule>>;
}

impl<R> RuleRegistry for Arc<R>
where
    R: RuleRegistry + ?Sized,
{
    fn resolve(&self, rule_id: &RuleId) -> Option<Arc<dyn DocumentRule>> {
        (**self).resolve(rule_id)
    }
}

/// Map-backed registry, populated at wiring time.
#[derive(Default, Clone)]
pub struct StaticRuleRegistry {
    rules: HashMap<RuleId, Arc<dyn DocumentRule>>,
}

impl StaticRuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule under `rule_id`, replacing any previous binding.
    pub fn register(&mut self, rule_id: impl Into<RuleId>, rule: Arc<dyn DocumentRule>) {
        self.rules.insert(rule_id.into(), rule);
    }

    pub fn with_rule(mut self, rule_id: impl Into<RuleId>, rule: Arc<dyn DocumentRule>) -> Self {
        self.register(rule_id, rule);
        self
    }

    pub fn contains(&self, rule_id: &RuleId) -> bool {
        self.rules.contains_key(rule_id)
    }

    /// Registered identifiers, sorted.
    pub fn rule_ids(&self) -> Vec<RuleId> {
        let mut ids: Vec<_> = self.rules.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleRegistry for StaticRuleRegistry {
    fn resolve(&self, rule_id: &RuleId) -> Option<Arc<dyn DocumentRule>> {
        self.rules.get(rule_id).cloned()
    }
}

impl core::fmt::Debug for StaticRuleRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StaticRuleRegistry")
            .field("rules", &self.rule_ids())
            .finish()
    }
}
