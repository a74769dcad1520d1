//! Rule accumulation and the frozen lookup table built from it.

use super::{MappingRule, SignatureKey};
use std::collections::HashMap;
use std::sync::Arc;

/// Rules in registration order.
///
/// A `RuleSet` is the mutable accumulation phase. Duplicate keys are kept
/// until [`freeze`](Self::freeze), where the last registration wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<MappingRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: MappingRule) -> &mut Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = MappingRule>) -> &mut Self {
        self.rules.extend(rules.into_iter().map(Arc::new));
        self
    }

    /// Snapshot of the registered rules, duplicates included.
    pub fn rules(&self) -> Vec<Arc<MappingRule>> {
        self.rules.clone()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Build the read-only lookup table.
    pub fn freeze(&self) -> FrozenRuleSet {
        let mut by_key: HashMap<SignatureKey, Arc<MappingRule>> =
            HashMap::with_capacity(self.rules.len());
        for rule in &self.rules {
            let key = rule.key();
            if let Some(replaced) = by_key.insert(key.clone(), Arc::clone(rule)) {
                tracing::warn!(
                    key = %key,
                    replaced = %format_args!("{}::{}", replaced.target_type().name(), replaced.target_name()),
                    by = %format_args!("{}::{}", rule.target_type().name(), rule.target_name()),
                    "rule overrides an earlier registration"
                );
            }
        }
        FrozenRuleSet { by_key }
    }
}

impl FromIterator<MappingRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = MappingRule>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Immutable key → rule table. Safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct FrozenRuleSet {
    by_key: HashMap<SignatureKey, Arc<MappingRule>>,
}

impl FrozenRuleSet {
    pub fn get(&self, key: &SignatureKey) -> Option<&Arc<MappingRule>> {
        self.by_key.get(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&SignatureKey> {
        let mut keys: Vec<_> = self.by_key.keys().collect();
        keys.sort();
        keys
    }

    /// Snapshot of the effective rules, sorted by key.
    pub fn rules(&self) -> Vec<Arc<MappingRule>> {
        let mut entries: Vec<_> = self.by_key.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, rule)| Arc::clone(rule)).collect()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
