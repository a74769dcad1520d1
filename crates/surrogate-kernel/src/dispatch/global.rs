//! Multi-target dispatcher over a frozen rule table.

use super::redirect::Redirect;
use super::{
    Dispatch, DispatchConfig, DispatchError, DispatchResult, Equality, Invocation, UnmappedPolicy,
    answer_default,
};
use crate::rule::FrozenRuleSet;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

const DEFAULT_DESCRIPTION: &str = "Surrogate[multi-target mapping]";

/// Dispatcher of the global variant.
///
/// Cloning is cheap and clones share the same frozen rules.
#[derive(Clone)]
pub struct GlobalDispatcher {
    rules: Arc<FrozenRuleSet>,
    equality: Option<Arc<dyn Equality>>,
    config: DispatchConfig,
}

impl GlobalDispatcher {
    pub fn new(rules: Arc<FrozenRuleSet>) -> Self {
        Self {
            rules,
            equality: None,
            config: DispatchConfig::default(),
        }
    }

    pub fn with_equality(mut self, equality: Arc<dyn Equality>) -> Self {
        self.equality = Some(equality);
        self
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rules(&self) -> &Arc<FrozenRuleSet> {
        &self.rules
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn has_equality(&self) -> bool {
        self.equality.is_some()
    }
}

impl Dispatch for GlobalDispatcher {
    fn dispatch(&self, call: Invocation<'_>) -> DispatchResult<Value> {
        let sig = call.member.sig();
        let key = sig.key();

        if let Some(rule) = self.rules.get(&key) {
            tracing::debug!(
                member = %sig,
                key = %key,
                kind = %rule.kind(),
                target = %format_args!("{}::{}", rule.target_type().name(), rule.target_name()),
                "dispatching mapped member"
            );
            return Redirect::from(rule.as_ref()).run(sig.params(), call.args);
        }

        if let Some(value) = answer_default(&call, self.equality.as_deref(), || self.describe()) {
            tracing::debug!(member = %sig, "answered default member");
            return Ok(value);
        }

        match self.config.unmapped {
            UnmappedPolicy::Unit => {
                tracing::warn!(member = %sig, key = %key, "no rule for member, returning unit");
                Ok(Value::Unit)
            }
            UnmappedPolicy::Fail => Err(DispatchError::UnmappedMember {
                member: sig.to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        self.config
            .description
            .clone()
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string())
    }
}

impl fmt::Debug for GlobalDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalDispatcher")
            .field("rules", &self.rules.keys())
            .field("equality", &self.equality.is_some())
            .field("config", &self.config)
            .finish()
    }
}
