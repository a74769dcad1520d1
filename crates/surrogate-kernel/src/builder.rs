//! Global-variant assembly.

use crate::contract::Contract;
use crate::dispatch::{DispatchConfig, Equality, GlobalDispatcher};
use crate::factory::{DynamicSurrogateFactory, FromSurrogate, Surrogate, SurrogateFactory};
use crate::rule::{MappingRule, RuleSet};
use std::fmt;
use std::sync::Arc;

/// Accumulates rules for one contract and builds dispatchers from them.
///
/// Accumulation takes `&mut self`; share a builder across threads only
/// behind external synchronization. Every `build*` call snapshots the rules
/// registered so far, so a builder can keep growing between builds without
/// affecting surrogates already produced.
pub struct RuleBuilder {
    contract: Arc<Contract>,
    rules: RuleSet,
    equality: Option<Arc<dyn Equality>>,
    config: DispatchConfig,
}

impl RuleBuilder {
    pub fn new(contract: Arc<Contract>) -> Self {
        Self {
            contract,
            rules: RuleSet::new(),
            equality: None,
            config: DispatchConfig::default(),
        }
    }

    pub fn contract(&self) -> &Arc<Contract> {
        &self.contract
    }

    pub fn add(&mut self, rule: MappingRule) -> &mut Self {
        self.rules.add(rule);
        self
    }

    pub fn add_all(&mut self, rules: impl IntoIterator<Item = MappingRule>) -> &mut Self {
        self.rules.extend(rules);
        self
    }

    /// Set or replace the strategy answering unmapped `equals`.
    pub fn equality(&mut self, equality: impl Equality + 'static) -> &mut Self {
        self.equality = Some(Arc::new(equality));
        self
    }

    pub fn config(&mut self, config: DispatchConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Snapshot of the rules registered so far, in registration order.
    pub fn rules(&self) -> Vec<Arc<MappingRule>> {
        self.rules.rules()
    }

    /// Freeze the current rules into a new dispatcher.
    pub fn build(&self) -> GlobalDispatcher {
        let frozen = self.rules.freeze();
        tracing::debug!(
            contract = self.contract.name(),
            registered = self.rules.len(),
            effective = frozen.len(),
            "rule table frozen"
        );
        let mut dispatcher = GlobalDispatcher::new(Arc::new(frozen)).with_config(self.config.clone());
        if let Some(equality) = &self.equality {
            dispatcher = dispatcher.with_equality(Arc::clone(equality));
        }
        dispatcher
    }

    pub fn build_instance(&self) -> Surrogate {
        self.build_instance_with(&DynamicSurrogateFactory)
    }

    pub fn build_instance_with<F: SurrogateFactory>(&self, factory: &F) -> F::Output {
        factory.create(Arc::clone(&self.contract), Arc::new(self.build()))
    }

    /// Build a surrogate and wrap it in a typed facade.
    pub fn build_instance_as<W: FromSurrogate>(&self) -> W {
        W::from_surrogate(self.build_instance())
    }
}

impl fmt::Debug for RuleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBuilder")
            .field("contract", &self.contract.name())
            .field("rules", &self.rules.len())
            .field("equality", &self.equality.is_some())
            .field("config", &self.config)
            .finish()
    }
}
