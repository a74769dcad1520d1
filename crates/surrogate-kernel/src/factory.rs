//! Producing live surrogates from a contract and a dispatcher.
//!
//! ```rust,ignore
//! use surrogate_kernel::factory;
//!
//! // single target, rules tagged on the contract
//! let thermostat = factory::declared(contract, thermostat_type, source)?;
//! let celsius: f64 = thermostat.call("temperature", &[])?;
//!
//! // several targets stitched together by external rules
//! let mut builder = factory::configured(contract);
//! builder.add(count_rule).add(max_rule);
//! let surrogate = builder.build_instance();
//! ```

use crate::builder::RuleBuilder;
use crate::contract::{Contract, EQUALS, OverloadError, TO_STRING};
use crate::dispatch::{DeclaredDispatcher, Dispatch, DispatchError, DispatchResult, Invocation};
use crate::reflect::TargetType;
use crate::value::{FromValue, ObjectRef, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FactoryError {
    #[error("contract {0} names no mapped class")]
    NoMappedClass(String),

    #[error("mapped class {0} has no default constructor")]
    NotInstantiable(String),

    #[error("source of type {found} is not described by {expected}")]
    SourceMismatch {
        expected: String,
        found: &'static str,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Factory contract
// ─────────────────────────────────────────────────────────────────────────────

/// Yields an object conforming to `contract` whose every member invocation
/// is forwarded to `dispatcher`.
pub trait SurrogateFactory {
    type Output;

    fn create(&self, contract: Arc<Contract>, dispatcher: Arc<dyn Dispatch>) -> Self::Output;
}

/// Factory producing dynamically invoked [`Surrogate`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicSurrogateFactory;

impl SurrogateFactory for DynamicSurrogateFactory {
    type Output = Surrogate;

    fn create(&self, contract: Arc<Contract>, dispatcher: Arc<dyn Dispatch>) -> Surrogate {
        tracing::debug!(contract = contract.name(), "surrogate created");
        Surrogate {
            core: Arc::new(SurrogateCore {
                contract,
                dispatcher,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Surrogate
// ─────────────────────────────────────────────────────────────────────────────

struct SurrogateCore {
    contract: Arc<Contract>,
    dispatcher: Arc<dyn Dispatch>,
}

/// A live object of some contract.
///
/// Clones are the same surrogate: they share identity, so `equals` under the
/// identity fallback holds between them.
#[derive(Clone)]
pub struct Surrogate {
    core: Arc<SurrogateCore>,
}

impl Surrogate {
    pub fn contract(&self) -> &Arc<Contract> {
        &self.core.contract
    }

    /// Invoke member `name` with `args`.
    ///
    /// The contract member is the overload that fits `args` most closely.
    pub fn invoke(&self, name: &str, args: &[Value]) -> DispatchResult<Value> {
        let contract = &self.core.contract;
        let member = contract.resolve(name, args).map_err(|err| match err {
            OverloadError::Ambiguous { candidates, .. } => DispatchError::AmbiguousCall {
                contract: contract.name().to_string(),
                member: name.to_string(),
                candidates,
            },
            _ => DispatchError::NotInContract {
                contract: contract.name().to_string(),
                member: name.to_string(),
            },
        })?;
        let receiver = self.identity();
        self.core
            .dispatcher
            .dispatch(Invocation::new(&receiver, member, args))
    }

    /// Invoke and convert the result.
    pub fn call<T: FromValue>(&self, name: &str, args: &[Value]) -> DispatchResult<T> {
        Ok(self.invoke(name, args)?.extract()?)
    }

    /// Dispatch the `equals` member against `other`.
    pub fn equals(&self, other: impl Into<Value>) -> DispatchResult<bool> {
        self.call(EQUALS, &[other.into()])
    }

    /// The surrogate as an object reference sharing its identity.
    pub fn identity(&self) -> ObjectRef {
        ObjectRef::from_arc(Arc::clone(&self.core))
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.identity())
    }

    /// Recover a surrogate passed around as an object value.
    pub fn from_object(obj: &ObjectRef) -> Option<Self> {
        obj.downcast_arc::<SurrogateCore>()
            .map(|core| Self { core })
    }

    pub fn ptr_eq(&self, other: &Surrogate) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    /// Description the dispatcher gives for an unmapped `to_string()`.
    pub fn describe(&self) -> String {
        self.core.dispatcher.describe()
    }
}

impl fmt::Display for Surrogate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.invoke(TO_STRING, &[]) {
            Ok(Value::Str(text)) => f.write_str(&text),
            Ok(other) => write!(f, "{other}"),
            Err(err) => {
                tracing::warn!(error = %err, "to_string dispatch failed");
                f.write_str(&self.describe())
            }
        }
    }
}

impl fmt::Debug for Surrogate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surrogate")
            .field("contract", &self.core.contract.name())
            .field("dispatcher", &self.core.dispatcher.describe())
            .finish()
    }
}

impl From<Surrogate> for Value {
    fn from(s: Surrogate) -> Self {
        s.as_value()
    }
}

/// Typed wrappers constructed around a surrogate.
pub trait FromSurrogate: Sized {
    fn from_surrogate(surrogate: Surrogate) -> Self;
}

impl FromSurrogate for Surrogate {
    fn from_surrogate(surrogate: Surrogate) -> Self {
        surrogate
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Declared-variant surrogate backed by `source`.
pub fn declared(
    contract: Arc<Contract>,
    source_type: Arc<TargetType>,
    source: ObjectRef,
) -> Result<Surrogate, FactoryError> {
    if !source_type.describes(&source) {
        return Err(FactoryError::SourceMismatch {
            expected: source_type.name().to_string(),
            found: source.type_name(),
        });
    }
    let dispatcher = DeclaredDispatcher::new(source_type, source);
    Ok(DynamicSurrogateFactory.create(contract, Arc::new(dispatcher)))
}

/// Declared-variant surrogate backed by a fresh instance of the contract's
/// mapped class.
pub fn declared_from_mapped_class(contract: Arc<Contract>) -> Result<Surrogate, FactoryError> {
    let ty = contract
        .mapped_class()
        .cloned()
        .ok_or_else(|| FactoryError::NoMappedClass(contract.name().to_string()))?;
    let source = ty
        .instantiate()
        .ok_or_else(|| FactoryError::NotInstantiable(ty.name().to_string()))?;
    declared(contract, ty, source)
}

/// Start assembling a global-variant surrogate.
pub fn configured(contract: Arc<Contract>) -> RuleBuilder {
    RuleBuilder::new(contract)
}
