//! The interception routine behind every surrogate.
//!
//! A surrogate forwards each member invocation to a [`Dispatch`]
//! implementation, which looks up the rule for that member and performs the
//! redirected access. Two variants share this contract:
//!
//! - [`GlobalDispatcher`]: rules assembled externally into one frozen table;
//!   each rule carries its own target type and instance.
//! - [`DeclaredDispatcher`]: one shared source object; each contract member
//!   carries its own inline rule.
//!
//! Both answer the default members `to_string()` and `equals(any)` when no
//! rule maps them.

mod declared;
pub mod equality;
mod error;
mod global;
mod redirect;

pub use declared::DeclaredDispatcher;
pub use equality::Equality;
pub use error::{DispatchError, DispatchResult};
pub use global::GlobalDispatcher;

use crate::contract::{ContractMember, DefaultMember};
use crate::value::{ObjectRef, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch contract
// ─────────────────────────────────────────────────────────────────────────────

/// One member invocation as seen by a dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Identity of the surrogate being invoked.
    pub receiver: &'a ObjectRef,
    pub member: &'a ContractMember,
    pub args: &'a [Value],
}

impl<'a> Invocation<'a> {
    pub fn new(receiver: &'a ObjectRef, member: &'a ContractMember, args: &'a [Value]) -> Self {
        Self {
            receiver,
            member,
            args,
        }
    }
}

/// Resolves and executes the rule for an invoked surrogate member.
///
/// Implementations are shared by every clone of a surrogate and may be
/// called from several threads at once.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, call: Invocation<'_>) -> DispatchResult<Value>;

    /// Text returned by an unmapped `to_string()`.
    fn describe(&self) -> String;
}

impl<D: Dispatch + ?Sized> Dispatch for Arc<D> {
    fn dispatch(&self, call: Invocation<'_>) -> DispatchResult<Value> {
        (**self).dispatch(call)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// What the global variant does with a member no rule maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    /// Return [`Value::Unit`].
    #[default]
    Unit,
    /// Fail with [`DispatchError::UnmappedMember`].
    Fail,
}

/// Tunables of the global dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub unmapped: UnmappedPolicy,
    /// Replaces the default `to_string()` text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DispatchConfig {
    pub fn with_unmapped(mut self, policy: UnmappedPolicy) -> Self {
        self.unmapped = policy;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Default members
// ─────────────────────────────────────────────────────────────────────────────

/// Answer an unmapped default member, or `None` if `call` is not one.
pub(crate) fn answer_default(
    call: &Invocation<'_>,
    equality: Option<&dyn Equality>,
    describe: impl FnOnce() -> String,
) -> Option<Value> {
    match call.member.default_member()? {
        DefaultMember::ToString => Some(Value::Str(describe())),
        DefaultMember::Equals => {
            let other = call.args.first().unwrap_or(&Value::Unit);
            let equal = match equality {
                Some(strategy) => strategy.equals(call.receiver, other),
                None => equality::identity(call.receiver, other),
            };
            Some(Value::Bool(equal))
        }
    }
}
