//! Mapping rules: one surrogate member redirected to one target member.
//!
//! A [`MappingRule`] is immutable once built. Building validates only the
//! rule's structure; whether `target_name` really exists on the target type
//! is checked the first time the rule is dispatched, so rules may be written
//! against targets in any order.
//!
//! ```rust,ignore
//! use surrogate_kernel::rule::MappingRule;
//!
//! // surrogate `count()` reads field `total` of `counter`
//! let count = MappingRule::field("count", "total")
//!     .bind(&counter_type, counter.clone())
//!     .build()?;
//!
//! // surrogate `max()` calls static `max(i64, i64)` with fixed arguments
//! let max = MappingRule::method("max", "max")
//!     .on(&math_type)
//!     .static_access()
//!     .explicit_param_types(vec![ParamType::Int, ParamType::Int])
//!     .explicit_args(vec![Value::Int(3), Value::Int(7)])
//!     .build()?;
//! ```

pub mod error;
pub mod key;
pub mod set;

pub use error::RuleError;
pub use key::SignatureKey;
pub use set::{FrozenRuleSet, RuleSet};

use crate::reflect::{MemberKind, TargetType};
use crate::value::{ObjectRef, ParamType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Access flags
// ─────────────────────────────────────────────────────────────────────────────

/// Access modifiers of a rule's target.
///
/// Only [`AccessFlags::STATIC`] changes dispatch: a static target is resolved
/// against the target type and never consults a bound instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessFlags(u16);

impl AccessFlags {
    pub const INSTANCE: Self = Self(0);
    pub const STATIC: Self = Self(0x0008);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }
}

impl BitOr for AccessFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MappingRule
// ─────────────────────────────────────────────────────────────────────────────

/// A single redirect from a surrogate member to a target field or method.
#[derive(Clone)]
pub struct MappingRule {
    surrogate_name: String,
    surrogate_signature: Vec<ParamType>,
    target_name: String,
    kind: MemberKind,
    access: AccessFlags,
    declared_only: bool,
    target_type: Arc<TargetType>,
    target_instance: Option<ObjectRef>,
    explicit_param_types: Option<Vec<ParamType>>,
    explicit_args: Option<Vec<Value>>,
}

impl MappingRule {
    /// Rule reading field `target` for the zero-argument surrogate member `surrogate`.
    pub fn field(surrogate: impl Into<String>, target: impl Into<String>) -> MappingRuleBuilder {
        MappingRuleBuilder::new(surrogate.into(), target.into(), MemberKind::Field)
    }

    /// Rule calling method `target` for the surrogate member `surrogate`.
    pub fn method(surrogate: impl Into<String>, target: impl Into<String>) -> MappingRuleBuilder {
        MappingRuleBuilder::new(surrogate.into(), target.into(), MemberKind::Method)
    }

    pub fn surrogate_name(&self) -> &str {
        &self.surrogate_name
    }

    pub fn surrogate_signature(&self) -> &[ParamType] {
        &self.surrogate_signature
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn access(&self) -> AccessFlags {
        self.access
    }

    pub fn is_static(&self) -> bool {
        self.access.is_static()
    }

    pub fn declared_only(&self) -> bool {
        self.declared_only
    }

    pub fn target_type(&self) -> &Arc<TargetType> {
        &self.target_type
    }

    pub fn target_instance(&self) -> Option<&ObjectRef> {
        self.target_instance.as_ref()
    }

    pub fn explicit_param_types(&self) -> Option<&[ParamType]> {
        self.explicit_param_types.as_deref()
    }

    pub fn explicit_args(&self) -> Option<&[Value]> {
        self.explicit_args.as_deref()
    }

    /// Key this rule is registered under.
    pub fn key(&self) -> SignatureKey {
        match self.kind {
            MemberKind::Field => SignatureKey::for_field(&self.surrogate_name),
            MemberKind::Method => {
                SignatureKey::for_method(&self.surrogate_name, &self.surrogate_signature)
            }
        }
    }

    /// Parameter types used to resolve the target method.
    pub fn effective_param_types<'a>(&'a self, call_site: &'a [ParamType]) -> &'a [ParamType] {
        self.explicit_param_types.as_deref().unwrap_or(call_site)
    }

    /// Arguments passed to the target method.
    pub fn effective_args<'a>(&'a self, call_site: &'a [Value]) -> &'a [Value] {
        self.explicit_args.as_deref().unwrap_or(call_site)
    }
}

impl fmt::Debug for MappingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRule")
            .field("key", &self.key())
            .field("target", &format_args!("{}::{}", self.target_type.name(), self.target_name))
            .field("kind", &self.kind)
            .field("access", &self.access)
            .field("declared_only", &self.declared_only)
            .field("bound", &self.target_instance.is_some())
            .field("explicit_param_types", &self.explicit_param_types)
            .field("explicit_args", &self.explicit_args)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`MappingRule`].
#[derive(Clone)]
pub struct MappingRuleBuilder {
    surrogate_name: String,
    surrogate_signature: Vec<ParamType>,
    target_name: String,
    kind: MemberKind,
    access: AccessFlags,
    declared_only: bool,
    target_type: Option<Arc<TargetType>>,
    target_instance: Option<ObjectRef>,
    explicit_param_types: Option<Vec<ParamType>>,
    explicit_args: Option<Vec<Value>>,
}

impl MappingRuleBuilder {
    fn new(surrogate_name: String, target_name: String, kind: MemberKind) -> Self {
        Self {
            surrogate_name,
            surrogate_signature: Vec::new(),
            target_name,
            kind,
            access: AccessFlags::INSTANCE,
            declared_only: false,
            target_type: None,
            target_instance: None,
            explicit_param_types: None,
            explicit_args: None,
        }
    }

    /// Parameter types of the surrogate member (method rules).
    pub fn signature(mut self, params: Vec<ParamType>) -> Self {
        self.surrogate_signature = params;
        self
    }

    /// Type owning the target member.
    pub fn on(mut self, target_type: &Arc<TargetType>) -> Self {
        self.target_type = Some(Arc::clone(target_type));
        self
    }

    /// Object the redirected access runs against.
    pub fn instance(mut self, instance: ObjectRef) -> Self {
        self.target_instance = Some(instance);
        self
    }

    /// Shorthand for [`on`](Self::on) + [`instance`](Self::instance).
    pub fn bind(self, target_type: &Arc<TargetType>, instance: ObjectRef) -> Self {
        self.on(target_type).instance(instance)
    }

    pub fn access(mut self, access: AccessFlags) -> Self {
        self.access = access;
        self
    }

    pub fn static_access(self) -> Self {
        self.access(AccessFlags::STATIC)
    }

    /// Restrict lookup to the target type's own members, any visibility.
    pub fn declared_only(mut self, declared_only: bool) -> Self {
        self.declared_only = declared_only;
        self
    }

    /// Resolve the target with these types instead of the call-site ones.
    pub fn explicit_param_types(mut self, params: Vec<ParamType>) -> Self {
        self.explicit_param_types = Some(params);
        self
    }

    /// Invoke the target with these arguments instead of the call-site ones.
    pub fn explicit_args(mut self, args: Vec<Value>) -> Self {
        self.explicit_args = Some(args);
        self
    }

    pub fn build(self) -> Result<MappingRule, RuleError> {
        if self.surrogate_name.trim().is_empty() {
            return Err(RuleError::EmptySurrogateName);
        }
        if self.target_name.trim().is_empty() {
            return Err(RuleError::EmptyTargetName(self.surrogate_name));
        }
        let Some(target_type) = self.target_type else {
            return Err(RuleError::MissingTargetType(self.surrogate_name));
        };
        if !self.access.is_static() && self.target_instance.is_none() {
            return Err(RuleError::MissingTargetInstance(self.surrogate_name));
        }
        if self.kind == MemberKind::Field
            && (!self.surrogate_signature.is_empty()
                || self.explicit_param_types.is_some()
                || self.explicit_args.is_some())
        {
            return Err(RuleError::AdaptationOnFieldRule(self.surrogate_name));
        }
        if let (Some(types), Some(args)) = (&self.explicit_param_types, &self.explicit_args) {
            if types.len() != args.len() {
                return Err(RuleError::ExplicitArityMismatch {
                    surrogate: self.surrogate_name,
                    types: types.len(),
                    args: args.len(),
                });
            }
        }

        Ok(MappingRule {
            surrogate_name: self.surrogate_name,
            surrogate_signature: self.surrogate_signature,
            target_name: self.target_name,
            kind: self.kind,
            access: self.access,
            declared_only: self.declared_only,
            target_type,
            target_instance: self.target_instance,
            explicit_param_types: self.explicit_param_types,
            explicit_args: self.explicit_args,
        })
    }
}
