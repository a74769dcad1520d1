//! Reflective access to target types.
//!
//! Rust has no runtime reflection, so every type a rule may point at is
//! described once by a [`TargetType`]: its qualified name, its fields and
//! methods (as closures), and optionally a parent type whose public members it
//! inherits. The dispatch engine only ever talks to targets through this
//! module:
//!
//! ```text
//! resolve (name, kind, declared_only, owner) ──► ResolvedField / ResolvedMethod
//! accessible::force(member)                  ──► AccessGuard (one access only)
//! read / invoke (guard, receiver?, args)     ──► Value | InvokeFailure
//! ```

pub mod accessible;
pub mod lookup;
pub(crate) mod names;
pub mod target_type;

pub use accessible::{AccessGuard, active_overrides};
pub use lookup::{ResolvedField, ResolvedMethod, resolve_field, resolve_method};
pub use target_type::{FieldDef, MemberInfo, MethodDef, TargetType, TargetTypeBuilder};

use crate::value::ParamType;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure raised by a target member itself.
///
/// Dispatch never wraps it; callers downcast it back to the target's own
/// error type.
pub type TargetError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Kind of member a rule redirects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum MemberKind {
    Field,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => write!(f, "field"),
            Self::Method => write!(f, "method"),
        }
    }
}

/// Visibility of a registered member.
///
/// Private members are only reachable through declared-only lookup, and only
/// while an [`AccessGuard`] for them is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

/// Why a target member could not be resolved or called.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolutionFailure {
    #[error("no field '{name}' on {owner}")]
    NoSuchField { owner: String, name: String },

    #[error("no method '{name}({params})' on {owner}")]
    NoSuchMethod {
        owner: String,
        name: String,
        params: String,
    },

    #[error("'{name}' on {owner} is not accessible")]
    Inaccessible { owner: String, name: String },

    #[error("'{name}' needs a receiver but none is bound")]
    MissingReceiver { name: String },

    #[error("receiver of type {found} is not a {expected}")]
    ReceiverMismatch {
        expected: String,
        found: &'static str,
    },

    #[error("'{name}' takes {expected} argument(s), {found} given")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {index} of '{name}': expected {expected}, found {found}")]
    ArgumentType {
        name: String,
        index: usize,
        expected: String,
        found: &'static str,
    },

    #[error("parent chain of {owner} is deeper than {max} levels")]
    ChainTooDeep { owner: String, max: usize },
}

/// Outcome of a failed method invocation.
#[derive(Debug)]
pub enum InvokeFailure {
    /// The call never reached the target.
    Resolution(ResolutionFailure),
    /// The target ran and failed.
    Target(TargetError),
}

impl From<ResolutionFailure> for InvokeFailure {
    fn from(f: ResolutionFailure) -> Self {
        Self::Resolution(f)
    }
}

pub(crate) fn render_params(params: &[ParamType]) -> String {
    params
        .iter()
        .map(ParamType::qualified_name)
        .collect::<Vec<_>>()
        .join(",")
}
