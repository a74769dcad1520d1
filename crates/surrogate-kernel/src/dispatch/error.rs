//! Per-call dispatch failures.

use crate::reflect::{ResolutionFailure, TargetError};
use crate::value::ValueError;
use std::error::Error as StdError;
use thiserror::Error;

/// Why a surrogate member invocation failed.
///
/// Every variant except [`DispatchError::Target`] is raised by the engine.
/// `Target` carries whatever the target member itself returned, untouched:
/// its `Display` and `source()` are the target's own, and
/// [`target_error`](Self::target_error) hands it back for downcasting.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// The contract declares a member nothing is wired to.
    #[error("contract member '{member}' has no mapping rule")]
    UnmappedMember { member: String },

    /// The rule's target member could not be found, reached or called.
    #[error("cannot resolve '{member}' on {target}: {source}")]
    MemberResolution {
        target: String,
        member: String,
        #[source]
        source: ResolutionFailure,
    },

    /// Internal invariant violated; never expected in normal operation.
    #[error("illegal dispatch state: {0}")]
    IllegalDispatchState(String),

    /// Failure raised by the target member, passed through as-is.
    #[error(transparent)]
    Target(TargetError),

    #[error("contract {contract} declares no member '{member}' accepting the given arguments")]
    NotInContract { contract: String, member: String },

    /// Several overloads of `member` fit the arguments equally well.
    #[error("call to '{member}' on {contract} is ambiguous between {}", .candidates.join(" and "))]
    AmbiguousCall {
        contract: String,
        member: String,
        candidates: Vec<String>,
    },

    #[error("unexpected return value: {0}")]
    ReturnType(#[from] ValueError),
}

impl DispatchError {
    /// The target's own failure, when this is a passthrough.
    pub fn target_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::Target(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Take the target's own failure back out.
    pub fn into_target(self) -> Result<TargetError, Self> {
        match self {
            Self::Target(err) => Ok(err),
            other => Err(other),
        }
    }

    pub fn is_target(&self) -> bool {
        matches!(self, Self::Target(_))
    }
}

/// Result alias for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
