//! Construction-time errors for mapping rules.

use thiserror::Error;

/// A rule that is structurally malformed and can never be dispatched.
///
/// Raised eagerly by [`MappingRuleBuilder::build`](super::MappingRuleBuilder::build);
/// whether the target member actually exists is only checked at dispatch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuleError {
    #[error("rule has an empty surrogate member name")]
    EmptySurrogateName,

    #[error("rule '{0}' has an empty target member name")]
    EmptyTargetName(String),

    #[error("rule '{0}' has no target type")]
    MissingTargetType(String),

    #[error("rule '{0}' uses instance access but no target instance is bound")]
    MissingTargetInstance(String),

    #[error("rule '{0}' is a field rule and cannot carry explicit parameter types or arguments")]
    AdaptationOnFieldRule(String),

    #[error("rule '{surrogate}' declares {types} explicit parameter type(s) but {args} explicit argument(s)")]
    ExplicitArityMismatch {
        surrogate: String,
        types: usize,
        args: usize,
    },
}
