//! Crate-level error types for `surrogate-kernel`.
//!
//! Dispatch itself returns the per-call [`DispatchError`] directly, so a
//! target's own failure reaches the caller unwrapped. [`KernelError`]
//! composes every sub-module error for the assembly and loading surface,
//! together with [`error_stack::Report`] for context-carrying propagation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use surrogate_kernel::error::{KernelError, KernelResult};
//! use error_stack::{Report, ResultExt};
//!
//! fn assemble(path: &str) -> KernelResult<RuleBuilder> {
//!     RuleBuilder::from_config_file(contract, path, &registry)
//!         .attach("assembling the stats surrogate")
//! }
//! ```

use crate::dispatch::DispatchError;
use crate::factory::FactoryError;
use crate::rule::RuleError;
use crate::value::ValueError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KernelError {
    /// A structurally malformed rule.
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Factory error: {0}")]
    Factory(#[from] FactoryError),

    #[error("Value error: {0}")]
    Value(#[from] ValueError),

    /// A configuration-related error (requires the `config` feature).
    #[cfg(feature = "config")]
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Equivalent to `Result<T, error_stack::Report<KernelError>>`.
pub type KernelResult<T> = Result<T, error_stack::Report<KernelError>>;
