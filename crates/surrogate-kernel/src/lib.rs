//! Surrogate objects whose members are redirected to fields and methods of
//! other objects.
//!
//! A surrogate satisfies a [`Contract`] without implementing any logic: each
//! member invocation is routed by a [`Dispatch`] implementation to a target
//! member chosen at assembly time.
//!
//! - declared variant: one source object, rules tagged on contract members
//!   ([`factory::declared`]);
//! - global variant: rules assembled into one table, each with its own
//!   target ([`RuleBuilder`], [`factory::configured`]).
//!
//! ```rust,ignore
//! use surrogate_kernel::prelude::*;
//!
//! let contract = Contract::builder("Stats")
//!     .member("count", vec![])
//!     .member("max", vec![])
//!     .build();
//!
//! let mut builder = RuleBuilder::new(contract);
//! builder
//!     .add(MappingRule::field("count", "total").bind(&counter_type, counter).build()?)
//!     .add(
//!         MappingRule::method("max", "max")
//!             .on(&math_type)
//!             .static_access()
//!             .explicit_param_types(vec![ParamType::Int, ParamType::Int])
//!             .explicit_args(vec![Value::Int(3), Value::Int(7)])
//!             .build()?,
//!     );
//!
//! let stats = builder.build_instance();
//! assert_eq!(stats.call::<i64>("count", &[])?, 42);
//! assert_eq!(stats.call::<i64>("max", &[])?, 7);
//! ```

// value module
pub mod value;

// reflective access to targets
pub mod reflect;

// rule model
pub mod rule;

// contract shapes
pub mod contract;

// dispatch engine
pub mod dispatch;

// assembly
pub mod builder;
pub mod factory;
pub mod registry;

// error module
pub mod error;

#[cfg(feature = "config")]
pub mod config;

pub use builder::RuleBuilder;
pub use contract::{Contract, ContractMember, DeclaredRule, MemberSig, OverloadError};
pub use dispatch::{
    DeclaredDispatcher, Dispatch, DispatchConfig, DispatchError, DispatchResult, Equality,
    GlobalDispatcher, Invocation, UnmappedPolicy,
};
pub use error::{KernelError, KernelResult};
pub use factory::{
    DynamicSurrogateFactory, FactoryError, FromSurrogate, Surrogate, SurrogateFactory,
};
pub use reflect::{MemberKind, ResolutionFailure, TargetError, TargetType};
pub use registry::TargetRegistry;
pub use rule::{AccessFlags, FrozenRuleSet, MappingRule, RuleError, RuleSet, SignatureKey};
pub use value::{EXACT_MATCH, FromValue, ObjectRef, ParamType, TypeName, Value, ValueError};

pub mod prelude {
    pub use crate::builder::RuleBuilder;
    pub use crate::contract::{Contract, DeclaredRule};
    pub use crate::dispatch::{Dispatch, DispatchError, DispatchResult, Equality};
    pub use crate::factory::{self, FromSurrogate, Surrogate};
    pub use crate::reflect::{MemberKind, TargetError, TargetType};
    pub use crate::rule::{AccessFlags, MappingRule};
    pub use crate::value::{ObjectRef, ParamType, Value};
}
