//! Pluggable equality for the implicit `equals(any)` member.

use crate::value::{ObjectRef, Value};

/// Decides whether a surrogate equals another value.
///
/// Only consulted when `equals` is invoked and no rule maps it. `receiver`
/// is the surrogate's own identity.
pub trait Equality: Send + Sync {
    fn equals(&self, receiver: &ObjectRef, other: &Value) -> bool;
}

impl<F> Equality for F
where
    F: Fn(&ObjectRef, &Value) -> bool + Send + Sync,
{
    fn equals(&self, receiver: &ObjectRef, other: &Value) -> bool {
        self(receiver, other)
    }
}

/// Fallback when no strategy is set: same object or not.
pub fn identity(receiver: &ObjectRef, other: &Value) -> bool {
    other.as_object().is_some_and(|obj| obj.ptr_eq(receiver))
}
