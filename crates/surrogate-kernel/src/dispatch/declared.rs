//! Single-target dispatcher reading rules off the invoked member.

use super::redirect::Redirect;
use super::{Dispatch, DispatchError, DispatchResult, Equality, Invocation, answer_default};
use crate::reflect::TargetType;
use crate::value::{ObjectRef, Value};
use std::fmt;
use std::sync::Arc;

/// Dispatcher of the declared variant.
///
/// One `source` object backs the whole surrogate. A member without an inline
/// rule that is not a default member is an authoring error and fails with
/// [`DispatchError::UnmappedMember`].
#[derive(Clone)]
pub struct DeclaredDispatcher {
    source_type: Arc<TargetType>,
    source: ObjectRef,
    equality: Option<Arc<dyn Equality>>,
}

impl DeclaredDispatcher {
    pub fn new(source_type: Arc<TargetType>, source: ObjectRef) -> Self {
        Self {
            source_type,
            source,
            equality: None,
        }
    }

    pub fn with_equality(mut self, equality: Arc<dyn Equality>) -> Self {
        self.equality = Some(equality);
        self
    }

    pub fn source_type(&self) -> &Arc<TargetType> {
        &self.source_type
    }

    pub fn source(&self) -> &ObjectRef {
        &self.source
    }
}

impl Dispatch for DeclaredDispatcher {
    fn dispatch(&self, call: Invocation<'_>) -> DispatchResult<Value> {
        let sig = call.member.sig();

        if let Some(rule) = call.member.declared() {
            tracing::debug!(
                member = %sig,
                kind = %rule.kind(),
                target = %format_args!("{}::{}", self.source_type.name(), rule.target_name()),
                "dispatching declared member"
            );
            return Redirect::declared(rule, &self.source_type, &self.source)
                .run(sig.params(), call.args);
        }

        if let Some(value) = answer_default(&call, self.equality.as_deref(), || self.describe()) {
            tracing::debug!(member = %sig, "answered default member");
            return Ok(value);
        }

        Err(DispatchError::UnmappedMember {
            member: sig.to_string(),
        })
    }

    fn describe(&self) -> String {
        format!("Surrogate[{}]", self.source_type.name())
    }
}

impl fmt::Debug for DeclaredDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclaredDispatcher")
            .field("source_type", &self.source_type.name())
            .field("source", &self.source)
            .field("equality", &self.equality.is_some())
            .finish()
    }
}
