//! The redirected access shared by both dispatcher variants.

use super::{DispatchError, DispatchResult};
use crate::contract::DeclaredRule;
use crate::reflect::{
    InvokeFailure, MemberKind, ResolutionFailure, TargetType, accessible, resolve_field,
    resolve_method,
};
use crate::rule::MappingRule;
use crate::value::{ObjectRef, ParamType, Value};

/// Everything needed to perform one redirected read or call.
pub(crate) struct Redirect<'a> {
    ty: &'a TargetType,
    name: &'a str,
    kind: MemberKind,
    is_static: bool,
    declared_only: bool,
    instance: Option<&'a ObjectRef>,
    param_types: Option<&'a [ParamType]>,
    args: Option<&'a [Value]>,
}

impl<'a> From<&'a MappingRule> for Redirect<'a> {
    fn from(rule: &'a MappingRule) -> Self {
        Self {
            ty: rule.target_type(),
            name: rule.target_name(),
            kind: rule.kind(),
            is_static: rule.is_static(),
            declared_only: rule.declared_only(),
            instance: rule.target_instance(),
            param_types: rule.explicit_param_types(),
            args: rule.explicit_args(),
        }
    }
}

impl<'a> Redirect<'a> {
    /// Redirect for a member tagged inline, against the single shared source.
    pub(crate) fn declared(rule: &'a DeclaredRule, ty: &'a TargetType, source: &'a ObjectRef) -> Self {
        Self {
            ty,
            name: rule.target_name(),
            kind: rule.kind(),
            is_static: rule.access().is_static(),
            declared_only: rule.is_declared_only(),
            instance: Some(source),
            param_types: None,
            args: None,
        }
    }

    /// Perform the access with the invoked member's own types and arguments
    /// unless the rule overrides them.
    pub(crate) fn run(&self, call_types: &[ParamType], call_args: &[Value]) -> DispatchResult<Value> {
        let receiver = if self.is_static {
            None
        } else {
            Some(self.instance.ok_or_else(|| {
                DispatchError::IllegalDispatchState(format!(
                    "instance access to {}::{} without a bound instance",
                    self.ty.name(),
                    self.name
                ))
            })?)
        };

        match self.kind {
            MemberKind::Method => {
                let params = self.param_types.unwrap_or(call_types);
                let args = self.args.unwrap_or(call_args);
                let method = resolve_method(self.ty, self.name, params, self.declared_only)
                    .map_err(|f| self.resolution(f))?;
                tracing::trace!(
                    target_type = self.ty.name(),
                    owner = method.owner().name(),
                    member = self.name,
                    "method resolved"
                );
                let guard = accessible::force(method.def());
                method
                    .invoke(receiver, args, Some(&guard))
                    .map_err(|failure| match failure {
                        InvokeFailure::Resolution(f) => self.resolution(f),
                        InvokeFailure::Target(err) => DispatchError::Target(err),
                    })
            }
            MemberKind::Field => {
                let field = resolve_field(self.ty, self.name, self.declared_only)
                    .map_err(|f| self.resolution(f))?;
                tracing::trace!(
                    target_type = self.ty.name(),
                    owner = field.owner().name(),
                    member = self.name,
                    "field resolved"
                );
                let guard = accessible::force(field.def());
                field
                    .read(receiver, Some(&guard))
                    .map_err(|f| self.resolution(f))
            }
        }
    }

    fn resolution(&self, source: ResolutionFailure) -> DispatchError {
        DispatchError::MemberResolution {
            target: self.ty.name().to_string(),
            member: self.name.to_string(),
            source,
        }
    }
}
