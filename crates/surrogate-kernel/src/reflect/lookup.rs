//! Member resolution over a target type and its parents.
//!
//! Declared-only lookup sees the owner's own members of any visibility.
//! The public view walks the parent chain, nearest type first, and only ever
//! returns public members.

use super::accessible::{self, AccessGuard};
use super::target_type::{FieldAccess, FieldDef, MemberInfo, MethodAccess, MethodDef, Upcast};
use super::{InvokeFailure, ResolutionFailure, TargetType, render_params};
use crate::value::{Instance, ObjectRef, ParamType, Value};

/// Maximum parent-chain depth walked by the public view.
pub(crate) const MAX_PARENT_DEPTH: usize = 64;

/// A field found on `owner`, plus the projections from the lookup type.
pub struct ResolvedField<'t> {
    def: &'t FieldDef,
    owner: &'t TargetType,
    path: Vec<&'t dyn Upcast>,
}

/// A method found on `owner`, plus the projections from the lookup type.
pub struct ResolvedMethod<'t> {
    def: &'t MethodDef,
    owner: &'t TargetType,
    path: Vec<&'t dyn Upcast>,
}

struct Found<'t, D> {
    def: &'t D,
    owner: &'t TargetType,
    path: Vec<&'t dyn Upcast>,
}

fn walk<'t, D, F>(
    ty: &'t TargetType,
    declared_only: bool,
    find: F,
    missing: impl FnOnce() -> ResolutionFailure,
) -> Result<Found<'t, D>, ResolutionFailure>
where
    D: MemberInfo,
    F: Fn(&'t TargetType) -> Option<&'t D>,
{
    if declared_only {
        return find(ty)
            .map(|def| Found {
                def,
                owner: ty,
                path: Vec::new(),
            })
            .ok_or_else(missing);
    }

    let mut current = ty;
    let mut path: Vec<&'t dyn Upcast> = Vec::new();
    let mut hidden: Option<&'t TargetType> = None;
    let mut depth = 0;
    loop {
        if let Some(def) = find(current) {
            if def.visibility().is_public() {
                return Ok(Found {
                    def,
                    owner: current,
                    path,
                });
            }
            hidden.get_or_insert(current);
        }
        let Some(link) = current.parent.as_ref() else {
            break;
        };
        depth += 1;
        if depth > MAX_PARENT_DEPTH {
            return Err(ResolutionFailure::ChainTooDeep {
                owner: ty.name().to_string(),
                max: MAX_PARENT_DEPTH,
            });
        }
        tracing::trace!(from = current.name(), to = link.ty.name(), "walking to parent type");
        path.push(link.upcast.as_ref());
        current = &*link.ty;
    }

    match hidden {
        Some(owner) => Err(ResolutionFailure::Inaccessible {
            owner: owner.name().to_string(),
            name: find(owner).map(|d| d.name().to_string()).unwrap_or_default(),
        }),
        None => Err(missing()),
    }
}

/// Resolve field `name` on `ty`.
pub fn resolve_field<'t>(
    ty: &'t TargetType,
    name: &str,
    declared_only: bool,
) -> Result<ResolvedField<'t>, ResolutionFailure> {
    let found = walk(
        ty,
        declared_only,
        |t: &'t TargetType| t.declared_field(name),
        || ResolutionFailure::NoSuchField {
            owner: ty.name().to_string(),
            name: name.to_string(),
        },
    )?;
    Ok(ResolvedField {
        def: found.def,
        owner: found.owner,
        path: found.path,
    })
}

/// Resolve method `name` with exactly `params` on `ty`.
pub fn resolve_method<'t>(
    ty: &'t TargetType,
    name: &str,
    params: &[ParamType],
    declared_only: bool,
) -> Result<ResolvedMethod<'t>, ResolutionFailure> {
    let found = walk(
        ty,
        declared_only,
        |t: &'t TargetType| t.declared_method(name, params),
        || ResolutionFailure::NoSuchMethod {
            owner: ty.name().to_string(),
            name: name.to_string(),
            params: render_params(params),
        },
    )?;
    Ok(ResolvedMethod {
        def: found.def,
        owner: found.owner,
        path: found.path,
    })
}

/// Follow the parent projections from the lookup type to the owner.
fn project<'r>(
    receiver: &'r ObjectRef,
    path: &[&dyn Upcast],
    owner: &TargetType,
    member: &str,
) -> Result<&'r Instance, ResolutionFailure> {
    let mismatch = || ResolutionFailure::ReceiverMismatch {
        expected: owner.name().to_string(),
        found: receiver.type_name(),
    };
    let mut obj = receiver.as_any();
    for step in path {
        obj = step.upcast(obj).ok_or_else(mismatch)?;
    }
    tracing::trace!(member, owner = owner.name(), "receiver projected");
    Ok(obj)
}

fn require_receiver<'r>(
    receiver: Option<&'r ObjectRef>,
    member: &str,
) -> Result<&'r ObjectRef, ResolutionFailure> {
    receiver.ok_or_else(|| ResolutionFailure::MissingReceiver {
        name: member.to_string(),
    })
}

impl<'t> ResolvedField<'t> {
    pub fn def(&self) -> &'t FieldDef {
        self.def
    }

    pub fn owner(&self) -> &'t TargetType {
        self.owner
    }

    /// Read the field.
    ///
    /// Static fields ignore `receiver`; instance fields require one of the
    /// lookup type (or a type embedding it through `extends`).
    pub fn read(
        &self,
        receiver: Option<&ObjectRef>,
        guard: Option<&AccessGuard<'_>>,
    ) -> Result<Value, ResolutionFailure> {
        accessible::check(self.def, self.owner.name(), guard)?;
        match &self.def.access {
            FieldAccess::Static(get) => Ok(get()),
            FieldAccess::Instance(get) => {
                let name = self.def.name();
                let receiver = require_receiver(receiver, name)?;
                let obj = project(receiver, &self.path, self.owner, name)?;
                get(obj).ok_or_else(|| ResolutionFailure::ReceiverMismatch {
                    expected: self.owner.name().to_string(),
                    found: receiver.type_name(),
                })
            }
        }
    }
}

impl<'t> ResolvedMethod<'t> {
    pub fn def(&self) -> &'t MethodDef {
        self.def
    }

    pub fn owner(&self) -> &'t TargetType {
        self.owner
    }

    fn check_args(&self, args: &[Value]) -> Result<(), ResolutionFailure> {
        let params = self.def.params();
        if params.len() != args.len() {
            return Err(ResolutionFailure::Arity {
                name: self.def.name().to_string(),
                expected: params.len(),
                found: args.len(),
            });
        }
        for (index, (param, arg)) in params.iter().zip(args).enumerate() {
            if !arg.conforms_to(param) {
                return Err(ResolutionFailure::ArgumentType {
                    name: self.def.name().to_string(),
                    index,
                    expected: param.qualified_name().to_string(),
                    found: arg.type_name(),
                });
            }
        }
        Ok(())
    }

    /// Invoke the method.
    ///
    /// Arity and argument types are checked before the target runs; a
    /// failure returned by the target comes back as
    /// [`InvokeFailure::Target`] untouched.
    pub fn invoke(
        &self,
        receiver: Option<&ObjectRef>,
        args: &[Value],
        guard: Option<&AccessGuard<'_>>,
    ) -> Result<Value, InvokeFailure> {
        accessible::check(self.def, self.owner.name(), guard)?;
        self.check_args(args)?;
        match &self.def.access {
            MethodAccess::Static(call) => call(args).map_err(InvokeFailure::Target),
            MethodAccess::Instance(call) => {
                let name = self.def.name();
                let receiver = require_receiver(receiver, name)?;
                let obj = project(receiver, &self.path, self.owner, name)?;
                match call(obj, args) {
                    Some(result) => result.map_err(InvokeFailure::Target),
                    None => Err(ResolutionFailure::ReceiverMismatch {
                        expected: self.owner.name().to_string(),
                        found: receiver.type_name(),
                    }
                    .into()),
                }
            }
        }
    }
}
