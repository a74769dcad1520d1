//! Target type descriptors and their builder.

use super::{TargetError, Visibility};
use crate::value::{Instance, ObjectRef, ParamType, Value};
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type FieldGetter = Arc<dyn Fn(&Instance) -> Option<Value> + Send + Sync>;
type StaticGetter = Arc<dyn Fn() -> Value + Send + Sync>;
type MethodFn = Arc<dyn Fn(&Instance, &[Value]) -> Option<Result<Value, TargetError>> + Send + Sync>;
type StaticMethodFn = Arc<dyn Fn(&[Value]) -> Result<Value, TargetError> + Send + Sync>;
type Constructor = Arc<dyn Fn() -> ObjectRef + Send + Sync>;

/// Common view of fields and methods used by the accessibility guard.
pub trait MemberInfo: Send + Sync {
    fn name(&self) -> &str;
    fn visibility(&self) -> Visibility;
    fn is_static(&self) -> bool;
}

pub(crate) enum FieldAccess {
    Instance(FieldGetter),
    Static(StaticGetter),
}

pub(crate) enum MethodAccess {
    Instance(MethodFn),
    Static(StaticMethodFn),
}

/// A readable field of a target type.
pub struct FieldDef {
    name: String,
    visibility: Visibility,
    pub(crate) access: FieldAccess,
}

impl MemberInfo for FieldDef {
    fn name(&self) -> &str {
        &self.name
    }

    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn is_static(&self) -> bool {
        matches!(self.access, FieldAccess::Static(_))
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("static", &self.is_static())
            .finish()
    }
}

/// A callable method of a target type.
pub struct MethodDef {
    name: String,
    params: Vec<ParamType>,
    visibility: Visibility,
    pub(crate) access: MethodAccess,
}

impl MethodDef {
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }
}

impl MemberInfo for MethodDef {
    fn name(&self) -> &str {
        &self.name
    }

    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn is_static(&self) -> bool {
        matches!(self.access, MethodAccess::Static(_))
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .field("static", &self.is_static())
            .finish()
    }
}

/// Moves a child receiver to the parent value it embeds.
pub(crate) trait Upcast: Send + Sync {
    fn upcast<'a>(&self, obj: &'a Instance) -> Option<&'a Instance>;
}

struct Projection<T, P> {
    project: fn(&T) -> &P,
}

impl<T, P> Upcast for Projection<T, P>
where
    T: Any + Send + Sync,
    P: Any + Send + Sync,
{
    fn upcast<'a>(&self, obj: &'a Instance) -> Option<&'a Instance> {
        obj.downcast_ref::<T>()
            .map(|child| (self.project)(child) as &Instance)
    }
}

pub(crate) struct ParentLink {
    pub(crate) ty: Arc<TargetType>,
    pub(crate) upcast: Box<dyn Upcast>,
}

/// Runtime description of one Rust type as a redirect target.
pub struct TargetType {
    name: String,
    rust_type: TypeId,
    rust_type_name: &'static str,
    fields: Vec<FieldDef>,
    methods: Vec<MethodDef>,
    pub(crate) parent: Option<ParentLink>,
    constructor: Option<Constructor>,
}

impl TargetType {
    /// Start describing `T` under the qualified name `name`.
    pub fn builder<T: Any + Send + Sync>(name: impl Into<String>) -> TargetTypeBuilder<T> {
        TargetTypeBuilder {
            ty: TargetType {
                name: name.into(),
                rust_type: TypeId::of::<T>(),
                rust_type_name: std::any::type_name::<T>(),
                fields: Vec::new(),
                methods: Vec::new(),
                parent: None,
                constructor: None,
            },
            _marker: PhantomData,
        }
    }

    /// Qualified name, as used in parameter types and diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rust_type_name(&self) -> &'static str {
        self.rust_type_name
    }

    pub fn parent(&self) -> Option<&Arc<TargetType>> {
        self.parent.as_ref().map(|link| &link.ty)
    }

    /// Fields declared by this type itself, any visibility.
    pub fn declared_fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Methods declared by this type itself, any visibility.
    pub fn declared_methods(&self) -> &[MethodDef] {
        &self.methods
    }

    pub fn declared_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn declared_method(&self, name: &str, params: &[ParamType]) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.params == params)
    }

    /// Whether `obj` is exactly the Rust type this descriptor was built for.
    pub fn describes(&self, obj: &ObjectRef) -> bool {
        obj.as_any().type_id() == self.rust_type
    }

    /// Create a fresh instance through the registered default constructor.
    pub fn instantiate(&self) -> Option<ObjectRef> {
        self.constructor.as_ref().map(|ctor| ctor())
    }

    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }
}

impl fmt::Debug for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetType")
            .field("name", &self.name)
            .field("rust_type", &self.rust_type_name)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("parent", &self.parent().map(|p| p.name()))
            .finish()
    }
}

/// Builder for [`TargetType`], typed on the described Rust type.
///
/// ```rust,ignore
/// let ty = TargetType::builder::<Counter>("demo::Counter")
///     .field("total", |c: &Counter| c.total)
///     .private_field("secret", |c: &Counter| c.secret.clone())
///     .method("add", vec![ParamType::Int], |c: &Counter, args: &[Value]| {
///         Ok(c.total + args[0].extract::<i64>()?)
///     })
///     .build();
/// ```
pub struct TargetTypeBuilder<T> {
    ty: TargetType,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TargetTypeBuilder<T> {
    fn push_field(mut self, name: String, visibility: Visibility, access: FieldAccess) -> Self {
        self.ty.fields.retain(|f| f.name != name);
        self.ty.fields.push(FieldDef {
            name,
            visibility,
            access,
        });
        self
    }

    fn push_method(
        mut self,
        name: String,
        params: Vec<ParamType>,
        visibility: Visibility,
        access: MethodAccess,
    ) -> Self {
        self.ty
            .methods
            .retain(|m| !(m.name == name && m.params == params));
        self.ty.methods.push(MethodDef {
            name,
            params,
            visibility,
            access,
        });
        self
    }

    fn instance_field<V, F>(self, name: String, visibility: Visibility, get: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let getter: FieldGetter =
            Arc::new(move |obj: &Instance| -> Option<Value> {
                obj.downcast_ref::<T>().map(|this| get(this).into())
            });
        self.push_field(name, visibility, FieldAccess::Instance(getter))
    }

    fn instance_method<V, F>(
        self,
        name: String,
        params: Vec<ParamType>,
        visibility: Visibility,
        call: F,
    ) -> Self
    where
        V: Into<Value>,
        F: Fn(&T, &[Value]) -> Result<V, TargetError> + Send + Sync + 'static,
    {
        let invoker: MethodFn = Arc::new(
            move |obj: &Instance, args: &[Value]| -> Option<Result<Value, TargetError>> {
                obj.downcast_ref::<T>()
                    .map(|this| call(this, args).map(Into::<Value>::into))
            },
        );
        self.push_method(name, params, visibility, MethodAccess::Instance(invoker))
    }

    fn type_method<V, F>(
        self,
        name: String,
        params: Vec<ParamType>,
        visibility: Visibility,
        call: F,
    ) -> Self
    where
        V: Into<Value>,
        F: Fn(&[Value]) -> Result<V, TargetError> + Send + Sync + 'static,
    {
        let invoker: StaticMethodFn = Arc::new(move |args: &[Value]| -> Result<Value, TargetError> {
            call(args).map(Into::<Value>::into)
        });
        self.push_method(name, params, visibility, MethodAccess::Static(invoker))
    }

    /// Public instance field.
    pub fn field<V, F>(self, name: impl Into<String>, get: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.instance_field(name.into(), Visibility::Public, get)
    }

    /// Instance field only reachable through declared-only lookup.
    pub fn private_field<V, F>(self, name: impl Into<String>, get: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.instance_field(name.into(), Visibility::Private, get)
    }

    /// Public field read without a receiver.
    pub fn static_field<V, F>(self, name: impl Into<String>, get: F) -> Self
    where
        V: Into<Value>,
        F: Fn() -> V + Send + Sync + 'static,
    {
        let getter: StaticGetter = Arc::new(move || -> Value { get().into() });
        self.push_field(name.into(), Visibility::Public, FieldAccess::Static(getter))
    }

    pub fn method<V, F>(self, name: impl Into<String>, params: Vec<ParamType>, call: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T, &[Value]) -> Result<V, TargetError> + Send + Sync + 'static,
    {
        self.instance_method(name.into(), params, Visibility::Public, call)
    }

    pub fn private_method<V, F>(
        self,
        name: impl Into<String>,
        params: Vec<ParamType>,
        call: F,
    ) -> Self
    where
        V: Into<Value>,
        F: Fn(&T, &[Value]) -> Result<V, TargetError> + Send + Sync + 'static,
    {
        self.instance_method(name.into(), params, Visibility::Private, call)
    }

    /// Public method invoked without a receiver.
    pub fn static_method<V, F>(
        self,
        name: impl Into<String>,
        params: Vec<ParamType>,
        call: F,
    ) -> Self
    where
        V: Into<Value>,
        F: Fn(&[Value]) -> Result<V, TargetError> + Send + Sync + 'static,
    {
        self.type_method(name.into(), params, Visibility::Public, call)
    }

    pub fn private_static_method<V, F>(
        self,
        name: impl Into<String>,
        params: Vec<ParamType>,
        call: F,
    ) -> Self
    where
        V: Into<Value>,
        F: Fn(&[Value]) -> Result<V, TargetError> + Send + Sync + 'static,
    {
        self.type_method(name.into(), params, Visibility::Private, call)
    }

    /// Inherit the public members of `parent`, reached through `project`.
    pub fn extends<P>(mut self, parent: Arc<TargetType>, project: fn(&T) -> &P) -> Self
    where
        P: Any + Send + Sync,
    {
        self.ty.parent = Some(ParentLink {
            ty: parent,
            upcast: Box::new(Projection { project }),
        });
        self
    }

    /// Finish the descriptor and record the names `T` answers to as an argument.
    pub fn build(self) -> Arc<TargetType> {
        let ty = self.ty;
        let mut names = vec![ty.name.clone()];
        let mut parent = ty.parent();
        while let Some(p) = parent {
            if names.len() > super::lookup::MAX_PARENT_DEPTH {
                break;
            }
            names.push(p.name().to_string());
            parent = p.parent();
        }
        super::names::register(ty.rust_type, names);
        Arc::new(ty)
    }
}

impl<T: Any + Send + Sync + Default> TargetTypeBuilder<T> {
    /// Register `T::default()` as the constructor used for mapped classes.
    pub fn with_default(mut self) -> Self {
        self.ty.constructor = Some(Arc::new(|| ObjectRef::new(T::default())));
        self
    }
}
