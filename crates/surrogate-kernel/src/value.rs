//! Dynamic values exchanged between surrogates and their targets.
//!
//! Every argument passed to a surrogate member and every result returned by
//! a redirected access is a [`Value`]. Plain data compares structurally;
//! objects are carried as [`ObjectRef`] handles and compare by identity.

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Type-erased object as seen by the reflective layer.
pub type Instance = dyn Any + Send + Sync;

/// Conformance score of an argument whose type is exactly the declared one.
pub const EXACT_MATCH: u32 = 128;

// ─────────────────────────────────────────────────────────────────────────────
// ObjectRef
// ─────────────────────────────────────────────────────────────────────────────

/// Shared handle to an arbitrary object.
///
/// Cloning the handle never clones the object; two handles are equal only
/// when they point at the same allocation.
#[derive(Clone)]
pub struct ObjectRef {
    inner: Arc<Instance>,
    type_id: TypeId,
    type_name: &'static str,
}

impl ObjectRef {
    /// Move `value` into a new shared allocation.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an existing allocation without copying it.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The object as a type-erased reference.
    pub fn as_any(&self) -> &Instance {
        &*self.inner
    }

    /// Rust type name of the referenced object.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// How many parent links separate the object's type from `name`.
    fn distance_to(&self, name: &str) -> Option<usize> {
        crate::reflect::names::distance(self.type_id, self.type_name, name)
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Recover the typed allocation, sharing ownership with this handle.
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Identity comparison: true iff both handles reference the same object.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ObjectRef<{}>@{:p}",
            self.type_name,
            Arc::as_ptr(&self.inner) as *const ()
        )
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime value for surrogate calls.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value; what a no-op member returns.
    #[default]
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Object(ObjectRef),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Bool(_) => "bool",
            Self::Int(_) => "i64",
            Self::Float(_) => "f64",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Object(obj) => obj.type_name(),
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Floats, with integers widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Whether this value may be passed where `ty` is declared.
    pub fn conforms_to(&self, ty: &ParamType) -> bool {
        self.conformance(ty).is_some()
    }

    /// How closely this value matches `ty`, or `None` if it cannot be passed.
    ///
    /// Higher is closer: an exact type scores [`EXACT_MATCH`], an object scores
    /// one less per parent link, `Unit` passed for an object scores 1 and
    /// `any` scores 0.
    pub fn conformance(&self, ty: &ParamType) -> Option<u32> {
        match (ty, self) {
            (ParamType::Any, _) => Some(0),
            (ParamType::Bool, Self::Bool(_))
            | (ParamType::Int, Self::Int(_))
            | (ParamType::Float, Self::Float(_))
            | (ParamType::Str, Self::Str(_))
            | (ParamType::List, Self::List(_)) => Some(EXACT_MATCH),
            (ParamType::Object(name), Self::Object(obj)) => obj
                .distance_to(name.as_str())
                .map(|d| EXACT_MATCH.saturating_sub(d as u32).max(2)),
            (ParamType::Object(_), Self::Unit) => Some(1),
            _ => None,
        }
    }

    /// Extract a typed value.
    pub fn extract<T: FromValue>(&self) -> Result<T, ValueError> {
        T::from_value(self)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unit, Self::Unit) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "()"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Object(obj) => write!(f, "[object {}]", obj.type_name()),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Unit
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Unit, Into::into)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = ValueError;

    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        match v {
            serde_json::Value::Null => Ok(Self::Unit),
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i)),
                None => n
                    .as_f64()
                    .map(Self::Float)
                    .ok_or_else(|| ValueError::Unrepresentable(n.to_string())),
            },
            serde_json::Value::String(s) => Ok(Self::Str(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            serde_json::Value::Object(_) => Err(ValueError::Unrepresentable(
                "JSON objects cannot be passed as literal arguments".to_string(),
            )),
        }
    }
}

/// Conversion failures between [`Value`] and Rust types.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("value cannot be represented: {0}")]
    Unrepresentable(String),
}

/// Typed extraction out of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ValueError>;
}

fn mismatch(expected: &'static str, found: &Value) -> ValueError {
    ValueError::Mismatch {
        expected,
        found: found.type_name(),
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        Ok(value.clone())
    }
}

impl FromValue for () {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Unit => Ok(()),
            other => Err(mismatch("unit", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_int().ok_or_else(|| mismatch("i64", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_float().ok_or_else(|| mismatch("f64", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_object().cloned().ok_or_else(|| mismatch("object", value))
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value
            .as_list()
            .map(<[Value]>::to_vec)
            .ok_or_else(|| mismatch("list", value))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ParamType
// ─────────────────────────────────────────────────────────────────────────────

/// Declared type of a member parameter.
///
/// The textual form (see [`ParamType::qualified_name`]) is stable and is what
/// signature keys are built from, so it must never change for a given type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParamType {
    Bool,
    Int,
    Float,
    Str,
    List,
    /// Accepts any value; the parameter type of `equals`.
    Any,
    /// An object type, named by its qualified target-type name.
    Object(TypeName),
}

/// Names with a fixed meaning in parameter lists; never an object type.
const RESERVED: &[&str] = &["bool", "i64", "int", "f64", "float", "string", "str", "list", "any"];

/// Qualified name of an object parameter type.
///
/// Never empty and never one of the primitive names, so its textual form
/// always parses back to the same [`ParamType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Result<Self, ValueError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValueError::Unrepresentable("empty type name".to_string()));
        }
        if RESERVED.contains(&trimmed) {
            return Err(ValueError::Unrepresentable(format!(
                "'{trimmed}' is a primitive type name, not an object type"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ParamType {
    /// Object parameter type; fails on empty or primitive names.
    pub fn object(name: impl Into<String>) -> Result<Self, ValueError> {
        TypeName::new(name).map(Self::Object)
    }

    pub fn qualified_name(&self) -> &str {
        match self {
            Self::Bool => "bool",
            Self::Int => "i64",
            Self::Float => "f64",
            Self::Str => "string",
            Self::List => "list",
            Self::Any => "any",
            Self::Object(name) => name.as_str(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified_name())
    }
}

impl FromStr for ParamType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s {
            "bool" => Self::Bool,
            "i64" | "int" => Self::Int,
            "f64" | "float" => Self::Float,
            "string" | "str" => Self::Str,
            "list" => Self::List,
            "any" => Self::Any,
            other => Self::Object(TypeName::new(other)?),
        })
    }
}

impl TryFrom<String> for ParamType {
    type Error = ValueError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ParamType> for String {
    fn from(ty: ParamType) -> Self {
        ty.qualified_name().to_string()
    }
}
