//! Named target types and instances that rule tables refer to.

use crate::reflect::TargetType;
use crate::value::ObjectRef;
use std::collections::HashMap;
use std::sync::Arc;

/// Lookup of target types by qualified name and of bound instances by a
/// caller-chosen name.
#[derive(Clone, Default)]
pub struct TargetRegistry {
    types: HashMap<String, Arc<TargetType>>,
    instances: HashMap<String, (Arc<TargetType>, ObjectRef)>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ty` under its qualified name.
    pub fn register_type(&mut self, ty: &Arc<TargetType>) -> &mut Self {
        self.types.insert(ty.name().to_string(), Arc::clone(ty));
        self
    }

    /// Register `instance` of `ty` under `name`; `ty` is registered too.
    pub fn register_instance(
        &mut self,
        name: impl Into<String>,
        ty: &Arc<TargetType>,
        instance: ObjectRef,
    ) -> &mut Self {
        self.register_type(ty);
        self.instances
            .insert(name.into(), (Arc::clone(ty), instance));
        self
    }

    pub fn target_type(&self, name: &str) -> Option<&Arc<TargetType>> {
        self.types.get(name)
    }

    pub fn instance(&self, name: &str) -> Option<(&Arc<TargetType>, &ObjectRef)> {
        self.instances.get(name).map(|(ty, obj)| (ty, obj))
    }

    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut instances: Vec<_> = self.instances.keys().collect();
        instances.sort_unstable();
        f.debug_struct("TargetRegistry")
            .field("types", &self.type_names())
            .field("instances", &instances)
            .finish()
    }
}
