//! Process-wide table from Rust types to the qualified names they answer to.
//!
//! Building a [`TargetType`](super::TargetType) records its qualified name,
//! and the names of its parent chain, against the described Rust type. Object
//! arguments are matched against `ParamType::Object` through this table, so a
//! `ledger::Account` passes where `ledger::Entity` is declared but a
//! `demo::Counter` does not.

use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Qualified names per Rust type, each with its distance from the type itself.
static NAMES: LazyLock<RwLock<HashMap<TypeId, Vec<(String, usize)>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Record that `type_id` answers to `names`, nearest first.
pub(crate) fn register(type_id: TypeId, names: impl IntoIterator<Item = String>) {
    let mut table = NAMES.write();
    let known = table.entry(type_id).or_default();
    for (depth, name) in names.into_iter().enumerate() {
        match known.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = entry.1.min(depth),
            None => known.push((name, depth)),
        }
    }
}

/// Distance from `type_id` to the type named `name`, if it is one.
///
/// Types never described by a target type fall back to their Rust type name.
pub(crate) fn distance(type_id: TypeId, rust_type_name: &str, name: &str) -> Option<usize> {
    let table = NAMES.read();
    match table.get(&type_id) {
        Some(known) => known.iter().find(|(n, _)| n == name).map(|(_, d)| *d),
        None => (rust_type_name == name).then_some(0),
    }
}
