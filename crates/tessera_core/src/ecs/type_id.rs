//! # Component Type Identifiers
//!
//! Dense `u64` ids handed out on first request, starting at zero. The
//! [`Registry`](crate::Registry) uses them to index its pool table, so they
//! must stay small and stable for the life of the process. They are not
//! stable across runs and must never be persisted.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;

/// Process-wide assignment table.
#[derive(Default)]
struct TypeIdTable {
    ids: HashMap<TypeId, u64>,
    names: Vec<&'static str>,
}

fn table() -> &'static RwLock<TypeIdTable> {
    static TABLE: OnceLock<RwLock<TypeIdTable>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(TypeIdTable::default()))
}

/// Returns the process-stable id of `T`, assigning the next free one on the
/// first call for that type.
#[must_use]
pub fn component_type_id<T: ?Sized + 'static>() -> u64 {
    let key = TypeId::of::<T>();

    if let Some(&id) = table().read().ids.get(&key) {
        return id;
    }

    let mut guard = table().write();
    // Another caller may have assigned it between the two locks
    if let Some(&id) = guard.ids.get(&key) {
        return id;
    }

    let id = guard.names.len() as u64;
    guard.ids.insert(key, id);
    guard.names.push(std::any::type_name::<T>());
    id
}

/// Rust type name recorded when `id` was assigned, for diagnostics.
#[must_use]
pub fn component_type_name(id: u64) -> Option<&'static str> {
    let index = usize::try_from(id).ok()?;
    table().read().names.get(index).copied()
}

/// Number of ids assigned so far in this process.
#[must_use]
pub fn registered_type_count() -> usize {
    table().read().names.len()
}
