//! Keyed state management with per-field subscriptions.
//!
//! A [`KeyedStore`] holds a record of field → value pairs, notifies the
//! listeners registered on a field when that field changes, and can be reset
//! to a configured default snapshot.

mod builder;
mod listener;
#[allow(clippy::module_inception)]
mod store;
mod update;
mod value;

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

pub use builder::StoreBuilder;
pub use listener::{Callback, Subscription};
pub use store::{Destroy, KeyedStore};
pub use update::Update;
pub use value::FieldValue;

/// A record of field → value pairs.
pub type Record<K, V> = HashMap<K, V>;

/// A field key. Implemented for every type with the required bounds, so
/// string literals and plain enums both work.
pub trait Key: Eq + Hash + Clone + Debug + 'static {}

impl<T> Key for T where T: Eq + Hash + Clone + Debug + 'static {}

/// Deep-copy every value of a record.
pub(crate) fn copy_record<K: Key, V: FieldValue>(record: &Record<K, V>) -> Record<K, V> {
    record
        .iter()
        .map(|(key, value)| (key.clone(), value.deep_copy()))
        .collect()
}
