use std::fmt;
use std::rc::{Rc, Weak};

use super::store::{KeyedStore, Shared};
use super::value::FieldValue;
use super::Key;

/// A listener callback with reference identity.
///
/// Cloning a `Callback` yields another handle to the same function, and two
/// callbacks are equal only when they are handles to the same function. The
/// store uses that identity to deduplicate subscriptions and to match
/// unsubscribe requests.
///
/// The callback receives the field's value, or `None` when the field holds
/// no value at the moment of notification (a mass update can list fields
/// that were never set).
///
/// # Examples
///
/// ```
/// use keyed_store::Callback;
///
/// let a = Callback::new(|v: Option<&i32>| println!("{v:?}"));
/// let b = a.clone();
/// let c = Callback::new(|v: Option<&i32>| println!("{v:?}"));
///
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
pub struct Callback<V> {
    f: Rc<dyn Fn(Option<&V>)>,
}

impl<V> Callback<V> {
    /// Wrap a closure as a listener callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&V>) + 'static,
    {
        Self { f: Rc::new(f) }
    }

    /// Invoke the callback with a field value.
    pub fn call(&self, value: Option<&V>) {
        (self.f)(value)
    }
}

impl<V> Clone for Callback<V> {
    fn clone(&self) -> Self {
        Self {
            f: Rc::clone(&self.f),
        }
    }
}

impl<V> PartialEq for Callback<V> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.f, &other.f)
    }
}

impl<V> Eq for Callback<V> {}

impl<V> fmt::Debug for Callback<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("ptr", &Rc::as_ptr(&self.f).cast::<()>())
            .finish()
    }
}

/// One (field, callback) registration.
pub(crate) struct Listener<K, V> {
    pub(crate) key: K,
    pub(crate) callback: Callback<V>,
}

impl<K: Clone, V> Clone for Listener<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            callback: self.callback.clone(),
        }
    }
}

/// Listener registrations in registration order.
pub(crate) struct Listeners<K, V> {
    entries: Vec<Listener<K, V>>,
}

impl<K: Key, V> Listeners<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `callback` on `key`, dropping an earlier registration of the
    /// exact same pair first.
    pub(crate) fn subscribe(&mut self, key: K, callback: Callback<V>) {
        self.entries
            .retain(|entry| !(entry.key == key && entry.callback == callback));
        self.entries.push(Listener { key, callback });
    }

    /// Remove every registration that shares the key OR the callback with
    /// the given pair. Returns how many registrations were removed.
    pub(crate) fn unsubscribe(&mut self, key: &K, callback: &Callback<V>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.key != *key && entry.callback != *callback);
        before - self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Registrations whose key is in `changed`, in registration order.
    pub(crate) fn matching(&self, changed: &[K]) -> Vec<Listener<K, V>> {
        self.entries
            .iter()
            .filter(|entry| changed.contains(&entry.key))
            .cloned()
            .collect()
    }
}

/// Handle returned by [`KeyedStore::subscribe`].
///
/// Holds the exact (field, callback) pair it was created for. Dropping the
/// handle leaves the registration in place; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
pub struct Subscription<K, V> {
    key: K,
    callback: Callback<V>,
    store: Weak<Shared<K, V>>,
}

impl<K: Key, V: FieldValue> Subscription<K, V> {
    pub(crate) fn new(key: K, callback: Callback<V>, store: &KeyedStore<K, V>) -> Self {
        Self {
            key,
            callback,
            store: store.downgrade(),
        }
    }

    /// The field this subscription was registered on.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Remove the registration through the store's unsubscribe rule.
    ///
    /// Does nothing when the store has already been dropped or destroyed.
    pub fn unsubscribe(self) {
        if let Some(store) = KeyedStore::upgrade(&self.store) {
            if let Err(err) = store.unsubscribe(&self.key, &self.callback) {
                tracing::debug!(key = ?self.key, %err, "unsubscribe on unavailable store");
            }
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Subscription<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("callback", &self.callback)
            .finish()
    }
}
