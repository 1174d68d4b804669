use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::builder::StoreBuilder;
use super::listener::{Callback, Listeners, Subscription};
use super::update::Update;
use super::value::FieldValue;
use super::{copy_record, Key, Record};
use crate::error::{Result, StoreError};

const UNLABELED: &str = "keyed-store";

/// What [`KeyedStore::destroy`] tears down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destroy<K> {
    /// Remove a single field from the live state.
    Record(K),
    /// Release the live state, the listeners and the default snapshot.
    /// Every later call on the store returns [`StoreError::Destroyed`].
    Store,
}

struct Inner<K, V> {
    state: Record<K, V>,
    defaults: Option<Record<K, V>>,
    listeners: Listeners<K, V>,
}

pub(crate) struct Shared<K, V> {
    label: Option<String>,
    // `None` once the store has been destroyed
    inner: RefCell<Option<Inner<K, V>>>,
}

/// A keyed observable store.
///
/// The store holds a record of field → value pairs. Reads and writes go
/// through accessor methods; listeners subscribe to individual fields and are
/// called with the field's new value whenever a notifying set changes it.
///
/// `KeyedStore` is a handle: cloning it gives another handle to the same
/// state. The store is meant for single-threaded use and is neither `Send`
/// nor `Sync`.
///
/// # Examples
///
/// ```
/// use keyed_store::{Callback, KeyedStore, Record};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let store = KeyedStore::with_defaults(&Record::from([("count", 0)]));
///
/// let seen = Rc::new(Cell::new(0));
/// let cb = Callback::new({
///     let seen = seen.clone();
///     move |value: Option<&i32>| seen.set(value.copied().unwrap_or(0))
/// });
/// store.subscribe("count", &cb).unwrap();
///
/// store.update("count", |c| c.copied().unwrap_or(0) + 1).unwrap();
/// assert_eq!(seen.get(), 1);
/// assert_eq!(store.get(&"count").unwrap(), Some(1));
/// ```
pub struct KeyedStore<K, V> {
    shared: Rc<Shared<K, V>>,
}

impl<K: Key, V: FieldValue> KeyedStore<K, V> {
    /// Create an empty store with no default snapshot.
    pub fn new() -> Self {
        Self::from_parts(None, None)
    }

    /// Create a store whose default snapshot is a deep copy of `defaults`,
    /// with the live state populated from it.
    pub fn with_defaults(defaults: &Record<K, V>) -> Self {
        Self::from_parts(Some(defaults), None)
    }

    /// Start configuring a store.
    pub fn builder() -> StoreBuilder<K, V> {
        StoreBuilder::new()
    }

    pub(crate) fn from_parts(defaults: Option<&Record<K, V>>, label: Option<String>) -> Self {
        let defaults = defaults.map(copy_record);
        let state = defaults.as_ref().map(copy_record).unwrap_or_default();

        let store = Self {
            shared: Rc::new(Shared {
                label,
                inner: RefCell::new(Some(Inner {
                    state,
                    defaults,
                    listeners: Listeners::new(),
                })),
            }),
        };

        tracing::debug!(
            store = store.name(),
            fields = store.len().unwrap_or(0),
            "created keyed store"
        );
        store
    }

    pub(crate) fn downgrade(&self) -> Weak<Shared<K, V>> {
        Rc::downgrade(&self.shared)
    }

    pub(crate) fn upgrade(weak: &Weak<Shared<K, V>>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    /// The label this store was built with, if any.
    pub fn label(&self) -> Option<&str> {
        self.shared.label.as_deref()
    }

    fn name(&self) -> &str {
        self.label().unwrap_or(UNLABELED)
    }

    fn with_inner<R>(&self, f: impl FnOnce(&Inner<K, V>) -> R) -> Result<R> {
        let guard = self
            .shared
            .inner
            .try_borrow()
            .map_err(|_| StoreError::Borrowed)?;
        match guard.as_ref() {
            Some(inner) => Ok(f(inner)),
            None => {
                tracing::warn!(store = self.name(), "read from a destroyed store");
                Err(StoreError::Destroyed)
            }
        }
    }

    fn with_inner_mut<R>(&self, f: impl FnOnce(&mut Inner<K, V>) -> R) -> Result<R> {
        let mut guard = self
            .shared
            .inner
            .try_borrow_mut()
            .map_err(|_| StoreError::Borrowed)?;
        match guard.as_mut() {
            Some(inner) => Ok(f(inner)),
            None => {
                tracing::warn!(store = self.name(), "write to a destroyed store");
                Err(StoreError::Destroyed)
            }
        }
    }

    /// Replace the retained default snapshot with a deep copy of `defaults`.
    ///
    /// The live state is left alone. Returns the store so calls can chain.
    pub fn configure_default(&self, defaults: &Record<K, V>) -> Result<&Self> {
        let defaults = copy_record(defaults);
        self.with_inner_mut(|inner| inner.defaults = Some(defaults))?;
        tracing::debug!(store = self.name(), "configured default snapshot");
        Ok(self)
    }

    /// Reset the live state.
    ///
    /// With `Some(defaults)` the state becomes a deep copy of that record,
    /// which is not kept as the new default. With `None` the state becomes a
    /// copy of the configured default snapshot, or empty if none was
    /// configured. Listeners are not notified.
    pub fn restore_default(&self, defaults: Option<&Record<K, V>>) -> Result<()> {
        self.with_inner_mut(|inner| {
            inner.state = match defaults.or(inner.defaults.as_ref()) {
                Some(source) => copy_record(source),
                None => Record::new(),
            };
        })?;
        tracing::debug!(
            store = self.name(),
            explicit = defaults.is_some(),
            "restored default state"
        );
        Ok(())
    }

    /// Borrow the live state directly.
    ///
    /// No copy is made. Writes to the store fail with
    /// [`StoreError::Borrowed`] while the returned reference is alive.
    pub fn get_all(&self) -> Result<Ref<'_, Record<K, V>>> {
        let guard = self
            .shared
            .inner
            .try_borrow()
            .map_err(|_| StoreError::Borrowed)?;
        Ref::filter_map(guard, |inner| inner.as_ref().map(|inner| &inner.state))
            .map_err(|_| StoreError::Destroyed)
    }

    /// Replace the whole live state with a deep copy of `data`.
    ///
    /// Listeners are not notified.
    pub fn set_all(&self, data: &Record<K, V>) -> Result<()> {
        let data = copy_record(data);
        self.with_inner_mut(|inner| inner.state = data)
    }

    /// The current value of a field, or `None` if it was never set.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.with_inner(|inner| inner.state.get(key).map(FieldValue::deep_copy))
    }

    /// The current values of several fields, in the order requested.
    pub fn get_many(&self, keys: &[K]) -> Result<Vec<(K, Option<V>)>> {
        self.with_inner(|inner| {
            keys.iter()
                .map(|key| (key.clone(), inner.state.get(key).map(FieldValue::deep_copy)))
                .collect()
        })
    }

    /// Set a single field to `value`.
    ///
    /// Listeners on the field fire only when the new value is not identical
    /// to the old one (see [`FieldValue::is_identical`]). Returns whether the
    /// field changed.
    pub fn set(&self, key: K, value: V) -> Result<bool> {
        self.apply(key, Update::Literal(value))
    }

    /// Set a single field from its current value.
    ///
    /// The updater receives a `Clone` of the stored value, or `None` when the
    /// field was never set. Same change rule as [`set`](Self::set): with
    /// `Rc` values, returning the received handle leaves the field unchanged
    /// and fires no listener.
    pub fn update<F>(&self, key: K, f: F) -> Result<bool>
    where
        F: FnOnce(Option<&V>) -> V + 'static,
    {
        self.apply(key, Update::with(f))
    }

    /// Single-key set with an explicit [`Update`] payload.
    pub fn apply(&self, key: K, update: Update<V>) -> Result<bool> {
        // updaters get a shallow `Clone` of the stored value, so an updater
        // that hands back its input keeps the stored identity
        let current = match &update {
            Update::Literal(_) => None,
            Update::Updater(_) => self.with_inner(|inner| inner.state.get(&key).cloned())?,
        };
        let new_value = update.resolve(current.as_ref());

        let changed = self.with_inner_mut(|inner| {
            let changed = inner
                .state
                .get(&key)
                .map_or(true, |old| !new_value.is_identical(old));
            inner.state.insert(key.clone(), new_value.deep_copy());
            changed
        })?;

        if changed {
            self.notify(std::slice::from_ref(&key))?;
        }
        Ok(changed)
    }

    /// Apply several fields, each through the single-key path.
    ///
    /// Entries are applied in iteration order. Returns how many fields
    /// changed.
    pub fn set_record<I>(&self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut changed = 0;
        for (key, value) in entries {
            if self.set(key, value)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Mass-update several fields with one callback.
    ///
    /// The callback receives a record holding the current values of `keys`
    /// (fields never set are absent) and returns the new values. The result
    /// is merged into the state, and the listeners of every key in `keys`
    /// fire whether or not its value differs.
    pub fn set_many<F>(&self, keys: &[K], f: F) -> Result<()>
    where
        F: FnOnce(Record<K, V>) -> Record<K, V>,
    {
        let picked = self.with_inner(|inner| {
            keys.iter()
                .filter_map(|key| {
                    inner
                        .state
                        .get(key)
                        .map(|value| (key.clone(), value.deep_copy()))
                })
                .collect::<Record<K, V>>()
        })?;

        let result = f(picked);

        self.with_inner_mut(|inner| {
            for (key, value) in result {
                inner.state.insert(key, value.deep_copy());
            }
        })?;

        self.notify(keys)
    }

    /// Register `callback` on `key`.
    ///
    /// A registration of the same callback on the same key is replaced, so a
    /// callback fires at most once per change of a field. The returned
    /// [`Subscription`] removes this pair again.
    pub fn subscribe(&self, key: K, callback: &Callback<V>) -> Result<Subscription<K, V>> {
        self.with_inner_mut(|inner| inner.listeners.subscribe(key.clone(), callback.clone()))?;
        tracing::trace!(store = self.name(), key = ?key, "subscribed listener");
        Ok(Subscription::new(key, callback.clone(), self))
    }

    /// Remove listener registrations.
    ///
    /// Every registration that shares the key *or* the callback with the
    /// given pair is removed: a callback subscribed to several fields is
    /// dropped from all of them, and every other callback on `key` is
    /// dropped too. Nothing happens when no registration matches.
    pub fn unsubscribe(&self, key: &K, callback: &Callback<V>) -> Result<()> {
        let removed = self.with_inner_mut(|inner| inner.listeners.unsubscribe(key, callback))?;
        tracing::trace!(store = self.name(), key = ?key, removed, "unsubscribed listener");
        Ok(())
    }

    /// Reset the live state to an empty record.
    ///
    /// Listeners and the default snapshot are kept.
    pub fn clear_store(&self) -> Result<()> {
        self.with_inner_mut(|inner| inner.state.clear())?;
        tracing::debug!(store = self.name(), "cleared state");
        Ok(())
    }

    /// Remove every listener registration.
    pub fn clear_listeners(&self) -> Result<()> {
        self.with_inner_mut(|inner| inner.listeners.clear())?;
        tracing::debug!(store = self.name(), "cleared listeners");
        Ok(())
    }

    /// Remove a field, or tear down the whole store.
    ///
    /// For [`Destroy::Record`] returns whether the field was present. For
    /// [`Destroy::Store`] returns `true`; the store is unusable afterwards.
    pub fn destroy(&self, target: Destroy<K>) -> Result<bool> {
        match target {
            Destroy::Record(key) => {
                let present = self.with_inner_mut(|inner| inner.state.remove(&key).is_some())?;
                tracing::debug!(store = self.name(), key = ?key, present, "removed field");
                Ok(present)
            }
            Destroy::Store => {
                let mut guard = self
                    .shared
                    .inner
                    .try_borrow_mut()
                    .map_err(|_| StoreError::Borrowed)?;
                if guard.take().is_none() {
                    return Err(StoreError::Destroyed);
                }
                drop(guard);
                tracing::debug!(store = self.name(), "destroyed store");
                Ok(true)
            }
        }
    }

    /// Call the listeners registered on any of the `changed` keys.
    ///
    /// Registrations are snapshotted up front, in registration order. Each
    /// callback receives the value its field holds at the moment it is
    /// called (`None` if the field is unset), and no borrow is held while it runs, so callbacks may write
    /// back to the store.
    fn notify(&self, changed: &[K]) -> Result<()> {
        let listeners = self.with_inner(|inner| inner.listeners.matching(changed))?;
        tracing::trace!(
            store = self.name(),
            keys = ?changed,
            listeners = listeners.len(),
            "notifying listeners"
        );

        for listener in listeners {
            let value = match self.get(&listener.key) {
                Ok(value) => value,
                Err(StoreError::Destroyed) => {
                    tracing::debug!(store = self.name(), "store destroyed during notification");
                    return Ok(());
                }
                Err(err) => return Err(err),
            };
            listener.callback.call(value.as_ref());
        }
        Ok(())
    }

    /// A deep copy of the live state.
    pub fn snapshot(&self) -> Result<Record<K, V>> {
        self.with_inner(|inner| copy_record(&inner.state))
    }

    /// A deep copy of the configured default snapshot, if any.
    pub fn default_snapshot(&self) -> Result<Option<Record<K, V>>> {
        self.with_inner(|inner| inner.defaults.as_ref().map(copy_record))
    }

    /// Whether the field currently holds a value.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        self.with_inner(|inner| inner.state.contains_key(key))
    }

    /// Number of fields holding a value.
    pub fn len(&self) -> Result<usize> {
        self.with_inner(|inner| inner.state.len())
    }

    /// Whether no field holds a value.
    pub fn is_empty(&self) -> Result<bool> {
        self.with_inner(|inner| inner.state.is_empty())
    }

    /// Number of listener registrations.
    pub fn listener_count(&self) -> Result<usize> {
        self.with_inner(|inner| inner.listeners.len())
    }

    /// Whether [`Destroy::Store`] has been applied.
    pub fn is_destroyed(&self) -> bool {
        matches!(self.shared.inner.try_borrow().as_deref(), Ok(None))
    }
}

impl<K: Key, V: FieldValue> Default for KeyedStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for KeyedStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<K: Key, V: FieldValue> fmt::Debug for KeyedStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("KeyedStore");
        out.field("label", &self.label());
        match self.shared.inner.try_borrow() {
            Ok(guard) => match guard.as_ref() {
                Some(inner) => out
                    .field("state", &inner.state)
                    .field("listeners", &inner.listeners.len()),
                None => out.field("destroyed", &true),
            },
            Err(_) => out.field("state", &"<borrowed>"),
        };
        out.finish()
    }
}
