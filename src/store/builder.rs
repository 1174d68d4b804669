use super::store::KeyedStore;
use super::value::FieldValue;
use super::{Key, Record};

/// Builder for a [`KeyedStore`].
///
/// # Examples
///
/// ```
/// use keyed_store::{KeyedStore, Record};
///
/// let store = KeyedStore::builder()
///     .label("settings")
///     .defaults(Record::from([("volume", 50_u8)]))
///     .build();
///
/// assert_eq!(store.label(), Some("settings"));
/// assert_eq!(store.get(&"volume").unwrap(), Some(50));
/// ```
#[derive(Debug)]
pub struct StoreBuilder<K, V> {
    defaults: Option<Record<K, V>>,
    label: Option<String>,
}

impl<K: Key, V: FieldValue> StoreBuilder<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            defaults: None,
            label: None,
        }
    }

    /// Default snapshot the store starts from and restores to.
    pub fn defaults(mut self, defaults: Record<K, V>) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Label attached to the store's log events.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build the store.
    pub fn build(self) -> KeyedStore<K, V> {
        KeyedStore::from_parts(self.defaults.as_ref(), self.label)
    }
}

impl<K: Key, V: FieldValue> Default for StoreBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_without_options_matches_new() {
        let store: KeyedStore<&str, i32> = StoreBuilder::new().build();
        assert_eq!(store.label(), None);
        assert!(store.is_empty().unwrap());
        assert_eq!(store.default_snapshot().unwrap(), None);
    }

    #[test]
    fn builder_defaults_are_restorable() {
        let store = KeyedStore::builder()
            .defaults(Record::from([("a", 1)]))
            .build();
        store.set("a", 2).unwrap();
        store.restore_default(None).unwrap();
        assert_eq!(store.get(&"a").unwrap(), Some(1));
    }
}
