use std::fmt;

/// Payload for a single-key set.
///
/// Callers pick the variant at the call site: either the literal new value,
/// or an updater that derives the new value from the current one. The
/// updater receives `None` when the field has never been set.
pub enum Update<V> {
    /// Replace the field with this value.
    Literal(V),
    /// Compute the new value from the current one.
    Updater(Box<dyn FnOnce(Option<&V>) -> V>),
}

impl<V> Update<V> {
    /// Wrap a closure as an [`Update::Updater`].
    pub fn with<F>(f: F) -> Self
    where
        F: FnOnce(Option<&V>) -> V + 'static,
    {
        Update::Updater(Box::new(f))
    }

    /// Resolve the payload against the field's current value.
    pub(crate) fn resolve(self, current: Option<&V>) -> V {
        match self {
            Update::Literal(value) => value,
            Update::Updater(f) => f(current),
        }
    }
}

impl<V> From<V> for Update<V> {
    fn from(value: V) -> Self {
        Update::Literal(value)
    }
}

impl<V: fmt::Debug> fmt::Debug for Update<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Update::Updater(_) => f.write_str("Updater(..)"),
        }
    }
}
