//! # Keyed Store
//!
//! A keyed observable store for reactive state management.
//!
//! A [`KeyedStore`] holds a record of field → value pairs and lets UI code
//! (or anything else living on one thread) read and write individual fields
//! and react to their changes:
//!
//! - Single-key and multi-key reads (`get`, `get_many`, `get_all`)
//! - Single-key, record and mass updates (`set`/`update`, `set_record`, `set_many`)
//! - Per-field listeners with identity-based deduplication (`subscribe`)
//! - A default snapshot the store can be restored to (`configure_default`, `restore_default`)
//!
//! Values are deep-copied on every write through [`FieldValue`], so nothing
//! passed into the store stays aliased with its state.
//!
//! ## Example
//!
//! ```
//! use keyed_store::{Callback, KeyedStore, Record};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let store = KeyedStore::with_defaults(&Record::from([("count", 0), ("count2", 99)]));
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let cb = Callback::new({
//!     let log = log.clone();
//!     move |value: Option<&i32>| log.borrow_mut().push(value.copied())
//! });
//! store.subscribe("count", &cb).unwrap();
//! store.subscribe("count2", &cb).unwrap();
//!
//! // mass updates notify every listed field, changed or not
//! store
//!     .set_many(&["count", "count2"], |mut values| {
//!         *values.get_mut("count").unwrap() += 1;
//!         values
//!     })
//!     .unwrap();
//!
//! assert_eq!(*log.borrow(), vec![Some(1), Some(99)]);
//! ```

pub mod error;
pub mod store;

// Re-export main types for convenience
pub use error::{Result, StoreError};
pub use store::{
    Callback, Destroy, FieldValue, Key, KeyedStore, Record, StoreBuilder, Subscription, Update,
};
