use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::rc::Rc;

/// A value that can live in a field of a [`KeyedStore`](crate::KeyedStore).
///
/// The trait carries the two operations the store needs from its values:
///
/// - [`deep_copy`](FieldValue::deep_copy) produces a structurally equal value
///   that shares no mutable substructure with `self`. The store calls it on
///   every write and whenever a default snapshot is configured.
/// - [`is_identical`](FieldValue::is_identical) is the shallow dirty check
///   used by single-key sets. Scalars compare by value. Owned containers
///   never compare identical, because the store always holds its own copy
///   and an incoming container can never be the very same object. Wrap a
///   value in `Rc` to get reference identity: `Clone` hands out the same
///   allocation and `is_identical` compares pointers.
///
/// # Examples
///
/// ```
/// use keyed_store::FieldValue;
///
/// assert!(5_i32.is_identical(&5));
/// assert!(!vec![1, 2].is_identical(&vec![1, 2]));
/// ```
pub trait FieldValue: Clone + Debug + 'static {
    /// Copy the value without sharing any mutable substructure.
    fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Whether `other` counts as the same value for change detection.
    fn is_identical(&self, other: &Self) -> bool;
}

macro_rules! scalar_field_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn is_identical(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

scalar_field_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, String,
    &'static str, ()
);

// NaN is never identical to itself, same as a strict inequality check would report.
impl FieldValue for f32 {
    fn is_identical(&self, other: &Self) -> bool {
        self == other
    }
}

impl FieldValue for f64 {
    fn is_identical(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn deep_copy(&self) -> Self {
        self.as_ref().map(FieldValue::deep_copy)
    }

    fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.is_identical(b),
            _ => false,
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn deep_copy(&self) -> Self {
        self.iter().map(FieldValue::deep_copy).collect()
    }

    fn is_identical(&self, _other: &Self) -> bool {
        false
    }
}

impl<T: FieldValue> FieldValue for HashMap<String, T> {
    fn deep_copy(&self) -> Self {
        self.iter().map(|(k, v)| (k.clone(), v.deep_copy())).collect()
    }

    fn is_identical(&self, _other: &Self) -> bool {
        false
    }
}

impl<T: FieldValue> FieldValue for BTreeMap<String, T> {
    fn deep_copy(&self) -> Self {
        self.iter().map(|(k, v)| (k.clone(), v.deep_copy())).collect()
    }

    fn is_identical(&self, _other: &Self) -> bool {
        false
    }
}

// Shared handle: clones alias, deep copies allocate.
impl<T: FieldValue> FieldValue for Rc<T> {
    fn deep_copy(&self) -> Self {
        Rc::new(T::deep_copy(self))
    }

    fn is_identical(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

#[cfg(feature = "json")]
impl FieldValue for serde_json::Value {
    fn is_identical(&self, other: &Self) -> bool {
        use serde_json::Value;

        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            // arrays and objects are always fresh copies
            _ => false,
        }
    }
}
