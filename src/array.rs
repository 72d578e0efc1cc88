//! # Array Transfer
//!
//! [`ValueArray`] is the convention for moving variable-length sequences of
//! records across the boundary: fixed slot count decided at creation, each
//! slot independently owned.
//!
//! ## Ownership Contract
//!
//! - [`ValueArray::set`] transfers ownership of the value **into** the array;
//!   the caller must not touch it afterwards (the move makes this structural).
//! - [`ValueArray::get`] is a borrow; the array keeps ownership and the
//!   borrow ends before the array can be mutated or dropped.
//! - Dropping the array drops every installed element exactly once.
//!
//! Out-of-range access is a checked failure (`OutOfRange`), not undefined
//! behavior: the boundary refuses the access and reports the index and count.

use crate::error::{Error, Result};

/// Fixed-count slot container for transferring sequences across the boundary.
///
/// The count is fixed at creation and never changes; slots start absent and
/// are filled with [`set`](Self::set).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueArray<T> {
    slots: Vec<Option<T>>,
}

impl<T> ValueArray<T> {
    /// Creates an array with `count` absent slots.
    pub fn new(count: usize) -> Self {
        let mut slots = Vec::with_capacity(count);
        slots.resize_with(count, || None);
        Self { slots }
    }

    /// Returns the slot count fixed at creation.
    ///
    /// This is the count, not the number of installed elements.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Installs `value` at `index`, transferring ownership into the array.
    ///
    /// A previously installed value at the same slot is dropped. Fails with
    /// [`Error::IndexOutOfRange`] if `index` is outside `0..len()`.
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        let count = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, count })?;
        *slot = Some(value);
        Ok(())
    }

    /// Borrows the element at `index`.
    ///
    /// Returns `None` for a slot that was never set. Fails with
    /// [`Error::IndexOutOfRange`] if `index` is outside `0..len()`.
    pub fn get(&self, index: usize) -> Result<Option<&T>> {
        let count = self.slots.len();
        self.slots
            .get(index)
            .map(Option::as_ref)
            .ok_or(Error::IndexOutOfRange { index, count })
    }

    /// Iterates over slots in index order; absent slots yield `None`.
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> {
        self.slots.iter().map(Option::as_ref)
    }

    /// Consumes the array, yielding the installed elements in index order
    /// and skipping absent slots.
    pub fn into_elements(self) -> impl Iterator<Item = T> {
        self.slots.into_iter().flatten()
    }
}

/// A fully-populated array: slot `i` holds `values[i]`.
impl<T> From<Vec<T>> for ValueArray<T> {
    fn from(values: Vec<T>) -> Self {
        Self {
            slots: values.into_iter().map(Some).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_array_slots_are_absent() {
        let array: ValueArray<String> = ValueArray::new(3);
        assert_eq!(array.len(), 3);
        for i in 0..3 {
            assert!(array.get(i).unwrap().is_none());
        }
    }

    #[test]
    fn test_out_of_range_is_checked() {
        let mut array: ValueArray<String> = ValueArray::new(2);
        assert!(matches!(
            array.set(2, "x".to_string()),
            Err(Error::IndexOutOfRange { index: 2, count: 2 })
        ));
        assert!(matches!(
            array.get(5),
            Err(Error::IndexOutOfRange { index: 5, count: 2 })
        ));
    }

    #[test]
    fn test_from_vec_is_fully_populated() {
        let array = ValueArray::from(vec![1, 2, 3]);
        assert_eq!(array.len(), 3);
        assert_eq!(array.get(1).unwrap(), Some(&2));
    }
}
