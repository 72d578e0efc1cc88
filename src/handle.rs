//! # Opaque Handles and the Handle Registry
//!
//! Native resources (engine clients, cancellation contexts, output streams)
//! never cross the boundary. The caller holds a [`Handle`]: an opaque 64-bit
//! capability token with no caller-interpretable structure. The resource
//! itself lives in a [`HandleTable`] on this side.
//!
//! ## Design
//!
//! - **Kind safety**: `Handle<K>` carries a phantom kind parameter, so a
//!   client handle cannot be passed where a context handle is expected.
//!   Cross-kind confusion is a compile error, not a lookup miss.
//! - **Generation checking**: the raw value packs a slot index and a
//!   generation counter. Releasing a handle bumps the slot's generation, so
//!   a stale handle presented after release (even one whose slot was reused)
//!   fails with `InvalidHandle` instead of silently aliasing a new resource.
//! - **Bounded tables**: every table has a capacity (see
//!   [`crate::constants`]); a caller that leaks handles exhausts its budget
//!   with a `ResourceExhausted` error rather than this process's memory.
//!
//! Tables are internally locked and hand values out as [`Arc`] clones, so a
//! handle lookup never holds the table lock across an engine operation.

use crate::error::{Error, Result};
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

// =============================================================================
// Handle Kinds
// =============================================================================

/// Marker trait for handle kinds.
///
/// Implemented by uninhabited marker types only; the kind exists purely in
/// the type system and in error messages.
pub trait HandleKind {
    /// Kind name used in error messages and logs.
    const NAME: &'static str;
}

/// Kind marker for engine client handles.
pub enum ClientKind {}

impl HandleKind for ClientKind {
    const NAME: &'static str = "client";
}

/// Kind marker for cancellation context handles.
pub enum ContextKind {}

impl HandleKind for ContextKind {
    const NAME: &'static str = "context";
}

/// Kind marker for output stream handles.
pub enum OutputStreamKind {}

impl HandleKind for OutputStreamKind {
    const NAME: &'static str = "output stream";
}

/// Handle to an engine client registered with a bridge.
pub type ClientHandle = Handle<ClientKind>;
/// Handle to a cancellation context.
pub type ContextHandle = Handle<ContextKind>;
/// Handle to a registered output stream sink.
pub type OutputStreamHandle = Handle<OutputStreamKind>;

// =============================================================================
// Handle
// =============================================================================

/// An opaque capability token referencing a resource in a [`HandleTable`].
///
/// The raw value packs `index << 32 | generation`. Callers must treat it as
/// opaque; the only supported operations are copying it and presenting it
/// back to the table that issued it.
pub struct Handle<K: HandleKind> {
    raw: u64,
    _kind: PhantomData<fn() -> K>,
}

impl<K: HandleKind> Handle<K> {
    pub(crate) fn pack(index: u32, generation: u32) -> Self {
        Self {
            raw: (u64::from(index) << 32) | u64::from(generation),
            _kind: PhantomData,
        }
    }

    /// Reconstructs a handle from a raw value previously obtained via
    /// [`as_raw`](Self::as_raw), e.g. after a round trip through a foreign
    /// runtime that can only carry integers.
    pub fn from_raw(raw: u64) -> Self {
        Self {
            raw,
            _kind: PhantomData,
        }
    }

    /// Returns the raw integer form for transport through a foreign runtime.
    pub fn as_raw(&self) -> u64 {
        self.raw
    }

    fn index(&self) -> u32 {
        (self.raw >> 32) as u32
    }

    fn generation(&self) -> u32 {
        self.raw as u32
    }
}

// Manual impls: deriving would demand K: Clone/Copy/etc. on a marker type.
impl<K: HandleKind> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: HandleKind> Copy for Handle<K> {}

impl<K: HandleKind> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K: HandleKind> Eq for Handle<K> {}

impl<K: HandleKind> std::hash::Hash for Handle<K> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K: HandleKind> std::fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle<{}>({:#x})", K::NAME, self.raw)
    }
}

impl<K: HandleKind> std::fmt::Display for Handle<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.raw)
    }
}

// =============================================================================
// Handle Table
// =============================================================================

struct Slot<T> {
    generation: u32,
    value: Option<Arc<T>>,
}

struct TableInner<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

/// Generation-checked arena mapping handles of kind `K` to resources of
/// type `T`.
pub struct HandleTable<K: HandleKind, T> {
    inner: RwLock<TableInner<T>>,
    capacity: usize,
    _kind: PhantomData<fn() -> K>,
}

impl<K: HandleKind, T> HandleTable<K, T> {
    /// Creates an empty table bounded at `capacity` live entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(TableInner {
                slots: Vec::new(),
                free: Vec::new(),
                live: 0,
            }),
            capacity,
            _kind: PhantomData,
        }
    }

    /// Registers `value` and issues a handle for it.
    pub fn insert(&self, value: T) -> Result<Handle<K>> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if inner.live >= self.capacity {
            return Err(Error::ResourceExhausted {
                kind: K::NAME,
                capacity: self.capacity,
            });
        }

        let index = match inner.free.pop() {
            Some(index) => index,
            None => {
                inner.slots.push(Slot {
                    generation: 1,
                    value: None,
                });
                (inner.slots.len() - 1) as u32
            }
        };

        let slot = &mut inner.slots[index as usize];
        let generation = slot.generation;
        slot.value = Some(Arc::new(value));
        inner.live += 1;

        Ok(Handle::pack(index, generation))
    }

    /// Resolves a handle to its resource.
    ///
    /// Fails with [`Error::InvalidHandle`] for stale, released, or
    /// never-issued handles.
    pub fn get(&self, handle: Handle<K>) -> Result<Arc<T>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        inner
            .slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.clone())
            .ok_or(Error::InvalidHandle {
                kind: K::NAME,
                handle: handle.as_raw(),
            })
    }

    /// Releases a handle, returning the resource.
    ///
    /// The slot's generation is bumped, so the released handle (and any copy
    /// of it) becomes permanently invalid even if the slot is reused.
    pub fn remove(&self, handle: Handle<K>) -> Result<Arc<T>> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let slot = inner
            .slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .ok_or(Error::InvalidHandle {
                kind: K::NAME,
                handle: handle.as_raw(),
            })?;

        let value = slot.value.take().ok_or(Error::InvalidHandle {
            kind: K::NAME,
            handle: handle.as_raw(),
        })?;

        slot.generation = slot.generation.wrapping_add(1);
        inner.free.push(handle.index());
        inner.live -= 1;

        Ok(value)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove_round_trip() {
        let table: HandleTable<ClientKind, String> = HandleTable::new(4);
        let handle = table.insert("resource".to_string()).unwrap();

        assert_eq!(*table.get(handle).unwrap(), "resource");
        assert_eq!(table.len(), 1);

        table.remove(handle).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_stale_handle_rejected_after_slot_reuse() {
        let table: HandleTable<ContextKind, u32> = HandleTable::new(4);
        let first = table.insert(1).unwrap();
        table.remove(first).unwrap();

        // The freed slot is reused but the generation moved on.
        let second = table.insert(2).unwrap();
        assert!(matches!(
            table.get(first),
            Err(Error::InvalidHandle { kind: "context", .. })
        ));
        assert_eq!(*table.get(second).unwrap(), 2);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let table: HandleTable<OutputStreamKind, u8> = HandleTable::new(1);
        let _held = table.insert(0).unwrap();
        assert!(matches!(
            table.insert(1),
            Err(Error::ResourceExhausted { capacity: 1, .. })
        ));
    }
}
