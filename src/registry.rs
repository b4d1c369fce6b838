//! Bounded, insertion-ordered consumer registry.
//!
//! Every fan-out point of the runtime (connectivity events, UUID providers,
//! button presses) is a `Registry` of borrowed consumer references with a
//! compile-time capacity. Slots are never freed; registration order is the
//! fan-out order.

use crate::error::{Error, RegistryKind};
use heapless::Vec;

pub struct Registry<T, const N: usize> {
    slots: Vec<T, N>,
    kind: RegistryKind,
}

impl<T, const N: usize> Registry<T, N> {
    /// Create an empty registry. `kind` tags the `RegistryFull` error.
    pub const fn new(kind: RegistryKind) -> Self {
        Self {
            slots: Vec::new(),
            kind,
        }
    }

    /// Append a consumer to the first free slot.
    pub fn register(&mut self, consumer: T) -> Result<(), Error> {
        self.slots
            .push(consumer)
            .map_err(|_| Error::RegistryFull(self.kind))
    }

    /// True if any occupied slot satisfies `f`.
    pub fn contains_by(&self, f: impl FnMut(&T) -> bool) -> bool {
        self.slots.iter().any(f)
    }

    /// Occupied slots in registration order.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.slots.iter()
    }

}
