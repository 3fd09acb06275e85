//! Generation-checked handles over per-model arenas
//!
//! Handles are `(model id, slot index, generation)` triples. A handle minted
//! by one model is rejected by every other model, and a handle to a removed
//! entry is rejected even after its slot is reused.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, RuntimeError};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique model identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

impl ModelId {
    /// Allocate a fresh id
    pub fn fresh() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Typed opaque handle
pub struct Handle<T> {
    model: ModelId,
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Model that minted the handle
    pub fn model(&self) -> ModelId {
        self.model
    }

    /// Slot index inside the arena
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model && self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model.hash(state);
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}:{}#{})", self.model.0, self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena owned by one model
#[derive(Debug)]
pub struct Arena<T> {
    model: ModelId,
    what: &'static str,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Arena<T> {
    /// Create an empty arena; `what` names the entries in errors
    pub fn new(model: ModelId, what: &'static str) -> Self {
        Self {
            model,
            what,
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Owning model
    pub fn model(&self) -> ModelId {
        self.model
    }

    /// Store a value and return its handle
    pub fn insert(&mut self, value: T) -> Handle<T> {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].value = Some(value);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.len += 1;
        Handle {
            model: self.model,
            index,
            generation: self.slots[index as usize].generation,
            _marker: PhantomData,
        }
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Slot<T>> {
        if handle.model != self.model {
            return None;
        }
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.value.is_some())
    }

    /// Whether the handle still refers to a live entry
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.slot(handle).is_some()
    }

    /// Borrow the entry behind `handle`
    pub fn get(&self, handle: Handle<T>) -> Result<&T> {
        self.slot(handle)
            .and_then(|slot| slot.value.as_ref())
            .ok_or(RuntimeError::StaleHandle { what: self.what })
    }

    /// Mutably borrow the entry behind `handle`
    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T> {
        if !self.contains(handle) {
            return Err(RuntimeError::StaleHandle { what: self.what });
        }
        self.slots[handle.index as usize]
            .value
            .as_mut()
            .ok_or(RuntimeError::StaleHandle { what: self.what })
    }

    /// Remove the entry; its handle becomes stale
    pub fn remove(&mut self, handle: Handle<T>) -> Result<T> {
        if !self.contains(handle) {
            return Err(RuntimeError::StaleHandle { what: self.what });
        }
        let slot = &mut self.slots[handle.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        slot.value.take().ok_or(RuntimeError::StaleHandle { what: self.what })
    }

    /// Remove every entry matching `pred`, returning how many were removed
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let mut removed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.as_ref().map_or(false, &mut pred) {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                removed += 1;
            }
        }
        self.len -= removed;
        removed
    }

    /// Live entries with their handles, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        let model = self.model;
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    Handle {
                        model,
                        index: index as u32,
                        generation: slot.generation,
                        _marker: PhantomData,
                    },
                    value,
                )
            })
        })
    }

    /// Live entries, mutably, in slot order
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|slot| slot.value.as_mut())
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena holds no live entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
