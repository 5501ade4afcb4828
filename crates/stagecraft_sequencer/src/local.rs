// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistent locals: values bound once per forward pass of a thread body.
//!
//! Locals are stored type-erased next to the thread that owns them, keyed by
//! the step index that bound them. Each slot can encode itself with bincode so
//! that locals survive a snapshot round trip; restored slots stay encoded until
//! the body first asks for them again with a concrete type.

use crate::cursor::StepIndex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a persistent local.
///
/// Cloning the handle does not clone the value. Mutations made through any
/// handle are seen by later frames.
pub struct Persistent<T>(Rc<RefCell<T>>);

impl<T> Persistent<T> {
    /// Wrap a value that is not stored by any thread
    pub fn detached(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Borrow the value
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrow the value
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Replace the value, returning the old one
    pub fn set(&self, value: T) -> T {
        self.0.replace(value)
    }

    /// Run a closure against the value
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Whether two handles point at the same slot
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Persistent<T> {
    /// Copy of the current value
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T> Clone for Persistent<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Persistent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Persistent").field(&*self.0.borrow()).finish()
    }
}

/// Type-erased view of a bound local
trait ErasedLocal {
    fn as_any(&self) -> &dyn Any;
    fn encode(&self) -> Result<Vec<u8>, bincode::Error>;
}

impl<T: Serialize + 'static> ErasedLocal for Persistent<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&*self.0.borrow())
    }
}

enum LocalSlot {
    /// Bound during this session
    Live(Box<dyn ErasedLocal>),
    /// Restored from a snapshot, not yet claimed by a typed access
    Encoded(Vec<u8>),
}

/// Persistent locals of one thread
#[derive(Default)]
pub(crate) struct LocalStore {
    slots: BTreeMap<StepIndex, LocalSlot>,
}

impl LocalStore {
    /// Rebuild a store from encoded slots
    pub(crate) fn from_encoded(encoded: BTreeMap<StepIndex, Vec<u8>>) -> Self {
        Self {
            slots: encoded
                .into_iter()
                .map(|(step, bytes)| (step, LocalSlot::Encoded(bytes)))
                .collect(),
        }
    }

    /// Bind a fresh value at `step`, replacing any previous slot
    pub(crate) fn bind<T: Serialize + 'static>(&mut self, step: StepIndex, value: T) -> Persistent<T> {
        let handle = Persistent::detached(value);
        self.slots
            .insert(step, LocalSlot::Live(Box::new(handle.clone())));
        handle
    }

    /// Look up the value bound at `step`.
    ///
    /// Returns `None` when nothing is bound, and `Some(Err(_))` when the slot
    /// holds a value of another type or undecodable bytes.
    pub(crate) fn fetch<T>(&mut self, step: StepIndex) -> Option<Result<Persistent<T>, String>>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        let slot = self.slots.get(&step)?;

        let decoded = match slot {
            LocalSlot::Live(erased) => {
                return Some(
                    erased
                        .as_any()
                        .downcast_ref::<Persistent<T>>()
                        .cloned()
                        .ok_or_else(|| {
                            format!("bound as another type than {}", std::any::type_name::<T>())
                        }),
                );
            }
            LocalSlot::Encoded(bytes) => bincode::deserialize::<T>(bytes),
        };

        Some(match decoded {
            Ok(value) => Ok(self.bind(step, value)),
            Err(e) => Err(e.to_string()),
        })
    }

    /// Encode every slot
    pub(crate) fn encode_all(&self) -> Result<BTreeMap<StepIndex, Vec<u8>>, bincode::Error> {
        self.slots
            .iter()
            .map(|(step, slot)| {
                let bytes = match slot {
                    LocalSlot::Live(erased) => erased.encode()?,
                    LocalSlot::Encoded(bytes) => bytes.clone(),
                };
                Ok((*step, bytes))
            })
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

impl fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.slots.keys()).finish()
    }
}
