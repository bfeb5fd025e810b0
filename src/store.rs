//! Latest-value cells shared between actors.
//!
//! A [`SharedCell`] holds an `Arc<T>`. Writers build a complete new value
//! and swap the pointer; readers clone the `Arc` and keep a snapshot that can
//! never be observed half-written. The lock is only held for the pointer
//! copy, never across I/O.

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::sample::WeatherSample;

struct Slot<T> {
    value: Arc<T>,
    generation: u64,
}

pub struct SharedCell<T> {
    slot: Mutex<CriticalSectionRawMutex, RefCell<Slot<T>>>,
}

impl<T> SharedCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            slot: Mutex::new(RefCell::new(Slot {
                value: Arc::new(initial),
                generation: 0,
            })),
        }
    }

    /// Snapshot of the current value.
    pub fn load(&self) -> Arc<T> {
        self.slot.lock(|s| Arc::clone(&s.borrow().value))
    }

    /// Publish a new value and return the shared handle to it.
    pub fn replace(&self, value: T) -> Arc<T> {
        let next = Arc::new(value);
        let previous = self.slot.lock(|s| {
            let mut s = s.borrow_mut();
            s.generation = s.generation.wrapping_add(1);
            core::mem::replace(&mut s.value, Arc::clone(&next))
        });
        // Last reference may be released here, outside the critical section.
        drop(previous);
        next
    }

    /// Number of replacements since construction.
    pub fn generation(&self) -> u64 {
        self.slot.lock(|s| s.borrow().generation)
    }
}

impl<T: Default> Default for SharedCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// The most recent complete weather sample.
pub type SampleStore = SharedCell<WeatherSample>;
