//! Observable read/write slot.
//!
//! Wraps a `tokio::sync::watch` sender so any number of clones share one
//! value. Writes never fail: the value is stored even when nobody is
//! watching.

use tokio::sync::watch;

pub struct Slot<T> {
    tx: watch::Sender<T>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Slot<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Overwrite the value.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate in place; reports whether `f` changed anything.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        self.tx.send_if_modified(f)
    }

    /// Borrow the current value. Keep the guard short-lived; it blocks writers.
    pub fn read(&self) -> watch::Ref<'_, T> {
        self.tx.borrow()
    }
}

impl<T: Clone> Slot<T> {
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Slot").field(&*self.tx.borrow()).finish()
    }
}
