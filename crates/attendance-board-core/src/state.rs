//! Observable state container.
//!
//! A single-owner mutable value with listeners that see the new state after
//! every accepted update. The board and the modal store both sit behind one.

use std::fmt;

/// Handle returned by [`StateContainer::subscribe`].
pub type SubscriptionId = u64;

type Listener<T> = Box<dyn Fn(&T) + Send>;

pub struct StateContainer<T> {
    state: T,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
    next_id: SubscriptionId,
}

impl<T> StateContainer<T> {
    pub fn new(initial: T) -> Self {
        Self {
            state: initial,
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    /// Current state.
    pub fn get_state(&self) -> &T {
        &self.state
    }

    /// Apply `updater` and notify listeners.
    pub fn set_state<R>(&mut self, updater: impl FnOnce(&mut T) -> R) -> R {
        let out = updater(&mut self.state);
        self.notify();
        out
    }

    /// Apply a fallible update. Listeners are only notified on success.
    ///
    /// The updater must leave the state untouched when it fails.
    pub fn try_set_state<R, E>(
        &mut self,
        updater: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Result<R, E> {
        let out = updater(&mut self.state)?;
        self.notify();
        Ok(out)
    }

    /// Register a listener.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&self) {
        tracing::trace!(listeners = self.listeners.len(), "notifying subscribers");
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }
}

impl<T: Default> Default for StateContainer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for StateContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateContainer")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_set_state_notifies_with_new_value() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut container = StateContainer::new(0u32);

        let sink = Arc::clone(&seen);
        container.subscribe(move |value| sink.lock().unwrap().push(*value));

        container.set_state(|v| *v += 1);
        container.set_state(|v| *v += 2);

        assert_eq!(*container.get_state(), 3);
        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_failed_update_does_not_notify() {
        let calls = Arc::new(Mutex::new(0));
        let mut container = StateContainer::new(5i32);

        let sink = Arc::clone(&calls);
        container.subscribe(move |_| *sink.lock().unwrap() += 1);

        let result: Result<(), &str> = container.try_set_state(|_| Err("rejected"));
        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let mut container = StateContainer::new(());
        let id = container.subscribe(|_| {});
        assert_eq!(container.listener_count(), 1);
        assert!(container.unsubscribe(id));
        assert!(!container.unsubscribe(id));
        assert_eq!(container.listener_count(), 0);
    }
}
