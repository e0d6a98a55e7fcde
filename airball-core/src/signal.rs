//! Change-notified value cells
//!
//! A [`Signal`] holds the latest value of something (a sensor channel, the
//! danger level) and calls its subscribers whenever a different value is
//! published. Subscribing returns a [`Subscription`]; dropping it or calling
//! [`Subscription::cancel`] removes the callback.
//!
//! Callbacks run on the publishing thread after every internal lock has been
//! released, so a callback may read the signal again or publish to another
//! one. Publishers never wait on subscribers beyond the callback itself;
//! slow consumers are expected to hand work off to their own thread.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    name: &'static str,
    value: Mutex<T>,
    listeners: Mutex<Vec<(usize, Callback<T>)>>,
    next_id: AtomicUsize,
}

impl<T> Inner<T> {
    fn listeners(&self) -> MutexGuard<'_, Vec<(usize, Callback<T>)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: usize) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

/// Shared, change-notified value
pub struct Signal<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.inner.value.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Signal")
            .field("name", &self.inner.name)
            .field("value", &*value)
            .finish()
    }
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Create a signal with an initial value
    pub fn new(name: &'static str, initial: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                value: Mutex::new(initial),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicUsize::new(1),
            }),
        }
    }

    /// Name given at creation
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Current value
    pub fn latest(&self) -> T {
        self.inner
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store a value and notify subscribers if it changed
    ///
    /// Returns whether subscribers were notified.
    pub fn publish(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.lock().unwrap_or_else(PoisonError::into_inner);
            if *current == value {
                return false;
            }
            *current = value.clone();
        }

        let listeners: Vec<Callback<T>> = self
            .inner
            .listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(&value);
        }
        true
    }

    /// Register a change callback
    #[must_use = "dropping the subscription cancels it"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners().push((id, Arc::new(callback)));

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.remove(id);
                }
            })),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners().len()
    }
}

/// Handle to a registered callback; cancels on drop
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the callback now
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn notifies_on_change_only() {
        let signal = Signal::new("DANGER_LEVEL", 0.0_f64);
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let _sub = signal.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(signal.publish(1.5));
        assert!(!signal.publish(1.5));
        assert!(signal.publish(2.0));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(signal.latest(), 2.0);
    }

    #[test]
    fn drop_cancels() {
        let signal = Signal::new("IAS", 0_i32);
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let sub = signal.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(signal.subscriber_count(), 1);

        drop(sub);
        assert_eq!(signal.subscriber_count(), 0);
        signal.publish(7);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn explicit_cancel() {
        let signal = Signal::new("AOA", 0_i32);
        let sub = signal.subscribe(|_| {});
        let _other = signal.subscribe(|_| {});
        sub.cancel();
        assert_eq!(signal.subscriber_count(), 1);
    }

    #[test]
    fn callback_may_reenter() {
        let signal = Signal::new("MSG", String::new());
        let seen = Arc::new(Mutex::new(String::new()));
        let (reader, sink) = (signal.clone(), Arc::clone(&seen));
        let _sub = signal.subscribe(move |_| {
            *sink.lock().unwrap() = reader.latest();
        });

        signal.publish("Terrain Alert!".to_string());
        assert_eq!(*seen.lock().unwrap(), "Terrain Alert!");
    }

    #[test]
    fn subscription_outlives_signal() {
        let signal = Signal::new("VS", 0_i32);
        let sub = signal.subscribe(|_| {});
        drop(signal);
        drop(sub);
    }
}
