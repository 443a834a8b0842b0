//! Full-snapshot broadcast for reactive surfaces.

use tokio::sync::watch;

/// Holds the latest value of some state and hands it to subscribers.
///
/// Every publish replaces the whole value; subscribers always see a full
/// snapshot, never a delta. Publishing with no subscribers is fine.
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Observable<T> {
    /// Creates an observable holding `initial`.
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replaces the current value and notifies subscribers.
    pub fn publish(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Returns a receiver that starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Returns a copy of the current value.
    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
