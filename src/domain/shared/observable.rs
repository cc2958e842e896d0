//! Current-value observables
//!
//! A value with a single writer and any number of readers. Readers can ask
//! for the present value at any time, or subscribe to a stream that yields
//! the present value first and every later change after it.

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Writable side, owned by whoever serializes mutations
#[derive(Debug)]
pub struct ObservableValue<T> {
    tx: watch::Sender<T>,
}

impl<T> ObservableValue<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Publish a new value. Returns `false` when it equals the current one,
    /// in which case subscribers are not woken.
    pub fn set(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    /// Read-only handle that can be shared freely across tasks
    pub fn watcher(&self) -> ValueWatcher<T> {
        ValueWatcher {
            rx: self.tx.subscribe(),
        }
    }
}

impl<T> Default for ObservableValue<T>
where
    T: Default + Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Read-only side of an [`ObservableValue`]
#[derive(Debug, Clone)]
pub struct ValueWatcher<T> {
    rx: watch::Receiver<T>,
}

impl<T> ValueWatcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Stream of values starting with the current one
    pub fn subscribe(&self) -> WatchStream<T> {
        WatchStream::new(self.rx.clone())
    }
}
