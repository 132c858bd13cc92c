use std::error::Error as StdError;
use std::sync::Arc;

use crate::cell::Cell;
use crate::error::{Failure, Outcome};
use crate::executor::{default_executor, Executor};
use crate::future::Future;
use crate::Promise;

/// The write side of a [`Future`]. Completing consumes the producer, so a
/// future is completed at most once through it.
///
/// # Examples
///
/// ```
/// use future_out::{Producer, Promise};
/// use futures::executor::block_on;
/// use std::thread;
/// let (promise, future) = Producer::<String>::new();
///
/// let task1 = thread::spawn(move || block_on(async {
///     println!("Received {:?}", future.await);
/// }));
/// promise.resolve("Hi".into());
/// task1.join().expect("The task1 thread has panicked.");
/// ```
pub struct Producer<T: Clone + Send + 'static> {
    promise: Option<Arc<Cell<T>>>,
}

impl<T: Clone + Send + 'static> Producer<T> {
    /// A producer whose future runs its callbacks on `executor`.
    pub fn with_executor(executor: Arc<dyn Executor>) -> (Self, Future<T>) {
        let cell = Arc::new(Cell::new());
        (
            Self {
                promise: Some(cell.clone()),
            },
            Future::from_cell(cell, executor),
        )
    }

    pub fn complete(mut self, outcome: Outcome<T>) {
        if let Some(promise) = self.promise.take() {
            promise.complete(outcome);
        }
    }

    /// Rejects with an arbitrary error value.
    pub fn fail<E>(self, err: E)
    where
        E: StdError + Send + Sync + 'static,
    {
        self.complete(Err(Failure::new(err)))
    }
}

impl<T: Clone + Send + 'static> Promise for Producer<T> {
    type Output = T;
    type Waiter = Future<T>;

    fn new() -> (Self, Self::Waiter) {
        Self::with_executor(default_executor())
    }

    fn resolve(self, value: T) {
        self.complete(Ok(value))
    }

    fn reject(self, failure: Failure) {
        self.complete(Err(failure))
    }
}

impl<T: Clone + Send + 'static> Drop for Producer<T> {
    /// If this is an unresolved producer, fail the future.
    fn drop(&mut self) {
        if let Some(promise) = self.promise.take() {
            promise.complete(Err(Failure::ProducerDropped));
        }
    }
}
