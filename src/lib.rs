//! Write-once futures computed on a pluggable executor.
//!
//! A [`Future`] is a placeholder for a value computed concurrently. It
//! completes exactly once, with a value or a [`Failure`], and is composed
//! without blocking through `map`, `flat_map`, `recover`, `and_then` and
//! friends. [`Future::await_timeout`] is the blocking escape hatch.
//!
//! ```
//! use future_out::spawn;
//! use std::time::Duration;
//!
//! let a = spawn(|| 2);
//! let b = spawn(|| 4);
//! let product = a.flat_map(move |x| b.map(move |y| x * y));
//! assert_eq!(product.await_timeout(Duration::from_secs(1)).unwrap(), 8);
//! ```
use std::error::Error as StdError;
use std::sync::Arc;

mod cell;
mod combinators;
pub mod config;
mod error;
pub mod executor;
mod future;
mod producer;
mod thread_pool;

pub use combinators::sequence;
pub use config::PoolConfig;
pub use error::{AwaitError, Failure, Outcome, PoolError};
pub use executor::{default_executor, Executor, Inline, Job};
pub use future::Future;
pub use producer::Producer;
pub use thread_pool::ThreadPool;

/// The write side of a promise: create it together with its waiter, then
/// complete it once.
pub trait Promise {
    type Output;
    type Waiter;

    fn new() -> (Self, Self::Waiter)
    where
        Self: Sized;
    fn resolve(self, value: Self::Output);
    fn reject(self, failure: Failure);
}

/// Runs `task` on the default executor and returns its future.
pub fn spawn<T, F>(task: F) -> Future<T>
where
    T: Clone + Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    Future::spawn_on(default_executor(), task)
}

pub fn spawn_on<T, F>(executor: Arc<dyn Executor>, task: F) -> Future<T>
where
    T: Clone + Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    Future::spawn_on(executor, task)
}

/// Runs a fallible `task` on the default executor; `Err(e)` fails the
/// future with [`Failure::Error`].
pub fn try_spawn<T, E, F>(task: F) -> Future<T>
where
    T: Clone + Send + 'static,
    E: StdError + Send + Sync + 'static,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    try_spawn_on(default_executor(), task)
}

pub fn try_spawn_on<T, E, F>(executor: Arc<dyn Executor>, task: F) -> Future<T>
where
    T: Clone + Send + 'static,
    E: StdError + Send + Sync + 'static,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    Future::run_on(executor, move || task().map_err(Failure::new))
}
