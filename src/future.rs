use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use crate::cell::Cell;
use crate::error::{AwaitError, Failure, Outcome};
use crate::executor::{default_executor, Executor};

/// Read handle to a value computed concurrently.
///
/// Clones observe the same completion. A `Future` cannot complete itself;
/// that is left to the task that created it or to its
/// [`Producer`](crate::Producer).
///
/// Besides the callback API it implements [`std::future::Future`], yielding
/// the [`Outcome`].
pub struct Future<T> {
    promise: Arc<Cell<T>>,
    executor: Arc<dyn Executor>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Future").finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> Future<T> {
    pub(crate) fn from_cell(promise: Arc<Cell<T>>, executor: Arc<dyn Executor>) -> Self {
        Self { promise, executor }
    }

    /// A future already completed with `value`.
    pub fn successful(value: T) -> Self {
        Self::from_cell(Arc::new(Cell::completed(Ok(value))), default_executor())
    }

    /// A future already failed with `failure`.
    pub fn failed(failure: Failure) -> Self {
        Self::from_cell(Arc::new(Cell::completed(Err(failure))), default_executor())
    }

    /// Runs `task` on `executor`; a panic inside it fails the future.
    pub fn spawn_on<F>(executor: Arc<dyn Executor>, task: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::run_on(executor, move || Ok(task()))
    }

    /// Runs a task that reports failure as a value.
    pub(crate) fn run_on<F>(executor: Arc<dyn Executor>, task: F) -> Self
    where
        F: FnOnce() -> Outcome<T> + Send + 'static,
    {
        let promise = Arc::new(Cell::new());
        let writer = promise.clone();
        executor.execute(Box::new(move || {
            writer.complete(guard(task).and_then(|outcome| outcome));
        }));
        Self::from_cell(promise, executor)
    }

    /// The executor that runs this future's callbacks and derived futures.
    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    pub fn is_completed(&self) -> bool {
        self.promise.is_completed()
    }

    /// The outcome if the future has completed, without blocking.
    pub fn value(&self) -> Option<Outcome<T>> {
        self.promise.get()
    }

    /// Blocks until the future completes or `timeout` elapses.
    ///
    /// Returns the value on success and the captured failure as
    /// [`AwaitError::Failed`]. Meant for tests and program edges; prefer the
    /// combinators elsewhere.
    pub fn await_timeout(&self, timeout: Duration) -> Result<T, AwaitError> {
        match self.promise.wait_timeout(timeout) {
            Some(outcome) => outcome.map_err(AwaitError::Failed),
            None => Err(AwaitError::Timeout(timeout)),
        }
    }

    /// Blocks until the future completes or `timeout` elapses, returning the
    /// outcome as is.
    pub fn await_ready(&self, timeout: Duration) -> Option<Outcome<T>> {
        self.promise.wait_timeout(timeout)
    }

    pub fn is_completed_within(&self, timeout: Duration) -> bool {
        self.promise.wait_timeout(timeout).is_some()
    }

    /// Runs `handler` once with the outcome, on this future's executor.
    pub fn on_complete<F>(&self, handler: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.on_complete_on(self.executor.clone(), handler)
    }

    pub fn on_complete_on<F>(&self, executor: Arc<dyn Executor>, handler: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.promise.subscribe(Box::new(handler), executor)
    }

    /// Runs `f` with the value if the future succeeds.
    pub fn foreach<F>(&self, f: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.on_complete(move |outcome| {
            if let Ok(value) = outcome {
                f(value)
            }
        })
    }
}

impl<T: Clone + Send + 'static> std::future::Future for Future<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.promise.poll_with(cx.waker()) {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

/// Runs `f`, turning a panic into a [`Failure::Panic`].
pub(crate) fn guard<R>(f: impl FnOnce() -> R) -> Outcome<R> {
    catch_unwind(AssertUnwindSafe(f)).map_err(Failure::from_panic)
}
