//! The write-once completion slot shared by a producer and its futures.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::Waker;
use std::time::Duration;

use crate::error::{panic_message, Outcome};
use crate::executor::Executor;

type Callback<T> = Box<dyn FnOnce(Outcome<T>) + Send + 'static>;

pub(crate) struct Cell<T> {
    state: Mutex<State<T>>,
    signal: Condvar,
}

struct State<T> {
    outcome: Option<Outcome<T>>,
    callbacks: Vec<(Callback<T>, Arc<dyn Executor>)>,
    waker: Vec<Waker>,
}

impl<T: Clone + Send + 'static> Cell<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                outcome: None,
                callbacks: vec![],
                waker: vec![],
            }),
            signal: Condvar::new(),
        }
    }

    pub(crate) fn completed(outcome: Outcome<T>) -> Self {
        let cell = Self::new();
        cell.lock().outcome = Some(outcome);
        cell
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `outcome` unless the slot is already filled. Returns whether
    /// this call completed the cell.
    pub(crate) fn complete(&self, outcome: Outcome<T>) -> bool {
        let (callbacks, waker) = {
            let mut state = self.lock();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome.clone());
            (
                std::mem::take(&mut state.callbacks),
                std::mem::take(&mut state.waker),
            )
        };
        self.signal.notify_all();
        for waker in waker {
            waker.wake()
        }
        for (callback, executor) in callbacks {
            dispatch(callback, outcome.clone(), executor.as_ref());
        }
        true
    }

    /// Schedules `callback` on `executor` once the cell completes, or right
    /// away if it already has.
    pub(crate) fn subscribe(&self, callback: Callback<T>, executor: Arc<dyn Executor>) {
        let outcome = {
            let mut state = self.lock();
            match state.outcome {
                Some(ref outcome) => outcome.clone(),
                None => {
                    state.callbacks.push((callback, executor));
                    return;
                }
            }
        };
        dispatch(callback, outcome, executor.as_ref());
    }

    pub(crate) fn get(&self) -> Option<Outcome<T>> {
        self.lock().outcome.clone()
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.lock().outcome.is_some()
    }

    /// Returns the outcome if one is stored, otherwise remembers `waker`.
    pub(crate) fn poll_with(&self, waker: &Waker) -> Option<Outcome<T>> {
        let mut state = self.lock();
        match state.outcome {
            Some(ref outcome) => Some(outcome.clone()),
            None => {
                if !state.waker.iter().any(|w| w.will_wake(waker)) {
                    state.waker.push(waker.clone());
                }
                None
            }
        }
    }

    /// Blocks the calling thread until completion or `timeout`.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Option<Outcome<T>> {
        let state = self.lock();
        let (state, _) = self
            .signal
            .wait_timeout_while(state, timeout, |state| state.outcome.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        state.outcome.clone()
    }
}

/// Hands `callback` to `executor`. A panicking handler is logged and
/// swallowed so it cannot unwind into the completing thread or starve the
/// handlers after it.
fn dispatch<T: Send + 'static>(callback: Callback<T>, outcome: Outcome<T>, executor: &dyn Executor) {
    executor.execute(Box::new(move || {
        if let Err(cause) = catch_unwind(AssertUnwindSafe(move || callback(outcome))) {
            log::error!("completion handler panicked: {}", panic_message(cause.as_ref()));
        }
    }));
}
