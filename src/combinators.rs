//! Non-blocking composition. Every combinator registers a continuation on the
//! parent and returns a new [`Future`] right away; the new future runs its
//! callbacks on the parent's executor.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Failure, Outcome};
use crate::future::{guard, Future};
use crate::producer::Producer;

impl<T: Clone + Send + 'static> Future<T> {
    fn derive<U: Clone + Send + 'static>(&self) -> (Producer<U>, Future<U>) {
        Producer::with_executor(self.executor().clone())
    }

    /// Applies `f` to the value. A failed parent propagates unchanged; a
    /// panic in `f` fails the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use future_out::spawn;
    /// use std::time::Duration;
    /// let doubled = spawn(|| 1).map(|n| n * 2);
    /// assert_eq!(doubled.await_timeout(Duration::from_secs(1)).unwrap(), 2);
    /// ```
    pub fn map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let (producer, future) = self.derive();
        self.on_complete(move |outcome| {
            producer.complete(outcome.and_then(|value| guard(move || f(value))))
        });
        future
    }

    /// Chains a dependent asynchronous step; the result completes with the
    /// future `f` returns.
    pub fn flat_map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Future<U> + Send + 'static,
    {
        let (producer, future) = self.derive();
        self.on_complete(move |outcome| match outcome.and_then(|value| guard(move || f(value))) {
            Ok(inner) => inner.on_complete(move |outcome| producer.complete(outcome)),
            Err(failure) => producer.complete(Err(failure)),
        });
        future
    }

    /// Turns a failure into a value when `f` returns `Some`. On `None` the
    /// original failure propagates; a successful parent passes through.
    ///
    /// # Examples
    ///
    /// ```
    /// use future_out::spawn;
    /// use std::hint::black_box;
    /// use std::time::Duration;
    /// let divided = spawn(|| 2 / black_box(0)).recover(|_| Some(0));
    /// assert_eq!(divided.await_timeout(Duration::from_secs(1)).unwrap(), 0);
    /// ```
    pub fn recover<F>(&self, f: F) -> Future<T>
    where
        F: FnOnce(&Failure) -> Option<T> + Send + 'static,
    {
        let (producer, future) = self.derive();
        self.on_complete(move |outcome| {
            producer.complete(match outcome {
                Ok(value) => Ok(value),
                Err(failure) => match guard(|| f(&failure)) {
                    Ok(Some(value)) => Ok(value),
                    Ok(None) => Err(failure),
                    Err(panic) => Err(panic),
                },
            })
        });
        future
    }

    /// Like [`Future::recover`], with the handler supplying a future.
    pub fn recover_with<F>(&self, f: F) -> Future<T>
    where
        F: FnOnce(&Failure) -> Option<Future<T>> + Send + 'static,
    {
        let (producer, future) = self.derive();
        self.on_complete(move |outcome| match outcome {
            Ok(value) => producer.complete(Ok(value)),
            Err(failure) => match guard(|| f(&failure)) {
                Ok(Some(inner)) => inner.on_complete(move |outcome| producer.complete(outcome)),
                Ok(None) => producer.complete(Err(failure)),
                Err(panic) => producer.complete(Err(panic)),
            },
        });
        future
    }

    /// Runs the side effect `f` with the outcome, then completes with that
    /// same outcome. Whatever `f` computes is discarded, and so is a panic
    /// raised by it.
    ///
    /// # Examples
    ///
    /// ```
    /// use future_out::spawn;
    /// use std::time::Duration;
    /// let n = spawn(|| 3)
    ///     .and_then(|n| { let _ = n.as_ref().map(|n| n * 2); })
    ///     .and_then(|n| { let _ = n.as_ref().map(|n| n * 2); });
    /// assert_eq!(n.await_timeout(Duration::from_secs(1)).unwrap(), 3);
    /// ```
    pub fn and_then<F>(&self, f: F) -> Future<T>
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        let (producer, future) = self.derive();
        self.on_complete(move |outcome| {
            if let Err(panic) = guard(|| f(&outcome)) {
                log::warn!("and_then side effect discarded: {panic}");
            }
            producer.complete(outcome)
        });
        future
    }

    /// This future's value, or `other`'s if this one fails. When both fail
    /// the failure of `self` wins.
    pub fn fallback_to(&self, other: Future<T>) -> Future<T> {
        let (producer, future) = self.derive();
        self.on_complete(move |outcome| match outcome {
            Ok(value) => producer.complete(Ok(value)),
            Err(failure) => other.on_complete(move |fallback| {
                producer.complete(fallback.or(Err(failure)))
            }),
        });
        future
    }

    /// Fails with [`Failure::Rejected`] when `pred` refuses the value.
    pub fn filter<F>(&self, pred: F) -> Future<T>
    where
        F: FnOnce(&T) -> bool + Send + 'static,
    {
        let (producer, future) = self.derive();
        self.on_complete(move |outcome| {
            producer.complete(outcome.and_then(|value| match guard(|| pred(&value)) {
                Ok(true) => Ok(value),
                Ok(false) => Err(Failure::Rejected),
                Err(panic) => Err(panic),
            }))
        });
        future
    }

    /// Pairs both values. If both fail, the failure of `self` is reported.
    pub fn zip<U>(&self, other: &Future<U>) -> Future<(T, U)>
    where
        U: Clone + Send + 'static,
    {
        let other = other.clone();
        self.flat_map(move |left| other.map(move |right| (left, right)))
    }
}

/// Collects the values of `futures` in order, or fails with the first
/// failure in input order.
pub fn sequence<T, I>(futures: I) -> Future<Vec<T>>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    let futures: Vec<Future<T>> = futures.into_iter().collect();
    let Some(first) = futures.first() else {
        return Future::successful(Vec::new());
    };
    let (producer, future) = Producer::with_executor(first.executor().clone());
    let gather = Arc::new(Mutex::new(Gather {
        slots: (0..futures.len()).map(|_| None).collect(),
        next: 0,
        producer: Some(producer),
    }));
    for (index, input) in futures.iter().enumerate() {
        let gather = gather.clone();
        input.on_complete(move |outcome| {
            let settled = gather
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .fill(index, outcome);
            if let Some((producer, outcome)) = settled {
                producer.complete(outcome)
            }
        });
    }
    future
}

/// Shared accumulator for [`sequence`]. Values are moved in once and out
/// once; `next` is the first slot not yet known to hold a value.
struct Gather<T: Clone + Send + 'static> {
    slots: Vec<Option<Outcome<T>>>,
    next: usize,
    producer: Option<Producer<Vec<T>>>,
}

impl<T: Clone + Send + 'static> Gather<T> {
    /// Stores one outcome. Returns the producer and the final outcome once
    /// every slot before the first failure, or every slot, is filled.
    fn fill(&mut self, index: usize, outcome: Outcome<T>) -> Option<(Producer<Vec<T>>, Outcome<Vec<T>>)> {
        self.slots[index] = Some(outcome);
        while let Some(Some(slot)) = self.slots.get(self.next) {
            if let Err(failure) = slot {
                let failure = failure.clone();
                return self.producer.take().map(|producer| (producer, Err(failure)));
            }
            self.next += 1;
        }
        if self.next < self.slots.len() {
            return None;
        }
        let values = self
            .slots
            .drain(..)
            .filter_map(|slot| slot.and_then(Result::ok))
            .collect();
        self.producer.take().map(|producer| (producer, Ok(values)))
    }
}
