use std::{any::Any, error::Error as StdError, sync::Arc, time::Duration};

/// The completed state of a future.
pub type Outcome<T> = Result<T, Failure>;

/// Why a future did not produce a value.
///
/// A `Failure` is shared by every holder of the future, so it is cheap to
/// clone: payloads live behind an `Arc`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Failure {
    /// The task or a combinator function panicked.
    #[error("task panicked: {0}")]
    Panic(Arc<str>),
    /// A fallible task returned an error, or a producer rejected the future.
    #[error(transparent)]
    Error(Arc<dyn StdError + Send + Sync + 'static>),
    /// The producer was dropped before completing the future.
    #[error("producer dropped without completing the future")]
    ProducerDropped,
    /// `filter` was given a value its predicate refused.
    #[error("future value rejected by filter predicate")]
    Rejected,
}

impl Failure {
    pub fn new<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Failure::Error(Arc::new(err))
    }

    /// Builds a `Failure::Panic` from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Failure::Panic(panic_message(payload.as_ref()).into())
    }

    /// Returns the wrapped error if it is of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Failure::Error(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Failure::Panic(_))
    }
}

/// Error returned by the blocking wait on a future.
#[derive(Debug, thiserror::Error)]
pub enum AwaitError {
    #[error("future not completed within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Failed(#[from] Failure),
}

/// Error building a [`ThreadPool`](crate::ThreadPool).
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("thread pool needs at least one worker")]
    NoWorkers,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[derive(Debug, thiserror::Error)]
    #[error("other")]
    struct Other;

    #[test]
    fn test_downcast_matches_only_the_wrapped_kind() {
        let failure = Failure::new(Boom);
        assert!(failure.downcast_ref::<Boom>().is_some());
        assert!(failure.downcast_ref::<Other>().is_none());
        assert!(Failure::ProducerDropped.downcast_ref::<Boom>().is_none());
    }

    #[test]
    fn test_panic_payloads() {
        let failure = Failure::from_panic(Box::new("static message"));
        assert!(failure.is_panic());
        assert_eq!(failure.to_string(), "task panicked: static message");

        let failure = Failure::from_panic(Box::new(String::from("owned")));
        assert_eq!(failure.to_string(), "task panicked: owned");

        let failure = Failure::from_panic(Box::new(17u8));
        assert_eq!(failure.to_string(), "task panicked: non-string panic payload");
    }

    #[test]
    fn test_transparent_display() {
        assert_eq!(Failure::new(Boom).to_string(), "boom");
        let err: AwaitError = Failure::new(Boom).into();
        assert_eq!(err.to_string(), "boom");
    }
}
