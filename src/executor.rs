//! Execution contexts: where tasks and completion handlers run.

use std::sync::{Arc, LazyLock};

use crate::{config::PoolConfig, thread_pool::ThreadPool};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted jobs. Implementations decide on which thread.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

/// Runs every job immediately on the submitting thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inline;

impl Executor for Inline {
    fn execute(&self, job: Job) {
        job()
    }
}

static DEFAULT_EXECUTOR: LazyLock<Arc<dyn Executor>> =
    LazyLock::new(|| match ThreadPool::new(PoolConfig::from_env()) {
        Ok(pool) => Arc::new(pool),
        Err(err) => {
            log::error!("default thread pool unavailable, running jobs inline: {err}");
            Arc::new(Inline)
        }
    });

/// The process-wide pool used by [`spawn`](crate::spawn) and
/// [`Producer::new`](crate::Producer).
pub fn default_executor() -> Arc<dyn Executor> {
    DEFAULT_EXECUTOR.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_inline_runs_on_caller() {
        let caller = std::thread::current().id();
        let (tx, rx) = channel();
        Inline.execute(Box::new(move || tx.send(std::thread::current().id()).unwrap()));
        assert_eq!(rx.try_recv().unwrap(), caller);
    }

    #[test]
    fn test_default_executor_runs_jobs() {
        let (tx, rx) = channel();
        default_executor().execute(Box::new(move || tx.send(42).unwrap()));
        assert_eq!(rx.recv().unwrap(), 42);
    }
}
