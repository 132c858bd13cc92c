use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::config::PoolConfig;
use crate::error::{panic_message, PoolError};
use crate::executor::{Executor, Job};

/// A fixed set of worker threads fed from one FIFO queue.
///
/// Clones share the same workers. Dropping the last clone shuts the pool
/// down: queued jobs still run, then the workers exit and are joined.
///
/// # Examples
///
/// ```
/// use future_out::{spawn_on, PoolConfig, ThreadPool};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let pool = ThreadPool::new(PoolConfig::default().threads(2)).unwrap();
/// let future = spawn_on(Arc::new(pool), || 6 * 7);
/// assert_eq!(future.await_timeout(Duration::from_secs(1)).unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct ThreadPool {
    pool: Pool,
    handle: Arc<Handle>,
}

#[derive(Clone)]
struct Pool {
    inner: Arc<(Mutex<Locked>, Condvar)>,
}

struct Locked {
    queue: VecDeque<Job>,
    n_idle_workers: usize,
    shutdown: bool,
}

struct Handle {
    pool: Pool,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        if config.threads == 0 {
            return Err(PoolError::NoWorkers);
        }
        let pool = Pool {
            inner: Arc::new((
                Mutex::new(Locked {
                    queue: VecDeque::new(),
                    n_idle_workers: 0,
                    shutdown: false,
                }),
                Condvar::new(),
            )),
        };
        // On error the partial handle drops here and stops the started workers.
        let mut handle = Handle {
            pool: pool.clone(),
            workers: Vec::with_capacity(config.threads),
        };
        for id in 0..config.threads {
            handle.workers.push(Pool::worker(pool.clone(), &config, id)?);
        }
        log::debug!(
            "thread pool {:?} started with {} workers",
            config.thread_name,
            config.threads
        );
        Ok(Self {
            pool,
            handle: Arc::new(handle),
        })
    }

    pub fn workers(&self) -> usize {
        self.handle.workers.len()
    }
}

impl Executor for ThreadPool {
    fn execute(&self, job: Job) {
        self.pool.submit(job)
    }
}

impl Pool {
    fn lock(&self) -> MutexGuard<'_, Locked> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn submit(&self, job: Job) {
        let need_notify = {
            let mut pool = self.lock();
            pool.queue.push_back(job);
            pool.n_idle_workers > 0
        };
        if need_notify {
            self.inner.1.notify_one();
        }
    }

    /// Blocks until a job is queued. `None` once the pool is shut down and
    /// the queue is drained.
    fn next_job(&self) -> Option<Job> {
        let mut pool = self.lock();
        loop {
            if let Some(job) = pool.queue.pop_front() {
                return Some(job);
            }
            if pool.shutdown {
                return None;
            }
            pool.n_idle_workers += 1;
            pool = self
                .inner
                .1
                .wait(pool)
                .unwrap_or_else(PoisonError::into_inner);
            pool.n_idle_workers -= 1;
        }
    }

    fn shutdown(&self) {
        self.lock().shutdown = true;
        self.inner.1.notify_all();
    }

    fn worker(pool: Pool, config: &PoolConfig, id: usize) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("{}-{id}", config.thread_name))
            .stack_size(config.stack_size)
            .spawn(move || {
                log::trace!("Worker {id}: starting");
                while let Some(job) = pool.next_job() {
                    log::trace!("Worker {id}: running job");
                    if let Err(cause) = catch_unwind(AssertUnwindSafe(job)) {
                        log::error!("Worker {id}: job panicked: {}", panic_message(cause.as_ref()));
                    }
                }
                log::trace!("Worker {id}: exiting");
            })
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.pool.shutdown();
        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            // The last handle may be dropped by a job on one of our own workers.
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                log::error!("thread pool worker exited by panic");
            }
        }
        log::debug!("thread pool shut down");
    }
}
