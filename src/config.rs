//! Sizing for [`ThreadPool`](crate::ThreadPool), from code or the environment.

use std::{env, num::NonZeroUsize};

/// Worker count of the default pool.
pub const POOL_THREADS_ENV: &str = "FUTURE_OUT_POOL_THREADS";
/// Worker stack size of the default pool, in bytes.
pub const POOL_STACK_SIZE_ENV: &str = "FUTURE_OUT_POOL_STACK_SIZE";

const MAX_THREADS: usize = 1024;
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let hw_parallelism = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self {
            threads: (hw_parallelism * 2 + 1).min(MAX_THREADS),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "future-out".to_owned(),
        }
    }
}

impl PoolConfig {
    /// Defaults overridden by `FUTURE_OUT_POOL_THREADS` and
    /// `FUTURE_OUT_POOL_STACK_SIZE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(threads) = parse_var(&lookup, POOL_THREADS_ENV) {
            if threads == 0 || threads > MAX_THREADS {
                log::warn!(
                    "{POOL_THREADS_ENV}={threads} out of range 1..={MAX_THREADS}, using {}",
                    config.threads
                );
            } else {
                config.threads = threads;
            }
        }
        if let Some(stack_size) = parse_var(&lookup, POOL_STACK_SIZE_ENV) {
            config.stack_size = stack_size;
        }
        config
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

fn parse_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("ignoring {key}={raw:?}: {err}");
            None
        }
    }
}
