//! Parallel processing configuration
//!
//! Input files are independent units of work, so a run may spread them over a
//! Rayon thread pool. Each file is still converted start to finish on one
//! thread.

use crate::errors::{RelabelError, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Configuration for processing input files in parallel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelConfig {
    /// `None` lets Rayon pick (one thread per core)
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// One file at a time on the calling thread
    pub fn sequential() -> Self {
        Self {
            num_threads: Some(1),
        }
    }

    /// Use every available CPU core
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }

    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }

    pub fn is_sequential(&self) -> bool {
        self.num_threads == Some(1)
    }

    /// Build a dedicated pool for one run.
    pub fn build_pool(&self) -> Result<ThreadPool> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(num_threads) = self.num_threads {
            builder = builder.num_threads(num_threads);
        }
        builder.build().map_err(|e| {
            RelabelError::ThreadPool(format!(
                "Failed to initialize thread pool with {:?} threads: {}",
                self.num_threads, e
            ))
        })
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self::sequential()
    }
}
