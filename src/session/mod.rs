//! Run context shared by the cache engine and artifact store
//!
//! One `RunContext` is built per job run and passed by reference into every
//! operation. Nothing is global, so independent runs (and tests) can proceed
//! in parallel.

pub mod env;
pub mod registry;

pub use env::RunEnv;
pub use registry::{ArtifactRecord, Registry, MAX_ARTIFACTS};

use std::sync::{Mutex, MutexGuard};

/// Environment plus registry for one run
#[derive(Debug)]
pub struct RunContext {
    env: RunEnv,
    registry: Mutex<Registry>,
}

impl RunContext {
    /// Start a run with an empty registry
    pub fn new(env: RunEnv) -> Self {
        Self::with_registry(env, Registry::new())
    }

    /// Start a run with a pre-populated registry
    pub fn with_registry(env: RunEnv, registry: Registry) -> Self {
        Self {
            env,
            registry: Mutex::new(registry),
        }
    }

    /// Locations for this run
    pub fn env(&self) -> &RunEnv {
        &self.env
    }

    /// Lock the registry
    ///
    /// Guards must not be held across an `.await`; checks and mutations are
    /// separate short critical sections.
    pub fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current registry state
    pub fn snapshot(&self) -> Registry {
        self.registry().clone()
    }
}
