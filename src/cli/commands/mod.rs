//! CLI command implementations

pub mod artifact;
pub mod cache;
pub mod config;

pub use artifact::execute as artifact;
pub use cache::execute as cache;
pub use config::execute as config;

use crate::config::Config;
use crate::error::ActkitResult;
use crate::session::{Registry, RunContext, RunEnv};

/// Build the run context for one invocation
///
/// Each CLI process starts fresh, so the registry is rebuilt from the
/// artifact and cache files already on disk.
pub async fn run_context(config: &Config) -> ActkitResult<RunContext> {
    let env = RunEnv::from_env_with(&config.paths);
    let registry = Registry::hydrate(env.artifact_dir.as_deref(), env.cache_dir.as_deref()).await?;
    Ok(RunContext::with_registry(env, registry))
}
