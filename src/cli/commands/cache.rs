//! Cache command - restore, save and fingerprint caches

use crate::archive::{ArchiveTransport, HostOs};
use crate::cache::{
    cache_version, check_paths, CacheEngine, RestoreOptions, RestoreOutcome, SaveOptions,
    SaveOutcome,
};
use crate::cli::args::{CacheAction, CacheArgs};
use crate::cli::commands::run_context;
use crate::cli::output;
use crate::config::Config;
use crate::error::ActkitResult;
use crate::logger::{Logger, TracingLogger};
use std::sync::Arc;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> ActkitResult<()> {
    match args.action {
        CacheAction::Restore {
            paths,
            key,
            restore_keys,
            lookup_only,
            cross_os,
        } => {
            let options = RestoreOptions {
                lookup_only,
                cross_os_archive: cross_os || config.cache.cross_os_archive,
            };
            restore(config, &paths, &key, &restore_keys, &options).await
        }
        CacheAction::Save {
            paths,
            key,
            cross_os,
        } => {
            let options = SaveOptions {
                cross_os_archive: cross_os || config.cache.cross_os_archive,
            };
            save(config, &paths, &key, &options).await
        }
        CacheAction::Version {
            paths,
            compression,
            cross_os,
        } => {
            check_paths(&paths)?;
            let method = match compression {
                Some(method) => method,
                None => ArchiveTransport::system().compression_method().await,
            };
            let cross_os_archive = cross_os || config.cache.cross_os_archive;
            println!(
                "{}",
                cache_version(&paths, Some(method), cross_os_archive, HostOs::detect())
            );
            Ok(())
        }
    }
}

fn engine() -> CacheEngine {
    let logger: Arc<dyn Logger> = Arc::new(TracingLogger);
    CacheEngine::new(ArchiveTransport::system(), logger)
}

async fn restore(
    config: &Config,
    paths: &[String],
    key: &str,
    restore_keys: &[String],
    options: &RestoreOptions,
) -> ActkitResult<()> {
    let ctx = run_context(config).await?;
    let outcome = engine()
        .restore_cache(&ctx, paths, key, restore_keys, options)
        .await?;

    match outcome {
        RestoreOutcome::Restored { key, cache_file } => {
            output::step_ok_detail(&format!("Cache restored from key: {}", key), &cache_file);
            println!("{}", key);
        }
        RestoreOutcome::Found { key, cache_file } => {
            output::step_ok_detail(&format!("Cache found for key: {}", key), &cache_file);
            println!("{}", key);
        }
        RestoreOutcome::Miss => {
            let mut keys = vec![key.to_string()];
            keys.extend(restore_keys.iter().cloned());
            output::step_warn(&format!(
                "Cache not found for input keys: {}",
                keys.join(", ")
            ));
        }
        RestoreOutcome::Failed { error } => {
            output::step_warn(&format!("Failed to restore: {}", error));
        }
    }
    Ok(())
}

async fn save(
    config: &Config,
    paths: &[String],
    key: &str,
    options: &SaveOptions,
) -> ActkitResult<()> {
    let ctx = run_context(config).await?;
    let outcome = engine().save_cache(&ctx, paths, key, options).await?;

    match &outcome {
        SaveOutcome::Saved { key, cache_file, .. } => {
            output::step_ok_detail(&format!("Cache saved with key: {}", key), cache_file);
        }
        SaveOutcome::Failed { error } => match error.hint() {
            Some(hint) => output::step_warn_hint(&format!("Failed to save: {}", error), hint),
            None => output::step_warn(&format!("Failed to save: {}", error)),
        },
    }
    println!("{}", outcome.cache_id());
    Ok(())
}
