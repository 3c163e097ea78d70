//! Artifact command - upload, download, list, get and delete artifacts

use crate::artifact::{ArtifactStore, DownloadOptions, UploadOptions};
use crate::cache::format_bytes;
use crate::cli::args::{ArtifactAction, ArtifactArgs, OutputFormat};
use crate::cli::commands::run_context;
use crate::cli::output;
use crate::config::Config;
use crate::error::{ActkitError, ActkitResult};
use crate::logger::{Logger, TracingLogger};
use crate::session::{ArtifactRecord, RunContext};
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Execute the artifact command
pub async fn execute(args: ArtifactArgs, config: &Config) -> ActkitResult<()> {
    let logger: Arc<dyn Logger> = Arc::new(TracingLogger);
    let store = ArtifactStore::new(logger);
    let ctx = run_context(config).await?;

    match args.action {
        ArtifactAction::Upload {
            name,
            files,
            root,
            compression_level,
        } => {
            let root = match root {
                Some(root) => root,
                None => std::env::current_dir()
                    .map_err(|e| ActkitError::io("getting current directory", e))?,
            };
            let files = if files.is_empty() {
                collect_files(&root)
            } else {
                files
            };
            let options = UploadOptions {
                compression_level: Some(
                    compression_level.unwrap_or(config.artifact.compression_level),
                ),
            };

            let response = store.upload(&ctx, &name, &files, &root, &options).await?;
            save_index(&ctx).await?;
            output::step_ok_detail(
                &format!("Uploaded artifact '{}' (ID: {})", name, response.id),
                &format_bytes(response.size),
            );
            output::key_value("Digest", &format!("sha256:{}", response.digest));
            println!("{}", response.id);
        }

        ArtifactAction::Download {
            id,
            path,
            expected_hash,
        } => {
            let options = DownloadOptions {
                path,
                expected_hash,
            };
            let response = store.download(&ctx, id, &options).await?;
            if response.digest_mismatch {
                output::step_warn("Artifact digest did not match the expected hash");
            }
            output::step_ok(&format!("Artifact {} downloaded", id));
            println!("{}", response.download_path.display());
        }

        ArtifactAction::List { latest, format } => {
            let response = store.list(&ctx, latest).await?;
            print_artifacts(&response.artifacts, format)?;
        }

        ArtifactAction::Get { name, format } => {
            let response = store.get(&ctx, &name).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&response.artifact)?)
                }
                OutputFormat::Plain => println!("{}", response.artifact.id),
                OutputFormat::Table => print_table(std::slice::from_ref(&response.artifact)),
            }
        }

        ArtifactAction::Delete { name } => {
            let response = store.delete(&ctx, &name).await?;
            save_index(&ctx).await?;
            output::step_ok(&format!("Deleted artifact '{}' (ID: {})", name, response.id));
            println!("{}", response.id);
        }
    }

    Ok(())
}

/// Keep ids stable for the next invocation
async fn save_index(ctx: &RunContext) -> ActkitResult<()> {
    let artifact_dir = ctx.env().artifact_dir()?;
    ctx.snapshot().save_artifacts(artifact_dir).await
}

/// Every file and link under `root`, in a stable order
fn collect_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect()
}

fn print_artifacts(artifacts: &[ArtifactRecord], format: OutputFormat) -> ActkitResult<()> {
    if artifacts.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => output::step_info("No artifacts in this run"),
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(artifacts),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(artifacts)?),
        OutputFormat::Plain => {
            for artifact in artifacts {
                println!("{}", artifact.name);
            }
        }
    }
    Ok(())
}

fn print_table(artifacts: &[ArtifactRecord]) {
    println!(
        "{:<6} {:<30} {:<12} {:<17}",
        style("ID").bold(),
        style("NAME").bold(),
        style("SIZE").bold(),
        style("CREATED").bold()
    );
    println!("{}", "-".repeat(68));

    for artifact in artifacts {
        let created = artifact
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<30} {:<12} {:<17}",
            artifact.id,
            artifact.name,
            format_bytes(artifact.size),
            created
        );
    }

    println!();
    println!("{} artifact(s)", artifacts.len());
}
