use anyhow::{Context, Result};
use privlens_engine::{AnalysisSession, Inspector};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{open, output_path, print_report};

pub async fn handle(
    inspector: Inspector,
    file: PathBuf,
    keys: Vec<String>,
    tags: Option<PathBuf>,
    media_type: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut bench = open(inspector, &file, tags, media_type).await?;
    let inspector = bench.inspector().clone();
    let session = bench.ready().await?;

    let missing: Vec<_> = keys.iter().filter(|k| !session.tags().contains(k)).collect();
    for key in missing {
        println!("  ! {} not found in decoded tags", key);
    }

    session.redact(&keys).await?;
    if session.current().removed_keys.is_empty() {
        println!("Nothing to remove.");
        return Ok(());
    }

    let path = write(session, &file, output).await?;
    info!(output = %path.display(), removed = session.current().removed_keys.len(), "wrote redacted copy");
    println!("✓ Redacted {} -> {}", session.file().name, path.display());
    for removed in session.diff() {
        println!("  - {} ({})", removed.key, removed.value);
    }

    let report = session.rescan(&inspector).await;
    print_report(&report);
    Ok(())
}

pub async fn clean(
    inspector: Inspector,
    file: PathBuf,
    media_type: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut bench = open(inspector, &file, None, media_type).await?;
    let session = bench.ready().await?;

    session.full_clean().await?;
    let removed = session.current().removed_keys.len();
    let path = write(session, &file, output).await?;
    info!(output = %path.display(), removed, "wrote stripped copy");

    println!("✓ Stripped {} tags -> {}", removed, path.display());
    println!(
        "  Size: {} -> {} bytes",
        session.history().original().size(),
        session.current().size()
    );
    Ok(())
}

async fn write(session: &AnalysisSession, input: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
    let path = output_path(input, output, &session.output_name());
    tokio::fs::write(&path, session.artifact())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
