pub mod inspect;
pub mod patterns;
pub mod redact;

use anyhow::{Context, Result};
use privlens_engine::{AnalysisReport, Inspector, Workbench};
use privlens_sources::{JsonTagDecoder, SourceFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Load `file` and run the analysis to completion
pub async fn open(
    inspector: Inspector,
    file: &Path,
    tags: Option<PathBuf>,
    media_type: Option<String>,
) -> Result<Workbench> {
    let inspector = match tags {
        Some(path) => inspector.with_decoder(Arc::new(JsonTagDecoder::from_path(path))),
        None => inspector,
    };

    let mut source = SourceFile::load(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    if let Some(media_type) = media_type {
        source.media_type = media_type;
    }

    let mut bench = Workbench::new(inspector);
    bench.open(source);
    bench.ready().await?;
    Ok(bench)
}

/// Default output next to the input, named `<stem>_clean<ext>`
pub fn output_path(input: &Path, output: Option<PathBuf>, file_name: &str) -> PathBuf {
    output.unwrap_or_else(|| input.with_file_name(file_name))
}

pub fn print_report(report: &AnalysisReport) {
    println!("  Status: {}", report.status.as_str());
    println!(
        "  Score: {:.1}/10 ({})",
        report.score.value,
        report.score.tier.as_str()
    );
    println!(
        "  Tags: {} ({} sensitive, {} warning)",
        report.tag_count,
        report.sensitive_tags.len(),
        report.warning_tags.len()
    );

    if report.findings.is_empty() {
        println!("  Findings: none");
    } else {
        println!("  Findings: {}", report.finding_count);
        for group in &report.findings {
            println!("    {} ({}): {}", group.label, group.count(), group.values.join(", "));
            if group.overflow > 0 {
                println!("      ... and {} more", group.overflow);
            }
        }
    }

    for skipped in &report.skipped_decoders {
        println!("  ! Skipped decoder {}: {}", skipped.name, skipped.reason);
    }
    if report.truncated {
        println!("  ! Text was only scanned up to the configured limit");
    }
}
