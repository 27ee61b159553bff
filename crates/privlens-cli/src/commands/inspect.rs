use anyhow::Result;
use privlens_engine::Inspector;
use std::path::PathBuf;

use super::{open, print_report};

pub async fn handle(
    inspector: Inspector,
    file: PathBuf,
    tags: Option<PathBuf>,
    media_type: Option<String>,
    show_tags: bool,
) -> Result<()> {
    let mut bench = open(inspector, &file, tags, media_type).await?;
    let session = bench.ready().await?;
    let report = session.report();

    println!(
        "✓ Analyzed {} ({}, {} bytes)",
        report.file_name, report.media_type, report.size
    );
    print_report(report);

    if show_tags && !session.tags().is_empty() {
        println!("  Metadata:");
        for tag in session.tags().iter() {
            let marker = if report.sensitive_tags.contains(&tag.key) {
                "!"
            } else if report.warning_tags.contains(&tag.key) {
                "~"
            } else {
                " "
            };
            println!("   {} {} = {}", marker, tag.key, tag.value);
        }
    }

    Ok(())
}
