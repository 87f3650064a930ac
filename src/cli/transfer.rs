use super::ui;
use crate::core::spreadsheet::{
    ASSETS_FILE_NAME, ImportReport, TRANSACTIONS_FILE_NAME, export_assets, export_transactions,
    import_csv,
};
use crate::core::state::PortfolioState;
use anyhow::{Context, Result, bail};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Writes the asset registry and the transaction log into `dir`, returning
/// the paths written.
pub async fn export(state: &PortfolioState, dir: &Path) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let files = [
        (ASSETS_FILE_NAME, export_assets(&state.assets)?),
        (TRANSACTIONS_FILE_NAME, export_transactions(state)?),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = dir.join(name);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Exported {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Reads every file concurrently, then applies them to `state` in the order
/// given. Files that cannot be read or recognized are reported and skipped;
/// the import fails only when none of them could be applied.
pub async fn import(
    state: &mut PortfolioState,
    files: &[PathBuf],
) -> Result<Vec<(PathBuf, ImportReport)>> {
    let pb = ui::new_progress_bar(files.len() as u64, true);
    pb.set_message("Reading files...");

    let reads = files.iter().map(|path| {
        let pb_clone = pb.clone();
        async move {
            let res = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()));
            pb_clone.inc(1);
            (path.clone(), res)
        }
    });
    let contents = join_all(reads).await;
    pb.finish_and_clear();

    let mut reports = Vec::new();
    for (path, content) in contents {
        let outcome = content.and_then(|content| import_csv(state, &content));
        match outcome {
            Ok(report) => reports.push((path, report)),
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                eprintln!(
                    "{} {}: {:#}",
                    ui::style_text("Could not import", ui::StyleType::Error),
                    path.display(),
                    e
                );
            }
        }
    }

    if reports.is_empty() {
        bail!("No file could be imported");
    }
    Ok(reports)
}

pub async fn run_export(state: &PortfolioState, dir: &Path) -> Result<()> {
    for path in export(state, dir).await? {
        println!("Exported {}", path.display());
    }
    Ok(())
}

pub fn print_import_reports(reports: &[(PathBuf, ImportReport)]) {
    for (path, report) in reports {
        let mut line = format!(
            "Imported {} {} from {}",
            report.processed,
            report.kind,
            path.display()
        );
        if report.skipped > 0 {
            line.push_str(&ui::style_text(
                &format!(" ({} rows skipped)", report.skipped),
                ui::StyleType::Subtle,
            ));
        }
        println!("{line}");
    }
}
