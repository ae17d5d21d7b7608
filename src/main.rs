use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use asset_budget::{
    application::builder::SessionBuilder,
    config::LogFormat,
    dto::{AssetDto, ScanReport},
    infrastructure::host::ProjectFileHost,
    AssetSession, Config,
};

#[derive(Parser)]
#[command(name = "asset-budget")]
#[command(about = "Find and shrink oversized images in a project", long_about = None)]
struct Cli {
    /// Project manifest (JSON or YAML)
    #[arg(short, long, global = true, default_value = "project.yaml")]
    project: PathBuf,
    /// Byte budget per image (default: ASSET_BUDGET_BYTES)
    #[arg(short, long, global = true)]
    budget: Option<u64>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered images with their sizes and flags
    Scan,
    /// Optimize every image over budget
    Optimize {
        /// Write optimized canvas images back into the project
        #[arg(long)]
        apply: bool,
        /// Directory for optimized content-repository images
        #[arg(long)]
        export_dir: Option<PathBuf>,
        /// Directory uploaded canvas images are stored in (default: <project dir>/optimized)
        #[arg(long)]
        asset_dir: Option<PathBuf>,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn print_assets(assets: &[AssetDto]) {
    for asset in assets {
        let mut flags = Vec::new();
        if asset.over_budget {
            flags.push("over-budget".to_string());
        }
        if asset.already_optimized {
            flags.push("already-optimized".to_string());
        }
        if let Some(artifact) = &asset.optimized {
            flags.push(format!(
                "-> {} {}x{} ({:.0}% smaller{})",
                human_bytes(artifact.byte_size),
                artifact.width,
                artifact.height,
                artifact.reduction_ratio * 100.0,
                if artifact.within_budget { "" } else { ", still over budget" }
            ));
        }
        if asset.applied_to_document {
            flags.push("applied".to_string());
        }
        println!(
            "{:<10} {:>10}  {}  {}",
            asset.provenance.to_string(),
            human_bytes(asset.original_byte_size),
            asset.label,
            flags.join(" ")
        );
    }
}

fn assets(session: &AssetSession, budget: u64) -> Vec<AssetDto> {
    session
        .descriptors()
        .iter()
        .map(|d| AssetDto::from_descriptor(d, budget))
        .collect()
}

async fn scan(session: &AssetSession, budget: u64) -> Result<ScanReport> {
    let mut progress = session.progress();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let percent = *progress.borrow_and_update();
            if percent > 0 {
                debug!(percent, "scan progress");
            }
        }
    });

    let report = session.run_scan().await.context("Scan failed")?;
    info!("{}", report.summary(budget));
    Ok(report)
}

async fn export_artifacts(session: &AssetSession, dir: &Path) -> Result<usize> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut exported = 0;
    for descriptor in session.descriptors() {
        if descriptor.provenance().is_canvas() || descriptor.optimized_artifact().is_none() {
            continue;
        }
        match session.download_artifact(descriptor.identity()) {
            Ok(download) => {
                let path = dir.join(&download.file_name);
                tokio::fs::write(&path, &download.bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Exported {} ({})", path.display(), download.mime_type);
                exported += 1;
            }
            Err(e) => warn!(asset = %descriptor.identity(), error = %e, "Export skipped"),
        }
    }
    Ok(exported)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(budget) = cli.budget {
        config.budget_bytes = budget;
    }
    init_tracing(config.log_format);
    config.validate().map_err(|e| anyhow!(e))?;
    let budget = config.budget_bytes;

    let project_root = cli
        .project
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let asset_dir = match &cli.command {
        Commands::Optimize {
            asset_dir: Some(dir),
            ..
        } => dir.clone(),
        _ => project_root.join("optimized"),
    };

    let host = ProjectFileHost::open(&cli.project, asset_dir)
        .await
        .with_context(|| format!("Failed to open project {}", cli.project.display()))?;
    let session = SessionBuilder::new(config)
        .with_project(Arc::new(host))
        .with_default_adapters(&project_root)
        .and_then(SessionBuilder::build)
        .map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Scan => {
            let report = scan(&session, budget).await?;
            let assets = assets(&session, budget);
            if cli.json {
                let output = json!({
                    "scan_id": report.scan_id,
                    "started_at": report.started_at,
                    "finished_at": report.finished_at,
                    "summary": report.summary(budget),
                    "assets": assets,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_assets(&assets);
                println!("{}", report.summary(budget));
            }
        }
        Commands::Optimize {
            apply, export_dir, ..
        } => {
            let report = scan(&session, budget).await?;
            let optimization = session.optimize_all(budget).await;
            let applied = if apply {
                Some(session.apply_all().await)
            } else {
                None
            };
            let exported = match &export_dir {
                Some(dir) => Some(export_artifacts(&session, dir).await?),
                None => None,
            };

            let assets = assets(&session, budget);
            if cli.json {
                let output = json!({
                    "scan_id": report.scan_id,
                    "summary": report.summary(budget),
                    "optimization": optimization,
                    "apply": applied,
                    "exported": exported,
                    "assets": assets,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_assets(&assets);
                println!(
                    "Optimized {} image(s), {} failed, saved {}",
                    optimization.optimized.len(),
                    optimization.failed.len(),
                    human_bytes(optimization.bytes_saved())
                );
                if !optimization.over_budget.is_empty() {
                    println!(
                        "{} image(s) still exceed the budget after the emergency encode",
                        optimization.over_budget.len()
                    );
                }
                if let Some(applied) = applied {
                    println!(
                        "Applied {} image(s) to the document ({} failed, {} not applicable)",
                        applied.applied,
                        applied.failed.len(),
                        applied.skipped
                    );
                }
                if let Some(exported) = exported {
                    println!("Exported {} content repository image(s)", exported);
                }
            }
        }
    }

    Ok(())
}
