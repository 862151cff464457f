use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, parse_backend_url},
    export::save_report,
    ClientSettings, HttpAnalysisBackend, RequestPolicy, SelectedFile, WorkflowController,
};
use shared::view::ResultView;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(
    name = "anomaly-cli",
    about = "Upload CSV data to the anomaly analysis service and review the results"
)]
struct Cli {
    /// Base URL of the analysis service (overrides analysis_client.toml and env).
    #[arg(long)]
    backend_url: Option<String>,
    /// Request timeout in seconds; 0 disables it.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Let overlapping requests run; the last response to arrive wins.
    #[arg(long)]
    allow_concurrent: bool,
    /// Print the raw result as JSON instead of the rendered report view.
    #[arg(long)]
    json: bool,
    /// Write anomaly_report.txt into this directory after a successful run.
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a CSV file and analyse it.
    Upload { file: PathBuf },
    /// Fetch detection results for the most recently uploaded data.
    Detect,
}

fn resolve_settings(cli: &Cli) -> Result<ClientSettings> {
    let mut settings = load_settings()?;
    if let Some(url) = &cli.backend_url {
        settings.backend_url = parse_backend_url(url)?;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if cli.allow_concurrent {
        settings.request_policy = RequestPolicy::AllowConcurrent;
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let settings = resolve_settings(&cli)?;
    let backend = Arc::new(HttpAnalysisBackend::from_settings(&settings)?);
    let controller = WorkflowController::with_policy(backend, settings.request_policy);

    let outcome = match &cli.command {
        Command::Upload { file } => {
            let selected = SelectedFile::from_path(file).await?;
            if !selected.has_csv_extension() {
                warn!(file = selected.name(), "file does not have a .csv extension");
            }
            controller.select_file(selected).await;
            controller.upload().await
        }
        Command::Detect => controller.run_analysis().await,
    };

    let result = match outcome {
        Ok(result) => result,
        Err(err) => bail!("{}", err.status_message()),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render::render_text(&ResultView::from_result(&result)));
    }

    if let Some(dir) = &cli.export {
        if let Some(report) = controller.export_report().await {
            let path = save_report(&report, dir)?;
            eprintln!("Report saved to {}", path.display());
        }
    }

    Ok(())
}
