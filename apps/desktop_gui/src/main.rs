mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{
    config::{load_settings, parse_backend_url},
    ClientSettings,
};
use crossbeam_channel::bounded;
use eframe::egui;

use backend_bridge::commands::BackendCommand;
use controller::events::{UiError, UiErrorContext, UiEvent};
use ui::AnalysisApp;

#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the analysis service (overrides analysis_client.toml and env).
    #[arg(long)]
    backend_url: Option<String>,
}

fn resolve_settings(args: &Args) -> anyhow::Result<ClientSettings> {
    let mut settings = load_settings()?;
    if let Some(url) = &args.backend_url {
        settings.backend_url = parse_backend_url(url)?;
    }
    Ok(settings)
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);

    let settings = match resolve_settings(&args) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::error!("invalid client settings, falling back to defaults: {err:#}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::new(
                UiErrorContext::WorkerStartup,
                format!("invalid settings ({err}); using the default backend"),
            )));
            ClientSettings::default()
        }
    };
    let backend_url = settings.backend_url.to_string();
    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Anomaly Detection System")
            .with_inner_size([1100.0, 820.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Anomaly Detection System",
        options,
        Box::new(move |_cc| Ok(Box::new(AnalysisApp::new(cmd_tx, ui_rx, backend_url)))),
    )
}
