use std::{path::PathBuf, time::Duration};

use client_core::{export::write_report, UploadState};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui::{self, RichText};
use shared::{protocol::CSV_EXTENSION, report::REPORT_FILE_NAME, view::ResultView};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::{
        events::{UiErrorContext, UiEvent},
        orchestration::dispatch_backend_command,
    },
    ui::{panels, theme},
};

pub fn upload_button_label(is_loading: bool) -> &'static str {
    if is_loading {
        "Analysing..."
    } else {
        "Upload & Analyse"
    }
}

pub fn detect_button_label(is_loading: bool) -> &'static str {
    if is_loading {
        "Fetching..."
    } else {
        "Run Analysis"
    }
}

fn notice_label(context: UiErrorContext) -> &'static str {
    match context {
        UiErrorContext::WorkerStartup => "Startup",
        UiErrorContext::FileSelection => "File",
        UiErrorContext::Request => "Request",
        UiErrorContext::Export => "Export",
    }
}

pub struct AnalysisApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    backend_url: String,
    state: UploadState,
    view: Option<ResultView>,
    notice: Option<String>,
    last_export: Option<PathBuf>,
}

impl AnalysisApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        backend_url: impl Into<String>,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            backend_url: backend_url.into(),
            state: UploadState::default(),
            view: None,
            notice: None,
            last_export: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::StateChanged(state) => self.apply_state(state),
                UiEvent::Error(err) => {
                    self.notice = Some(format!("{}: {}", notice_label(err.context()), err.message()));
                }
            }
        }
    }

    fn apply_state(&mut self, state: UploadState) {
        if state.result != self.state.result {
            self.view = state.result.as_ref().map(ResultView::from_result);
            self.last_export = None;
        }
        self.state = state;
    }

    /// Remote triggers are disabled while a call is in flight.
    fn controls_enabled(&self) -> bool {
        !self.state.is_loading
    }

    fn request(&mut self, cmd: BackendCommand) {
        self.notice = None;
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.notice);
    }

    fn pick_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &[CSV_EXTENSION])
            .pick_file()
        {
            self.request(BackendCommand::SelectFile { path });
        }
    }

    fn save_report(&mut self) {
        let Some(report) = self.state.export_report() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(REPORT_FILE_NAME)
            .add_filter("Text", &["txt"])
            .save_file()
        else {
            return;
        };

        match write_report(&report, &path) {
            Ok(()) => {
                self.notice = None;
                self.last_export = Some(path);
            }
            Err(err) => {
                tracing::error!("failed to save report: {err:#}");
                self.notice = Some(format!(
                    "{}: could not save {}",
                    notice_label(UiErrorContext::Export),
                    path.display()
                ));
            }
        }
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        let enabled = self.controls_enabled();
        let loading = self.state.is_loading;

        egui::Frame::group(ui.style())
            .fill(theme::CARD)
            .inner_margin(egui::Margin::same(20))
            .show(ui, |ui| {
                ui.set_max_width(500.0);
                ui.vertical_centered(|ui| {
                    if ui.button("Choose CSV file...").clicked() {
                        self.pick_file();
                    }
                    let file_label = self
                        .state
                        .selected_file
                        .as_ref()
                        .map(|file| format!("{} ({} bytes)", file.name(), file.size_bytes()))
                        .unwrap_or_else(|| "No file selected".to_string());
                    ui.label(RichText::new(file_label).color(theme::MUTED));
                    ui.add_space(10.0);

                    let upload = egui::Button::new(RichText::new(upload_button_label(loading)).strong())
                        .fill(theme::UPLOAD_BUTTON)
                        .min_size(egui::vec2(400.0, 36.0));
                    if ui.add_enabled(enabled, upload).clicked() {
                        self.request(BackendCommand::Upload);
                    }
                    ui.add_space(6.0);

                    let detect = egui::Button::new(RichText::new(detect_button_label(loading)).strong())
                        .fill(theme::DETECT_BUTTON)
                        .min_size(egui::vec2(400.0, 36.0));
                    if ui.add_enabled(enabled, detect).clicked() {
                        self.request(BackendCommand::RunAnalysis);
                    }

                    if !self.state.status_message.is_empty() {
                        ui.add_space(10.0);
                        ui.colored_label(theme::ERROR, self.state.status_message.as_str());
                    }
                    if let Some(notice) = &self.notice {
                        ui.colored_label(theme::ERROR, notice.as_str());
                    }
                });
            });
    }

    fn show_results(&mut self, ui: &mut egui::Ui) {
        let Some(view) = &self.view else {
            return;
        };

        let mut save_clicked = false;
        egui::Frame::group(ui.style())
            .fill(theme::PANEL)
            .inner_margin(egui::Margin::same(30))
            .show(ui, |ui| {
                panels::classification_panel(ui, view);
                ui.add_space(30.0);
                panels::predictions_panel(ui, view);
                ui.add_space(30.0);
                panels::explanations_panel(ui, view);
                ui.add_space(20.0);

                ui.vertical_centered(|ui| {
                    let download = egui::Button::new("Download Report").fill(theme::DOWNLOAD_BUTTON);
                    save_clicked = ui.add(download).clicked();
                    if let Some(path) = &self.last_export {
                        ui.label(
                            RichText::new(format!("Report saved to {}", path.display()))
                                .color(theme::MUTED),
                        );
                    }
                });
            });

        if save_clicked {
            self.save_report();
        }
    }
}

impl eframe::App for AnalysisApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading(RichText::new("Anomaly Detection System").size(28.0));
                    ui.label(RichText::new(self.backend_url.as_str()).small().color(theme::MUTED));
                    ui.add_space(20.0);
                    self.show_controls(ui);
                });
                ui.add_space(30.0);
                self.show_results(ui);
            });
        });

        // Keep polling the worker channel; faster while a request is pending.
        let repaint_ms = if self.state.is_loading { 50 } else { 250 };
        ctx.request_repaint_after(Duration::from_millis(repaint_ms));
    }
}
