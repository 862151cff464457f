//! Result panels: classification table, prediction grid, explanation list.

use eframe::egui::{self, Color32, RichText};
use shared::view::{ClassificationView, ResultView, NO_CLASSIFICATION_REPORT};

use crate::ui::theme;

pub fn classification_panel(ui: &mut egui::Ui, view: &ResultView) {
    match &view.classification {
        ClassificationView::Table(rows) => {
            ui.vertical_centered(|ui| {
                ui.heading(RichText::new("Classification Report").color(theme::ACCENT));
            });
            ui.add_space(10.0);
            egui::Grid::new("classification_report")
                .striped(true)
                .num_columns(5)
                .min_col_width(120.0)
                .show(ui, |ui| {
                    for header in ["Class", "Precision", "Recall", "F1 Score", "Support"] {
                        ui.label(RichText::new(header).strong());
                    }
                    ui.end_row();

                    for row in rows {
                        ui.label(row.label.as_str());
                        ui.label(row.precision.as_str());
                        ui.label(row.recall.as_str());
                        ui.label(row.f1_score.as_str());
                        ui.label(row.support.as_str());
                        ui.end_row();
                    }
                });
        }
        ClassificationView::Unavailable => {
            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new(NO_CLASSIFICATION_REPORT)
                        .size(16.0)
                        .color(theme::MUTED),
                );
            });
        }
    }
}

pub fn predictions_panel(ui: &mut egui::Ui, view: &ResultView) {
    ui.vertical_centered(|ui| {
        ui.heading(RichText::new("Predicted Anomalies").color(theme::ACCENT));
        ui.horizontal(|ui| {
            ui.label("Total anomalies detected:");
            ui.label(RichText::new(&view.anomaly_count).strong());
        });
        if !view.predictions.is_empty() {
            ui.label(
                RichText::new(format!(
                    "{} of {} rows flagged",
                    view.flagged_rows(),
                    view.predictions.len()
                ))
                .color(theme::MUTED),
            );
        }
    });
    ui.add_space(6.0);

    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing = egui::vec2(6.0, 6.0);
        for cell in &view.predictions {
            let color = if cell.is_anomaly() {
                Color32::RED
            } else {
                theme::MUTED
            };
            ui.label(RichText::new(cell.label.to_string()).monospace().color(color));
        }
    });
}

pub fn explanations_panel(ui: &mut egui::Ui, view: &ResultView) {
    ui.vertical_centered(|ui| {
        ui.heading(RichText::new("Top Anomaly Explanations").color(theme::ACCENT));
    });
    ui.add_space(6.0);

    for (idx, summary) in view.explanations.iter().enumerate() {
        egui::Frame::group(ui.style())
            .fill(theme::CARD)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal_wrapped(|ui| {
                    ui.label(RichText::new(format!("Anomaly {}:", idx + 1)).strong());
                    ui.label(summary.as_str());
                });
            });
        ui.add_space(4.0);
    }
}
