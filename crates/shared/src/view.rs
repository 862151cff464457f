//! Presentation-neutral view model derived from an [`AnalysisResult`].
//!
//! Both the terminal renderer and the desktop GUI read from this instead of
//! walking the raw payload, so the two front ends format numbers the same way.

use crate::{
    domain::{AnalysisResult, Prediction},
    report::{explanation_summary, format_count, format_metric, format_support},
};

pub const NO_CLASSIFICATION_REPORT: &str =
    "No Classification Report Available (unsupervised data)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRow {
    pub label: String,
    pub precision: String,
    pub recall: String,
    pub f1_score: String,
    pub support: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationView {
    Table(Vec<ClassRow>),
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionCell {
    pub label: i64,
    pub prediction: Prediction,
}

impl PredictionCell {
    pub fn is_anomaly(&self) -> bool {
        self.prediction == Prediction::Anomaly
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub classification: ClassificationView,
    pub anomaly_count: String,
    pub predictions: Vec<PredictionCell>,
    pub explanations: Vec<String>,
}

impl ResultView {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let classification = match &result.classification_report {
            Some(_) => ClassificationView::Table(
                result
                    .class_metrics()
                    .map(|(label, metrics)| ClassRow {
                        label: label.to_string(),
                        precision: format_metric(metrics.precision.as_ref()),
                        recall: format_metric(metrics.recall.as_ref()),
                        f1_score: format_metric(metrics.f1_score.as_ref()),
                        support: format_support(metrics.support.as_ref()),
                    })
                    .collect(),
            ),
            None => ClassificationView::Unavailable,
        };

        let predictions = result
            .predictions
            .iter()
            .flatten()
            .map(|label| PredictionCell {
                label: *label,
                prediction: Prediction::from_label(*label),
            })
            .collect();

        Self {
            classification,
            anomaly_count: format_count(result.anomaly_count),
            predictions,
            explanations: result.explanations().iter().map(explanation_summary).collect(),
        }
    }

    pub fn flagged_rows(&self) -> usize {
        self.predictions.iter().filter(|cell| cell.is_anomaly()).count()
    }
}
