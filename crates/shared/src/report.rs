//! Flat-text analysis report and the number formatting shared with the views.

use serde_json::Number;

use crate::domain::{AnalysisResult, AnomalyExplanation, ClassMetrics};

pub const REPORT_FILE_NAME: &str = "anomaly_report.txt";

const METRIC_DECIMALS: usize = 3;

/// Fixed-point formatting with `digits` decimals.
///
/// Rounds half away from zero on the shortest decimal representation of
/// `value`, so `1.2345` becomes `1.235` even though the nearest binary
/// double sits just below the midpoint.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let negative = value < 0.0;
    // f64's Display never switches to exponent notation.
    let repr = value.abs().to_string();
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));
    let frac: Vec<u8> = frac_part.bytes().map(|b| b - b'0').collect();

    let mut scaled: Vec<u8> = int_part.bytes().map(|b| b - b'0').collect();
    scaled.extend((0..digits).map(|i| frac.get(i).copied().unwrap_or(0)));

    if frac.get(digits).is_some_and(|next| *next >= 5) {
        let mut idx = scaled.len();
        loop {
            if idx == 0 {
                scaled.insert(0, 1);
                break;
            }
            idx -= 1;
            if scaled[idx] == 9 {
                scaled[idx] = 0;
            } else {
                scaled[idx] += 1;
                break;
            }
        }
    }

    let split = scaled.len() - digits;
    let mut out = String::with_capacity(scaled.len() + 2);
    if negative {
        out.push('-');
    }
    out.extend(scaled[..split].iter().map(|d| char::from(b'0' + d)));
    if digits > 0 {
        out.push('.');
        out.extend(scaled[split..].iter().map(|d| char::from(b'0' + d)));
    }
    out
}

/// Three-decimal metric, empty when the field is missing.
pub fn format_metric(value: Option<&Number>) -> String {
    value
        .and_then(Number::as_f64)
        .map(|v| to_fixed(v, METRIC_DECIMALS))
        .unwrap_or_default()
}

/// Support counts print in their shortest form (`10`, not `10.000`), also
/// when the service sends them as floats.
pub fn format_support(value: Option<&Number>) -> String {
    match value {
        Some(number) if number.is_f64() => number
            .as_f64()
            .map(|v| v.to_string())
            .unwrap_or_default(),
        Some(number) => number.to_string(),
        None => String::new(),
    }
}

pub fn format_count(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn class_line(label: &str, metrics: &ClassMetrics) -> String {
    format!(
        "{label}: Precision={}, Recall={}, F1={}, Support={}",
        format_metric(metrics.precision.as_ref()),
        format_metric(metrics.recall.as_ref()),
        format_metric(metrics.f1_score.as_ref()),
        format_support(metrics.support.as_ref()),
    )
}

/// `feature = value, feature = value, ...` in the server's feature order.
pub fn explanation_summary(explanation: &AnomalyExplanation) -> String {
    explanation
        .iter()
        .map(|(feature, value)| format!("{feature} = {}", format_metric(value.as_ref())))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_report(result: &AnalysisResult) -> String {
    let mut lines = vec!["Classification Report:\n".to_string()];
    lines.extend(
        result
            .class_metrics()
            .map(|(label, metrics)| class_line(label, metrics)),
    );
    lines.push(format!(
        "\nTotal anomalies detected: {}\n",
        format_count(result.anomaly_count)
    ));
    lines.push("Top Anomaly Explanations:\n".to_string());
    lines.extend(
        result
            .explanations()
            .iter()
            .enumerate()
            .map(|(idx, explanation)| {
                format!("Anomaly {}: {}", idx + 1, explanation_summary(explanation))
            }),
    );
    lines.join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub file_name: &'static str,
    pub contents: String,
}

impl ExportedReport {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            file_name: REPORT_FILE_NAME,
            contents: render_report(result),
        }
    }
}
