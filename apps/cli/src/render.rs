//! Terminal rendering of a [`ResultView`].

use std::fmt::Write as _;

use shared::view::{ClassRow, ClassificationView, ResultView, NO_CLASSIFICATION_REPORT};

const HEADERS: [&str; 5] = ["Class", "Precision", "Recall", "F1 Score", "Support"];

fn row_cells(row: &ClassRow) -> [&str; 5] {
    [
        row.label.as_str(),
        row.precision.as_str(),
        row.recall.as_str(),
        row.f1_score.as_str(),
        row.support.as_str(),
    ]
}

fn render_table(rows: &[ClassRow]) -> String {
    let mut widths = HEADERS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row_cells(row)) {
            *width = (*width).max(cell.len());
        }
    }

    let format_line = |cells: [&str; 5]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", format_line(HEADERS));
    let rule_len = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    let _ = writeln!(out, "{}", "-".repeat(rule_len));
    for row in rows {
        let _ = writeln!(out, "{}", format_line(row_cells(row)));
    }
    out
}

pub fn render_text(view: &ResultView) -> String {
    let mut out = String::new();

    match &view.classification {
        ClassificationView::Table(rows) => {
            let _ = writeln!(out, "Classification Report\n");
            out.push_str(&render_table(rows));
        }
        ClassificationView::Unavailable => {
            let _ = writeln!(out, "{NO_CLASSIFICATION_REPORT}");
        }
    }

    let _ = writeln!(out, "\nPredicted Anomalies\n");
    let _ = writeln!(out, "Total anomalies detected: {}", view.anomaly_count);
    if !view.predictions.is_empty() {
        let cells: Vec<String> = view
            .predictions
            .iter()
            .map(|cell| {
                if cell.is_anomaly() {
                    format!("[{}]", cell.label)
                } else {
                    cell.label.to_string()
                }
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join(" "));
        let _ = writeln!(
            out,
            "Flagged rows: {} of {}",
            view.flagged_rows(),
            view.predictions.len()
        );
    }

    let _ = writeln!(out, "\nTop Anomaly Explanations\n");
    for (idx, summary) in view.explanations.iter().enumerate() {
        let _ = writeln!(out, "Anomaly {}: {summary}", idx + 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use shared::domain::AnalysisResult;

    use super::*;

    #[test]
    fn renders_aligned_table_and_marks_anomalies() {
        let result: AnalysisResult = serde_json::from_str(
            r#"{
                "classification_report": {
                    "normal": {"precision": 0.99, "recall": 1.0, "f1-score": 0.995, "support": 98},
                    "1": {"precision": 0.5, "recall": 0.667, "f1-score": 0.571, "support": 2}
                },
                "anomaly_count": 1,
                "predictions": [0, 1, 0],
                "anomaly_explanations": [{"amount": 1.2345}]
            }"#,
        )
        .expect("decode");

        let text = render_text(&ResultView::from_result(&result));
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines.contains(&"Class   Precision  Recall  F1 Score  Support"));
        assert!(lines.contains(&"normal  0.990      1.000   0.995     98"));
        assert!(lines.contains(&"1       0.500      0.667   0.571     2"));
        assert!(lines.contains(&"Total anomalies detected: 1"));
        assert!(lines.contains(&"0 [1] 0"));
        assert!(lines.contains(&"Flagged rows: 1 of 3"));
        assert!(lines.contains(&"Anomaly 1: amount = 1.235"));
    }

    #[test]
    fn renders_placeholder_without_report() {
        let text = render_text(&ResultView::from_result(&AnalysisResult::default()));
        assert!(text.starts_with("No Classification Report Available (unsupervised data)"));
        assert!(text.contains("Total anomalies detected: \n"));
    }
}
