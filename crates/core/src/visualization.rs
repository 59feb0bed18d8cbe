//! Result presentation.
//!
//! [`ResultView`] turns the current [`DiagnosisResult`] (or its absence) into a
//! bar chart of weighted scores and a score table. Both are built in the same call
//! from the same result, so they can never show different submissions.
//!
//! Text rendering is used by the console binaries; the `Serialize` impls back the
//! `--json` output.

use crate::diagnosis::DiagnosisResult;
use oralscan_types::Percentage;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Width, in characters, of a 100% bar.
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub category: String,
    pub percentage: Percentage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum ChartView {
    NoData,
    Bars(Vec<ChartPoint>),
}

/// One table row. `prediction_score` is the model confidence and `health_score`
/// the score derived from the risk form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub label: String,
    pub prediction_score: Option<f64>,
    pub health_score: Option<f64>,
    pub weighted_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum TableView {
    NoResults,
    Rows(Vec<ScoreRow>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub submission_id: Option<Uuid>,
    pub chart: ChartView,
    pub table: TableView,
}

impl ResultView {
    pub fn from_result(result: Option<&DiagnosisResult>) -> Self {
        match result {
            Some(result) => Self {
                submission_id: Some(result.submission_id()),
                chart: ChartView::from_result(result),
                table: TableView::from_result(result),
            },
            None => Self::empty(),
        }
    }

    pub fn empty() -> Self {
        Self {
            submission_id: None,
            chart: ChartView::NoData,
            table: TableView::NoResults,
        }
    }
}

impl ChartView {
    fn from_result(result: &DiagnosisResult) -> Self {
        let scores = result.scores();
        if !result.diseases_reported() || scores.iter().all(|s| s.weighted_score.is_none()) {
            return ChartView::NoData;
        }

        ChartView::Bars(
            scores
                .iter()
                .map(|score| ChartPoint {
                    category: score.label.clone(),
                    percentage: Percentage::from_fraction(score.weighted_score.unwrap_or(0.0)),
                })
                .collect(),
        )
    }
}

impl TableView {
    fn from_result(result: &DiagnosisResult) -> Self {
        let scores = result.scores();
        if scores.iter().all(|s| s.detection_label.is_none()) {
            return TableView::NoResults;
        }

        TableView::Rows(
            scores
                .iter()
                .map(|score| ScoreRow {
                    label: score
                        .detection_label
                        .clone()
                        .unwrap_or_else(|| score.label.clone()),
                    prediction_score: score.confidence,
                    health_score: score.form_score,
                    weighted_score: score.weighted_score,
                })
                .collect(),
        )
    }
}

impl fmt::Display for ChartView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Oral Disease Weighted Score")?;
        let points = match self {
            ChartView::NoData => return writeln!(f, "  No data available"),
            ChartView::Bars(points) => points,
        };

        let label_width = points
            .iter()
            .map(|p| p.category.chars().count())
            .max()
            .unwrap_or(0);

        for point in points {
            let filled = ((point.percentage.value() / 100.0) * BAR_WIDTH as f64).round() as usize;
            writeln!(
                f,
                "  {:<width$} | {:<bar$} {}",
                point.category,
                "█".repeat(filled.min(BAR_WIDTH)),
                point.percentage,
                width = label_width,
                bar = BAR_WIDTH,
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for TableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Prediction Score Table")?;
        let rows = match self {
            TableView::NoResults => return writeln!(f, "  No results found"),
            TableView::Rows(rows) => rows,
        };

        let cells: Vec<[String; 4]> = rows
            .iter()
            .map(|row| {
                [
                    row.label.clone(),
                    optional(row.prediction_score, |v| v.to_string()),
                    optional(row.health_score, |v| v.to_string()),
                    optional(row.weighted_score, |v| format!("{:.2}", v)),
                ]
            })
            .collect();

        let headers = ["Disease", "Prediction Score", "Health Score", "Weighted Score"];
        let mut widths = headers.map(|h| h.len());
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_row(f, &headers.map(str::to_owned), &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "  {}", rule.join("-+-"))?;
        for row in &cells {
            write_row(f, row, &widths)?;
        }
        Ok(())
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chart)?;
        writeln!(f)?;
        write!(f, "{}", self.table)
    }
}

fn optional(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
    value.map(render).unwrap_or_else(|| "-".to_owned())
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String; 4], widths: &[usize; 4]) -> fmt::Result {
    writeln!(
        f,
        "  {:<w0$} | {:>w1$} | {:>w2$} | {:>w3$}",
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    )
}
