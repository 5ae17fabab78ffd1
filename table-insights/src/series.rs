//! Server-side aggregation of dashboard charts into plottable series.
//!
//! Rows are grouped by the text form of the `x` column in first-seen order.
//! Only the first [`MAX_LABELS`] groups are kept and at most [`MAX_CHARTS`]
//! chart entries are rendered.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::{
    dashboard::{Aggregation, ChartSpec, ChartType},
    table::Table,
};

pub const MAX_CHARTS: usize = 4;
pub const MAX_LABELS: usize = 10;

/// Aggregated data for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub x: String,
    pub y: Option<String>,
    pub agg: Aggregation,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Builds series for the first [`MAX_CHARTS`] chart entries.
///
/// Entries without `x` are skipped; their position still counts towards the
/// default `Chart {n}` title.
pub fn build_series(table: &Table, charts: &[ChartSpec]) -> Vec<ChartSeries> {
    charts
        .iter()
        .take(MAX_CHARTS)
        .enumerate()
        .filter_map(|(i, chart)| series_for(table, chart, i))
        .collect()
}

/// Aggregates one chart entry.
///
/// Unlike the extension's client-side renderer, which counts an unreadable
/// `y` cell as 1 and always sums, unreadable cells are skipped here and the
/// chart's `agg` is honoured: they add nothing to `sum` and are left out of
/// the `mean` denominator. `count` still counts every row.
fn series_for(table: &Table, chart: &ChartSpec, index: usize) -> Option<ChartSeries> {
    let x = chart.x.clone()?;
    let y = chart.y.clone();
    let agg = match (chart.agg, &y) {
        (Some(agg), Some(_)) => agg,
        (_, None) => Aggregation::Count,
        (None, Some(_)) => Aggregation::Sum,
    };

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Accumulator> = HashMap::new();

    for row in table.rows() {
        let key = label_of(row.get(&x));
        let acc = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Accumulator::default()
        });
        acc.rows += 1;
        if let Some(n) = y.as_deref().and_then(|col| row.get(col)).and_then(lenient_number) {
            acc.sum += n;
            acc.numeric += 1;
        }
    }

    order.truncate(MAX_LABELS);
    let values = order
        .iter()
        .map(|label| groups.get(label).map(|acc| acc.value(agg)).unwrap_or(0.0))
        .collect();

    Some(ChartSeries {
        title: chart
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Chart {}", index + 1)),
        chart_type: chart.chart_type.unwrap_or_default(),
        x,
        y,
        agg,
        labels: order,
        values,
    })
}

#[derive(Debug, Default)]
struct Accumulator {
    rows: usize,
    numeric: usize,
    sum: f64,
}

impl Accumulator {
    fn value(&self, agg: Aggregation) -> f64 {
        match agg {
            Aggregation::Count => self.rows as f64,
            Aggregation::Sum => self.sum,
            Aggregation::Mean if self.numeric == 0 => 0.0,
            Aggregation::Mean => self.sum / self.numeric as f64,
        }
    }
}

fn label_of(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Reads a number from a cell, tolerating formatting such as `$1,200.50`
/// or `12%`: everything except digits, `.` and `-` is dropped.
fn lenient_number(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}
