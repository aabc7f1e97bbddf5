//! Declarative chart descriptions handed to the browser for drawing.

use serde::{Deserialize, Serialize};

use shopdash_core::types::CellValue;
use shopdash_database::TableSnapshot;

/// Chart shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Pre-binned counts.
    Histogram,
    /// Running total over time.
    CumulativeLine,
    /// Category bars.
    Bar,
    /// Share of a whole.
    Pie,
    /// Points with optional size.
    Scatter,
}

/// One plotted point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Category, date, or bin label.
    pub x: CellValue,
    /// Plotted value.
    pub y: f64,
    /// Marker size (scatter).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    /// Colour grouping value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<CellValue>,
}

impl DataPoint {
    /// A plain `(x, y)` point.
    pub fn new(x: CellValue, y: f64) -> Self {
        Self {
            x,
            y,
            size: None,
            color: None,
        }
    }
}

/// A chart ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Shape.
    pub kind: ChartKind,
    /// Title.
    pub title: String,
    /// X axis label.
    pub x_label: String,
    /// Y axis label.
    pub y_label: String,
    /// Points in draw order.
    pub points: Vec<DataPoint>,
}

/// A headline number shown beside a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Label.
    pub label: String,
    /// Formatted value.
    pub value: String,
}

impl Metric {
    /// Creates a metric.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A geocoded marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Hover label.
    pub label: Option<String>,
}

/// Rendered analytic, or the reason there is nothing to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalyticOutput {
    /// Chart and metrics.
    Ready {
        /// Analytic identifier.
        id: String,
        /// Chart to draw.
        chart: ChartSpec,
        /// Headline numbers.
        metrics: Vec<Metric>,
        /// Tabular breakdown shown under the chart.
        #[serde(skip_serializing_if = "Option::is_none")]
        table: Option<TableSnapshot>,
        /// Map markers.
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        map: Vec<MapPoint>,
    },
    /// The source query returned no rows.
    NoData {
        /// Analytic identifier.
        id: String,
        /// Operator-facing message.
        message: String,
    },
    /// The source query failed.
    Failed {
        /// Analytic identifier.
        id: String,
        /// Operator-facing message.
        message: String,
    },
}

/// Counts `values` into `bins` equal-width buckets labelled `lo-hi`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<DataPoint> {
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    let bins = bins.max(1);
    let width = ((max - min) / bins as f64).max(1.0);
    let bins = (((max - min) / width).floor() as usize + 1).min(bins);

    let mut counts = vec![0u64; bins];
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, count)| {
            let lo = min + width * i as f64;
            let hi = lo + width;
            DataPoint::new(
                CellValue::Text(format!("{lo:.0}-{hi:.0}")),
                *count as f64,
            )
        })
        .collect()
}
