//! Chart model and layout for the forecast history line chart
//!
//! Everything here is pure geometry: the model groups records into one series
//! per index parameter over a shared date axis, and the layout maps values to
//! CSS pixels. Drawing onto an actual surface lives with the renderer.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{IndexParameter, YieldRecord};

/// Plot area insets in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPadding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

pub const CHART_PADDING: ChartPadding = ChartPadding {
    top: 40.0,
    right: 30.0,
    bottom: 50.0,
    left: 60.0,
};

/// Horizontal grid divisions; a labelled line is drawn at every boundary
pub const GRID_DIVISIONS: usize = 5;
pub const MAX_DATE_LABELS: usize = 6;
pub const POINT_RADIUS: f64 = 4.0;
pub const LINE_WIDTH: f64 = 3.0;
pub const LEGEND_Y: f64 = 20.0;
pub const LEGEND_STEP: f64 = 60.0;
pub const LEGEND_SWATCH: f64 = 12.0;
pub const EMPTY_MESSAGE: &str = "No data to display";

/// Padding applied around a flat series so it is not drawn on the frame
const FLAT_RANGE_PADDING: f64 = 0.1;

pub const GRID_COLOR: &str = "#E5E7EB";
pub const AXIS_COLOR: &str = "#374151";
pub const LABEL_COLOR: &str = "#6B7280";
pub const EMPTY_COLOR: &str = "#9CA3AF";

/// Line color of a parameter's series
pub fn series_color(parameter: &IndexParameter) -> &'static str {
    match parameter {
        IndexParameter::Ndvi => "#10B981",
        IndexParameter::Ndmi => "#3B82F6",
        IndexParameter::Reci => "#F59E0B",
        IndexParameter::Other(_) => "#6B7280",
    }
}

/// One plotted value, positioned by its index on the shared date axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date_index: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub parameter: IndexParameter,
    pub color: &'static str,
    /// Sorted by date
    pub points: Vec<ChartPoint>,
}

/// Records grouped for plotting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartModel {
    /// Sorted union of the distinct record dates
    pub dates: Vec<NaiveDate>,
    /// One series per parameter, in first-seen order
    pub series: Vec<ChartSeries>,
    pub y_min: f64,
    pub y_max: f64,
}

impl ChartModel {
    /// Build the model, `None` when there is nothing to plot at all.
    ///
    /// The y-range covers every record's value; records without a usable date
    /// are left off the x-axis.
    pub fn from_records(records: &[YieldRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let mut dates: Vec<NaiveDate> = records.iter().filter_map(|r| r.chart_date()).collect();
        dates.sort();
        dates.dedup();

        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for value in records.iter().map(|r| r.chart_value()) {
            y_min = y_min.min(value);
            y_max = y_max.max(value);
        }
        if y_min == y_max {
            y_min -= FLAT_RANGE_PADDING;
            y_max += FLAT_RANGE_PADDING;
        }

        let mut series: Vec<ChartSeries> = Vec::new();
        for record in records {
            let parameter = record.parameter_or_default();
            let idx = match series.iter().position(|s| s.parameter == parameter) {
                Some(idx) => idx,
                None => {
                    series.push(ChartSeries {
                        color: series_color(&parameter),
                        parameter,
                        points: Vec::new(),
                    });
                    series.len() - 1
                }
            };
            let Some(date) = record.chart_date() else {
                continue;
            };
            if let Ok(date_index) = dates.binary_search(&date) {
                series[idx].points.push(ChartPoint {
                    date_index,
                    value: record.chart_value(),
                });
            }
        }
        for s in &mut series {
            // Stable, so same-day records keep fetch order
            s.points.sort_by_key(|p| p.date_index);
        }

        Some(Self {
            dates,
            series,
            y_min,
            y_max,
        })
    }

    pub fn y_span(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// A labelled horizontal grid line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLine {
    pub y: f64,
    pub label: String,
}

/// A date tick under the x-axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateLabel {
    pub x: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub x: f64,
    pub y: f64,
    pub color: &'static str,
    pub label: String,
}

/// Canvas size in CSS pixels plus the device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

impl ChartLayout {
    /// A non-positive or non-finite ratio falls back to 1
    pub fn new(width: f64, height: f64, dpr: f64) -> Self {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            dpr,
        }
    }

    /// Backing store size in device pixels
    pub fn backing_size(&self) -> (u32, u32) {
        (
            (self.width * self.dpr).round() as u32,
            (self.height * self.dpr).round() as u32,
        )
    }

    pub fn plot_width(&self) -> f64 {
        (self.width - CHART_PADDING.left - CHART_PADDING.right).max(0.0)
    }

    pub fn plot_height(&self) -> f64 {
        (self.height - CHART_PADDING.top - CHART_PADDING.bottom).max(0.0)
    }

    /// Left edge and bottom edge of the plot area
    pub fn origin(&self) -> (f64, f64) {
        (CHART_PADDING.left, CHART_PADDING.top + self.plot_height())
    }

    /// x of the `index`-th of `count` dates; a single date sits on the y-axis
    pub fn x_at(&self, index: usize, count: usize) -> f64 {
        let steps = count.saturating_sub(1).max(1) as f64;
        CHART_PADDING.left + self.plot_width() / steps * index as f64
    }

    pub fn y_at(&self, value: f64, model: &ChartModel) -> f64 {
        let h = self.plot_height();
        CHART_PADDING.top + h - (value - model.y_min) / model.y_span() * h
    }

    /// Grid lines from the top (max) down to the bottom (min)
    pub fn grid_lines(&self, model: &ChartModel) -> Vec<GridLine> {
        let h = self.plot_height();
        (0..=GRID_DIVISIONS)
            .map(|i| {
                let fraction = i as f64 / GRID_DIVISIONS as f64;
                GridLine {
                    y: CHART_PADDING.top + h * fraction,
                    label: format!("{:.3}", model.y_max - model.y_span() * fraction),
                }
            })
            .collect()
    }

    /// At most [`MAX_DATE_LABELS`] evenly stepped labels, plus the last date
    pub fn date_labels(&self, model: &ChartModel) -> Vec<DateLabel> {
        let count = model.dates.len();
        if count == 0 {
            return Vec::new();
        }
        let step = count.div_ceil(count.min(MAX_DATE_LABELS));
        model
            .dates
            .iter()
            .enumerate()
            .filter(|(i, _)| i % step == 0 || *i == count - 1)
            .map(|(i, date)| DateLabel {
                x: self.x_at(i, count),
                text: format!("{}/{}", date.day(), date.month()),
            })
            .collect()
    }

    pub fn legend(&self, model: &ChartModel) -> Vec<LegendEntry> {
        model
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| LegendEntry {
                x: CHART_PADDING.left + 10.0 + LEGEND_STEP * i as f64,
                y: LEGEND_Y,
                color: s.color,
                label: s.parameter.to_string(),
            })
            .collect()
    }

    /// Pixel positions of one series' points
    pub fn series_points(&self, model: &ChartModel, series: &ChartSeries) -> Vec<(f64, f64)> {
        let count = model.dates.len();
        series
            .points
            .iter()
            .map(|p| (self.x_at(p.date_index, count), self.y_at(p.value, model)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, parameter: Option<&str>, date: &str, value: f64) -> YieldRecord {
        let json = serde_json::json!({
            "id": id,
            "parameter": parameter,
            "endDate": date,
            "indexValue": value,
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_empty_records_have_no_model() {
        assert!(ChartModel::from_records(&[]).is_none());
    }

    #[test]
    fn test_two_ndvi_points_one_series() {
        let records = vec![
            record(1, Some("NDVI"), "2024-01-01", 0.5),
            record(2, Some("NDVI"), "2024-02-01", 0.7),
        ];
        let model = ChartModel::from_records(&records).unwrap();

        assert_eq!(model.y_min, 0.5);
        assert_eq!(model.y_max, 0.7);
        assert_eq!(model.series.len(), 1);
        assert_eq!(model.series[0].points.len(), 2);
        assert_eq!(model.series[0].color, "#10B981");
    }

    #[test]
    fn test_single_value_is_padded() {
        let model = ChartModel::from_records(&[record(1, None, "2024-05-05", 0.42)]).unwrap();
        assert!((model.y_min - 0.32).abs() < 1e-12);
        assert!((model.y_max - 0.52).abs() < 1e-12);
        assert_eq!(model.series[0].parameter, IndexParameter::Ndvi);
    }

    #[test]
    fn test_series_in_first_seen_order_with_shared_axis() {
        let records = vec![
            record(1, Some("RECI"), "2024-03-01", 1.2),
            record(2, Some("NDVI"), "2024-01-01", 0.4),
            record(3, Some("RECI"), "2024-01-01", 1.0),
            record(4, Some("EVI"), "2024-02-01", 0.3),
        ];
        let model = ChartModel::from_records(&records).unwrap();

        let order: Vec<_> = model.series.iter().map(|s| s.parameter.to_string()).collect();
        assert_eq!(order, vec!["RECI", "NDVI", "EVI"]);
        assert_eq!(model.dates.len(), 3);
        assert_eq!(model.series[2].color, "#6B7280");

        // RECI points sorted by date
        let reci: Vec<usize> = model.series[0].points.iter().map(|p| p.date_index).collect();
        assert_eq!(reci, vec![0, 2]);
    }

    #[test]
    fn test_records_without_dates_are_not_plotted() {
        let mut undated = record(2, Some("NDVI"), "2024-01-01", 0.9);
        undated.end_date = None;
        let records = vec![record(1, Some("NDVI"), "2024-01-01", 0.5), undated];
        let model = ChartModel::from_records(&records).unwrap();

        assert_eq!(model.series[0].points.len(), 1);
        assert_eq!(model.y_max, 0.9);
    }

    #[test]
    fn test_layout_mapping() {
        let records = vec![
            record(1, Some("NDVI"), "2024-01-01", 0.5),
            record(2, Some("NDVI"), "2024-02-01", 0.7),
        ];
        let model = ChartModel::from_records(&records).unwrap();
        let layout = ChartLayout::new(600.0, 300.0, 2.0);

        assert_eq!(layout.backing_size(), (1200, 600));
        assert_eq!(layout.plot_width(), 510.0);
        assert_eq!(layout.plot_height(), 210.0);

        let points = layout.series_points(&model, &model.series[0]);
        assert_eq!(points[0], (60.0, 250.0));
        assert_eq!(points[1], (570.0, 40.0));
    }

    #[test]
    fn test_grid_labels() {
        let records = vec![
            record(1, None, "2024-01-01", 0.0),
            record(2, None, "2024-01-02", 1.0),
        ];
        let model = ChartModel::from_records(&records).unwrap();
        let lines = ChartLayout::new(400.0, 300.0, 1.0).grid_lines(&model);

        assert_eq!(lines.len(), GRID_DIVISIONS + 1);
        assert_eq!(lines[0].label, "1.000");
        assert_eq!(lines[1].label, "0.800");
        assert_eq!(lines[5].label, "0.000");
        assert_eq!(lines[0].y, CHART_PADDING.top);
    }

    #[test]
    fn test_date_labels_capped() {
        let records: Vec<YieldRecord> = (1..=20)
            .map(|d| record(d, None, &format!("2024-03-{:02}", d), d as f64))
            .collect();
        let model = ChartModel::from_records(&records).unwrap();
        let labels = ChartLayout::new(800.0, 300.0, 1.0).date_labels(&model);

        // step = ceil(20 / 6) = 4: indices 0, 4, 8, 12, 16 and the last
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0].text, "1/3");
        assert_eq!(labels[5].text, "20/3");
    }

    #[test]
    fn test_legend_steps() {
        let records = vec![
            record(1, Some("NDVI"), "2024-01-01", 0.5),
            record(2, Some("NDMI"), "2024-01-01", 0.2),
        ];
        let model = ChartModel::from_records(&records).unwrap();
        let legend = ChartLayout::new(600.0, 300.0, 1.0).legend(&model);
        assert_eq!(legend[0].x, 70.0);
        assert_eq!(legend[1].x, 130.0);
        assert_eq!(legend[1].y, LEGEND_Y);
        assert_eq!(legend[1].label, "NDMI");
    }

    #[test]
    fn test_bad_device_pixel_ratio() {
        let layout = ChartLayout::new(100.0, 100.0, f64::NAN);
        assert_eq!(layout.dpr, 1.0);
        assert_eq!(ChartLayout::new(10.0, 10.0, 1.0).plot_width(), 0.0);
    }
}
