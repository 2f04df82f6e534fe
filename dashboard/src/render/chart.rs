//! Forecast history line chart
//!
//! [`draw_chart`] walks a [`ChartLayout`] and issues drawing calls against a
//! [`ChartCanvas`]. Coordinates are CSS pixels; the canvas scales them by the
//! device pixel ratio.

use shared::chart::{
    ChartLayout, ChartModel, AXIS_COLOR, CHART_PADDING, EMPTY_COLOR, EMPTY_MESSAGE, GRID_COLOR,
    LABEL_COLOR, LEGEND_SWATCH, LINE_WIDTH, POINT_RADIUS,
};
use shared::YieldRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub color: &'static str,
    pub size: f64,
    pub bold: bool,
    pub anchor: TextAnchor,
    /// Rotation in degrees around the anchor point
    pub rotate: f64,
}

impl TextStyle {
    pub const fn new(color: &'static str, size: f64, anchor: TextAnchor) -> Self {
        Self {
            color,
            size,
            bold: false,
            anchor,
            rotate: 0.0,
        }
    }
}

/// Drawing surface of the chart
pub trait ChartCanvas {
    /// Size the backing store and reset any previous drawing
    fn begin(&mut self, layout: &ChartLayout);
    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: &str, width: f64);
    fn polyline(&mut self, points: &[(f64, f64)], color: &str, width: f64);
    fn circle(&mut self, center: (f64, f64), radius: f64, fill: &str);
    fn rect(&mut self, origin: (f64, f64), size: (f64, f64), fill: &str);
    fn text(&mut self, at: (f64, f64), text: &str, style: TextStyle);
}

const LABEL_STYLE: TextStyle = TextStyle::new(LABEL_COLOR, 12.0, TextAnchor::Middle);

/// Draw the chart for `records`; no records draws only the empty-state message
pub fn draw_chart<C: ChartCanvas>(canvas: &mut C, records: &[YieldRecord], layout: &ChartLayout) {
    canvas.begin(layout);

    let Some(model) = ChartModel::from_records(records) else {
        canvas.text(
            (layout.width / 2.0, layout.height / 2.0),
            EMPTY_MESSAGE,
            TextStyle::new(EMPTY_COLOR, 14.0, TextAnchor::Middle),
        );
        return;
    };

    draw_frame(canvas, &model, layout);

    for series in &model.series {
        let points = layout.series_points(&model, series);
        if points.len() > 1 {
            canvas.polyline(&points, series.color, LINE_WIDTH);
        }
        for point in points {
            canvas.circle(point, POINT_RADIUS, series.color);
        }
    }

    for entry in layout.legend(&model) {
        canvas.rect(
            (entry.x, entry.y - LEGEND_SWATCH / 2.0),
            (LEGEND_SWATCH, LEGEND_SWATCH),
            entry.color,
        );
        canvas.text(
            (entry.x + LEGEND_SWATCH + 4.0, entry.y + 4.0),
            &entry.label,
            TextStyle::new(AXIS_COLOR, 12.0, TextAnchor::Start),
        );
    }
}

fn draw_frame<C: ChartCanvas>(canvas: &mut C, model: &ChartModel, layout: &ChartLayout) {
    let (left, bottom) = layout.origin();
    let right = left + layout.plot_width();

    for grid in layout.grid_lines(model) {
        canvas.line((left, grid.y), (right, grid.y), GRID_COLOR, 1.0);
        canvas.text(
            (left - 10.0, grid.y + 4.0),
            &grid.label,
            TextStyle {
                anchor: TextAnchor::End,
                ..LABEL_STYLE
            },
        );
    }

    canvas.line((left, CHART_PADDING.top), (left, bottom), AXIS_COLOR, 2.0);
    canvas.line((left, bottom), (right, bottom), AXIS_COLOR, 2.0);

    for label in layout.date_labels(model) {
        canvas.text((label.x, bottom + 20.0), &label.text, LABEL_STYLE);
    }

    let title = TextStyle {
        color: AXIS_COLOR,
        size: 14.0,
        bold: true,
        ..LABEL_STYLE
    };
    canvas.text((left + layout.plot_width() / 2.0, layout.height - 10.0), "Date", title);
    canvas.text(
        (15.0, CHART_PADDING.top + layout.plot_height() / 2.0),
        "Value",
        TextStyle {
            rotate: -90.0,
            ..title
        },
    );
}
