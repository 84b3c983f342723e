//! Projects numeric series onto a bounded 2D surface.
//!
//! Output is plain geometry (points, segments, a placeholder label); nothing
//! here knows how it will be drawn.

use crate::analytics::numeric::{min_max, normalize};

/// Placeholder text shown instead of an empty chart.
pub const NO_DATA_LABEL: &str = "No feature data yet";

/// Drawing surface in pixels. Origin is top-left, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSurface {
    pub width: f64,
    pub height: f64,
    pub pad: f64,
}

impl Default for ChartSurface {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 240.0,
            pad: 12.0,
        }
    }
}

impl ChartSurface {
    /// Maps ratios in `[0, 1]` to pixels. Larger `y_ratio` lands higher on screen.
    pub fn project(&self, x_ratio: f64, y_ratio: f64) -> Point {
        Point {
            x: self.pad + x_ratio * (self.width - 2.0 * self.pad),
            y: self.height - self.pad - y_ratio * (self.height - 2.0 * self.pad),
        }
    }

    /// L-shaped frame: left axis then bottom axis.
    pub fn axes(&self) -> Vec<Segment> {
        let top_left = Point { x: self.pad, y: self.pad };
        let origin = Point { x: self.pad, y: self.height - self.pad };
        let bottom_right = Point { x: self.width - self.pad, y: self.height - self.pad };
        vec![
            Segment { from: top_left, to: origin },
            Segment { from: origin, to: bottom_right },
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

/// One projected series.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub label: &'static str,
    pub points: Vec<Point>,
}

impl Trace {
    /// Consecutive point pairs.
    pub fn segments(&self) -> Vec<Segment> {
        self.points
            .windows(2)
            .map(|pair| Segment { from: pair[0], to: pair[1] })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    pub axes: Vec<Segment>,
    pub traces: Vec<Trace>,
    /// Highlighted terminal point; single-series charts only.
    pub marker: Option<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    NoData { label: &'static str, anchor: Point },
    Plot(ChartGeometry),
}

impl Chart {
    fn no_data(surface: &ChartSurface) -> Self {
        Chart::NoData {
            label: NO_DATA_LABEL,
            anchor: Point { x: 20.0, y: surface.height / 2.0 },
        }
    }

    pub fn geometry(&self) -> Option<&ChartGeometry> {
        match self {
            Chart::Plot(g) => Some(g),
            Chart::NoData { .. } => None,
        }
    }
}

/// Normalizes `series` against its own min/max and spreads it across the x axis.
pub fn project_series(series: &[f64], surface: &ChartSurface, label: &'static str) -> Trace {
    let (min, max) = min_max(series).unwrap_or((0.0, 0.0));
    let last_index = series.len().saturating_sub(1).max(1) as f64;

    let points = series
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            let y_ratio = if value.is_finite() { normalize(*value, min, max) } else { 0.5 };
            surface.project(idx as f64 / last_index, y_ratio)
        })
        .collect();

    Trace { label, points }
}

/// Single-series line chart with the newest point highlighted.
pub fn single_series_chart(series: &[f64], surface: &ChartSurface) -> Chart {
    if series.is_empty() {
        return Chart::no_data(surface);
    }

    let trace = project_series(series, surface, "mid");
    let marker = trace.points.last().copied();
    Chart::Plot(ChartGeometry {
        axes: surface.axes(),
        traces: vec![trace],
        marker,
    })
}

/// Two series overlaid on one surface, each on its own scale.
pub fn dual_series_chart(
    primary: (&'static str, &[f64]),
    secondary: (&'static str, &[f64]),
    surface: &ChartSurface,
) -> Chart {
    let traces: Vec<Trace> = [primary, secondary]
        .into_iter()
        .filter(|(_, series)| !series.is_empty())
        .map(|(label, series)| project_series(series, surface, label))
        .collect();

    if traces.is_empty() {
        return Chart::no_data(surface);
    }

    Chart::Plot(ChartGeometry {
        axes: surface.axes(),
        traces,
        marker: None,
    })
}
