//! Static Chart Renderer
//! Draws a `Figure` into a PNG with plotters, for file and slide export.
//!
//! Layout:
//! 1. Title centred on top
//! 2. Categorical x axis, value axis on the left, optional value axis on the right
//! 3. Bars grouped side by side per category, stacked areas as filled bands,
//!    lines with optional markers
//! 4. Legend in the upper left corner

use crate::charts::figure::{AxisRef, Figure, NumberFormat, Trace, TraceKind};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::io::Cursor;
use std::ops::Range;
use thiserror::Error;

const TEXT: RGBColor = RGBColor(42, 63, 95);
const GRID: RGBColor = RGBColor(235, 240, 248);

/// Used when a trace carries no colour of its own.
const FALLBACK: [RGBColor; 4] = [
    RGBColor(99, 110, 250),
    RGBColor(239, 85, 59),
    RGBColor(0, 204, 150),
    RGBColor(171, 99, 250),
];

/// Fraction of a category slot covered by its bars.
const BAR_GROUP_WIDTH: f64 = 0.8;
const AREA_ALPHA: f64 = 0.45;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart '{title}': {message}")]
    Draw { title: String, message: String },
    #[error("Invalid image size {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render a figure to PNG bytes.
    pub fn render_png(figure: &Figure, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize(width, height));
        }

        let draw_error = |e: DrawingAreaErrorKind<_>| RenderError::Draw {
            title: figure.title().to_string(),
            message: e.to_string(),
        };

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            Self::draw_figure(&root, figure).map_err(draw_error)?;
            root.present().map_err(draw_error)?;
        }

        let image = RgbImage::from_raw(width, height, buffer)
            .ok_or(RenderError::InvalidSize(width, height))?;
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }

    fn draw_figure<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        figure: &Figure,
    ) -> DrawResult<DB> {
        root.fill(&WHITE)?;

        let categories = Self::categories(figure);
        let n = categories.len().max(1);
        let x_range = -0.5..(n as f64 - 0.5);
        let y_range = Self::value_range(figure, AxisRef::Primary);
        let secondary = figure.has_secondary_axis();
        let y2_range = if secondary {
            Self::value_range(figure, AxisRef::Secondary)
        } else {
            y_range.clone()
        };

        let mut chart = ChartBuilder::on(root)
            .caption(figure.title(), ("sans-serif", 24).into_font().color(&TEXT))
            .margin(16)
            .x_label_area_size(48)
            .y_label_area_size(88)
            .right_y_label_area_size(if secondary { 64 } else { 0 })
            .build_cartesian_2d(x_range.clone(), y_range)?
            .set_secondary_coord(x_range, y2_range);

        let y_format = figure.layout.yaxis.number_format;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(GRID)
            .light_line_style(WHITE)
            .x_labels(n + 1)
            .x_label_formatter(&|x: &f64| Self::category_label(&categories, *x))
            .y_label_formatter(&|y: &f64| Self::tick_label(y_format, *y))
            .x_desc(figure.layout.xaxis.title_text())
            .y_desc(figure.layout.yaxis.title_text())
            .axis_desc_style(("sans-serif", 16).into_font().color(&TEXT))
            .label_style(("sans-serif", 13).into_font().color(&TEXT))
            .draw()?;

        if let Some(axis) = figure.layout.yaxis2.as_ref().filter(|_| secondary) {
            let y2_format = axis.number_format;
            chart
                .configure_secondary_axes()
                .y_desc(axis.title_text())
                .y_label_formatter(&|y: &f64| Self::tick_label(y2_format, *y))
                .axis_desc_style(("sans-serif", 16).into_font().color(&TEXT))
                .label_style(("sans-serif", 13).into_font().color(&TEXT))
                .draw()?;
        }

        // Stacked areas go first so bars and lines stay visible on top.
        for axis in [AxisRef::Primary, AxisRef::Secondary] {
            let stacked: Vec<&Trace> = figure
                .data
                .iter()
                .filter(|t| t.yaxis == axis && t.is_stacked())
                .collect();
            for (trace, (lower, upper)) in stacked
                .iter()
                .zip(Self::stacked_bounds(&stacked, &categories))
            {
                let color = Self::trace_color(figure, trace);
                let outline: Vec<(f64, f64)> =
                    upper.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect();
                let mut band = outline.clone();
                band.extend(lower.iter().enumerate().rev().map(|(i, v)| (i as f64, *v)));

                let fill = Polygon::new(band, color.mix(AREA_ALPHA).filled());
                let edge = LineSeries::new(outline, color.stroke_width(2));
                match axis {
                    AxisRef::Primary => {
                        chart.draw_series(std::iter::once(fill))?;
                        chart.draw_series(edge)?;
                    }
                    AxisRef::Secondary => {
                        chart.draw_secondary_series(std::iter::once(fill))?;
                        chart.draw_secondary_series(edge)?;
                    }
                }
            }
        }

        let bars: Vec<&Trace> = figure
            .data
            .iter()
            .filter(|t| t.kind == TraceKind::Bar)
            .collect();
        for (idx, trace) in bars.iter().enumerate() {
            let color = Self::trace_color(figure, trace);
            let rects: Vec<Rectangle<(f64, f64)>> = trace
                .x
                .iter()
                .zip(&trace.y)
                .filter_map(|(label, value)| {
                    let center = categories.iter().position(|c| c == label)? as f64;
                    let (slot, slots) = Self::bar_slot(&bars, idx, label);
                    let width = BAR_GROUP_WIDTH / slots as f64;
                    let x0 = center - BAR_GROUP_WIDTH / 2.0 + slot as f64 * width;
                    Some(Rectangle::new(
                        [(x0, 0.0), (x0 + width, *value)],
                        color.filled(),
                    ))
                })
                .collect();
            match trace.yaxis {
                AxisRef::Primary => chart.draw_series(rects)?,
                AxisRef::Secondary => chart.draw_secondary_series(rects)?,
            };
        }

        for trace in figure
            .data
            .iter()
            .filter(|t| t.kind == TraceKind::Scatter && !t.is_stacked())
        {
            let color = Self::trace_color(figure, trace);
            let width = trace
                .line
                .as_ref()
                .and_then(|l| l.width)
                .unwrap_or(2.0)
                .round() as u32;
            let points: Vec<(f64, f64)> = trace
                .x
                .iter()
                .zip(&trace.y)
                .filter_map(|(label, value)| {
                    let i = categories.iter().position(|c| c == label)?;
                    Some((i as f64, *value))
                })
                .collect();
            let markers: Vec<Circle<(f64, f64), i32>> = if trace.mode.is_some_and(|m| m.has_markers()) {
                points.iter().map(|p| Circle::new(*p, 4, color.filled())).collect()
            } else {
                Vec::new()
            };
            let line = LineSeries::new(points, color.stroke_width(width));
            match trace.yaxis {
                AxisRef::Primary => {
                    chart.draw_series(line)?;
                    chart.draw_series(markers)?;
                }
                AxisRef::Secondary => {
                    chart.draw_secondary_series(line)?;
                    chart.draw_secondary_series(markers)?;
                }
            }
        }

        if !figure.layout.legend_visible() {
            return Ok(());
        }

        // Legend entries are registered on empty primary series so traces on
        // both axes share one legend box.
        let mut has_entries = false;
        for trace in figure.data.iter().filter(|t| t.showlegend != Some(false)) {
            let color = Self::trace_color(figure, trace);
            let anno = chart.draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?;
            anno.label(trace.name.as_str());
            if trace.kind == TraceKind::Bar || trace.is_stacked() {
                anno.legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 14, y + 5)], color.filled()));
            } else {
                anno.legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 14, y)], color.stroke_width(3)));
            }
            has_entries = true;
        }

        if has_entries {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.85))
                .border_style(GRID)
                .label_font(("sans-serif", 13).into_font().color(&TEXT))
                .draw()?;
        }
        Ok(())
    }

    /// Parse `#rrggbb`.
    pub fn parse_hex(color: &str) -> Option<RGBColor> {
        let hex = color.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
    }

    fn trace_color(figure: &Figure, trace: &Trace) -> RGBColor {
        trace.color().and_then(Self::parse_hex).unwrap_or_else(|| {
            let idx = figure
                .data
                .iter()
                .position(|t| std::ptr::eq(t, trace))
                .unwrap_or(0);
            FALLBACK[idx % FALLBACK.len()]
        })
    }

    /// Distinct x labels across all traces, in first-seen order.
    pub fn categories(figure: &Figure) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for label in figure.data.iter().flat_map(|t| t.x.iter()) {
            if !seen.contains(label) {
                seen.push(label.clone());
            }
        }
        seen
    }

    /// Lower and upper edge of each stacked band, per category index.
    pub fn stacked_bounds(traces: &[&Trace], categories: &[String]) -> Vec<(Vec<f64>, Vec<f64>)> {
        let mut running = vec![0.0; categories.len()];
        traces
            .iter()
            .map(|trace| {
                let lower = running.clone();
                for (label, value) in trace.x.iter().zip(&trace.y) {
                    if let Some(i) = categories.iter().position(|c| c == label) {
                        running[i] += value;
                    }
                }
                (lower, running.clone())
            })
            .collect()
    }

    /// Position of bar trace `idx` among the bar traces present at `label`,
    /// and how many share that category.
    pub fn bar_slot(bars: &[&Trace], idx: usize, label: &str) -> (usize, usize) {
        let present: Vec<usize> = bars
            .iter()
            .enumerate()
            .filter(|(_, t)| t.x.iter().any(|x| x == label))
            .map(|(i, _)| i)
            .collect();
        let slot = present.iter().position(|&i| i == idx).unwrap_or(0);
        (slot, present.len().max(1))
    }

    /// Padded value range of all traces on one axis. Bars and areas start at zero.
    pub fn value_range(figure: &Figure, axis: AxisRef) -> Range<f64> {
        let categories = Self::categories(figure);
        let on_axis: Vec<&Trace> = figure.data.iter().filter(|t| t.yaxis == axis).collect();
        let stacked: Vec<&Trace> = on_axis.iter().copied().filter(|t| t.is_stacked()).collect();

        let stacked_values = Self::stacked_bounds(&stacked, &categories)
            .into_iter()
            .flat_map(|(_, upper)| upper);
        let plain_values = on_axis
            .iter()
            .filter(|t| !t.is_stacked())
            .flat_map(|t| t.y.iter().copied());
        let anchored = on_axis
            .iter()
            .any(|t| t.kind == TraceKind::Bar || t.is_stacked());

        let (mut lo, mut hi) = stacked_values
            .chain(plain_values)
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if !lo.is_finite() {
            return 0.0..1.0;
        }
        if anchored {
            lo = lo.min(0.0);
            hi = hi.max(0.0);
        }
        if (hi - lo).abs() < f64::EPSILON {
            lo -= 1.0;
            hi += 1.0;
        }

        let pad = (hi - lo) * 0.08;
        let lower = if anchored && lo == 0.0 { 0.0 } else { lo - pad };
        let upper = if anchored && hi == 0.0 { 0.0 } else { hi + pad };
        lower..upper
    }

    /// Tick text for a category axis; blank between categories.
    pub fn category_label(categories: &[String], x: f64) -> String {
        let nearest = x.round();
        if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
            return String::new();
        }
        categories
            .get(nearest as usize)
            .cloned()
            .unwrap_or_default()
    }

    pub fn tick_label(format: Option<NumberFormat>, value: f64) -> String {
        match format {
            Some(format) => format.format(value),
            None if value.abs() >= 1000.0 => NumberFormat::Thousands.format(value),
            None if value.fract() == 0.0 => format!("{value:.0}"),
            None => format!("{value:.1}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::figure::{Axis, Layout, Mode};

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn layout() -> Layout {
        Layout::new("t", Axis::category(None), Axis::value("v"))
    }

    #[test]
    fn parses_hex_colours() {
        assert_eq!(
            StaticChartRenderer::parse_hex("#1f77b4"),
            Some(RGBColor(0x1f, 0x77, 0xb4))
        );
        assert_eq!(StaticChartRenderer::parse_hex("1f77b4"), None);
        assert_eq!(StaticChartRenderer::parse_hex("#fff"), None);
        assert_eq!(StaticChartRenderer::parse_hex("#gg0000"), None);
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let fig = Figure::new(layout())
            .add_trace(Trace::bar("a", labels(&["B1", "B2"]), vec![1.0, 2.0]))
            .add_trace(Trace::bar("b", labels(&["B2", "Total"]), vec![3.0, 4.0]));
        assert_eq!(StaticChartRenderer::categories(&fig), ["B1", "B2", "Total"]);
    }

    #[test]
    fn stacked_bounds_accumulate_in_trace_order() {
        let x = labels(&["Y1", "Y2"]);
        let a = Trace::stacked_area("a", "one", x.clone(), vec![1.0, 2.0]);
        let b = Trace::stacked_area("b", "one", x.clone(), vec![10.0, 20.0]);
        let bounds = StaticChartRenderer::stacked_bounds(&[&a, &b], &x);

        assert_eq!(bounds[0], (vec![0.0, 0.0], vec![1.0, 2.0]));
        assert_eq!(bounds[1], (vec![1.0, 2.0], vec![11.0, 22.0]));
    }

    #[test]
    fn value_range_covers_stack_totals_and_starts_at_zero() {
        let x = labels(&["Y1", "Y2"]);
        let fig = Figure::new(layout())
            .add_trace(Trace::stacked_area("a", "one", x.clone(), vec![1.0, 2.0]))
            .add_trace(Trace::stacked_area("b", "one", x, vec![10.0, 20.0]));
        let range = StaticChartRenderer::value_range(&fig, AxisRef::Primary);

        assert_eq!(range.start, 0.0);
        assert!(range.end > 22.0);
    }

    #[test]
    fn value_range_is_per_axis() {
        let x = labels(&["Y1", "Y2"]);
        let fig = Figure::new(layout())
            .add_trace(Trace::bar("amount", x.clone(), vec![1000.0, 2000.0]))
            .add_trace(
                Trace::line("pct", x, vec![10.0, 20.0], Mode::LinesMarkers).on_secondary_axis(),
            );

        let primary = StaticChartRenderer::value_range(&fig, AxisRef::Primary);
        let secondary = StaticChartRenderer::value_range(&fig, AxisRef::Secondary);
        assert_eq!(primary.start, 0.0);
        assert!(primary.end > 2000.0);
        assert!(secondary.start < 10.0 && secondary.start > 0.0);
        assert!(secondary.end > 20.0 && secondary.end < 25.0);
    }

    #[test]
    fn empty_axis_gets_unit_range() {
        let fig = Figure::new(layout());
        assert_eq!(StaticChartRenderer::value_range(&fig, AxisRef::Secondary), 0.0..1.0);
    }

    #[test]
    fn bar_slots_split_shared_categories_only() {
        let budget = Trace::bar("Budget", labels(&["Revenue", "COGS"]), vec![1.0, 2.0]);
        let actual = Trace::bar("Actual", labels(&["Revenue", "COGS"]), vec![1.0, 2.0]);
        let grouped = [&budget, &actual];
        assert_eq!(StaticChartRenderer::bar_slot(&grouped, 0, "COGS"), (0, 2));
        assert_eq!(StaticChartRenderer::bar_slot(&grouped, 1, "COGS"), (1, 2));

        let b1 = Trace::bar("B1", labels(&["B1"]), vec![1.0]);
        let b2 = Trace::bar("B2", labels(&["B2"]), vec![1.0]);
        assert_eq!(StaticChartRenderer::bar_slot(&[&b1, &b2], 1, "B2"), (0, 1));
    }

    #[test]
    fn tick_and_category_labels() {
        let cats = labels(&["Year -1", "Year 0"]);
        assert_eq!(StaticChartRenderer::category_label(&cats, 1.0), "Year 0");
        assert_eq!(StaticChartRenderer::category_label(&cats, 0.5), "");
        assert_eq!(StaticChartRenderer::category_label(&cats, 2.0), "");

        assert_eq!(
            StaticChartRenderer::tick_label(Some(NumberFormat::Currency), 250000.0),
            "$250,000"
        );
        assert_eq!(StaticChartRenderer::tick_label(None, 12000.0), "12,000");
        assert_eq!(StaticChartRenderer::tick_label(None, 12.5), "12.5");
        assert_eq!(StaticChartRenderer::tick_label(None, 12.0), "12");
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let fig = Figure::new(layout());
        assert!(matches!(
            StaticChartRenderer::render_png(&fig, 0, 300),
            Err(RenderError::InvalidSize(0, 300))
        ));
    }
}
