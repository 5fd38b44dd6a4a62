//! Declarative chart description.
//!
//! Serialises to the `{ "data": [...], "layout": {...} }` shape Plotly.js
//! consumes, and is also the input of the static PNG renderer.

use serde::Serialize;

/// Chart height shared by every dashboard panel.
pub const CHART_HEIGHT: u32 = 400;

const GRID_COLOR: &str = "#EBF0F8";
const FONT_COLOR: &str = "#2a3f5f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Bar,
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    #[serde(rename = "lines")]
    Lines,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

impl Mode {
    pub fn has_markers(self) -> bool {
        matches!(self, Mode::LinesMarkers)
    }
}

/// Which y axis a trace is plotted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum AxisRef {
    #[default]
    #[serde(rename = "y")]
    Primary,
    #[serde(rename = "y2")]
    Secondary,
}

impl AxisRef {
    fn is_primary(&self) -> bool {
        *self == AxisRef::Primary
    }
}

/// d3-format strings used for hover text and tick labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// `,.0f`
    Thousands,
    /// `$,.0f`
    Currency,
    /// `,.1f`
    OneDecimal,
    /// `,.2f`
    TwoDecimals,
}

impl NumberFormat {
    pub fn d3(self) -> &'static str {
        match self {
            NumberFormat::Thousands => ",.0f",
            NumberFormat::Currency => "$,.0f",
            NumberFormat::OneDecimal => ",.1f",
            NumberFormat::TwoDecimals => ",.2f",
        }
    }

    fn decimals(self) -> usize {
        match self {
            NumberFormat::Thousands | NumberFormat::Currency => 0,
            NumberFormat::OneDecimal => 1,
            NumberFormat::TwoDecimals => 2,
        }
    }

    /// Format a value the way d3 would for this format string. Halves round
    /// away from zero.
    pub fn format(self, value: f64) -> String {
        let scale = 10f64.powi(self.decimals() as i32);
        let rounded = (value.abs() * scale).round() / scale;
        let fixed = format!("{:.*}", self.decimals(), rounded);
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (fixed.as_str(), None),
        };

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        if let Some(frac) = frac_part {
            grouped.push('.');
            grouped.push_str(frac);
        }

        let negative = value < 0.0 && grouped.chars().any(|c| c.is_ascii_digit() && c != '0');
        let sign = if negative { "-" } else { "" };
        match self {
            NumberFormat::Currency => format!("{sign}${grouped}"),
            _ => format!("{sign}{grouped}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl From<&str> for Title {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stackgroup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "AxisRef::is_primary")]
    pub yaxis: AxisRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

impl Trace {
    fn new(kind: TraceKind, name: &str, x: Vec<String>, y: Vec<f64>) -> Self {
        Self {
            kind,
            name: name.to_string(),
            x,
            y,
            mode: None,
            stackgroup: None,
            marker: None,
            line: None,
            yaxis: AxisRef::Primary,
            hovertemplate: None,
            showlegend: None,
        }
    }

    pub fn bar(name: &str, x: Vec<String>, y: Vec<f64>) -> Self {
        Self::new(TraceKind::Bar, name, x, y)
    }

    pub fn line(name: &str, x: Vec<String>, y: Vec<f64>, mode: Mode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::new(TraceKind::Scatter, name, x, y)
        }
    }

    /// A filled band stacked on top of the previous traces of `group`.
    pub fn stacked_area(name: &str, group: &str, x: Vec<String>, y: Vec<f64>) -> Self {
        Self {
            mode: Some(Mode::Lines),
            stackgroup: Some(group.to_string()),
            ..Self::new(TraceKind::Scatter, name, x, y)
        }
    }

    /// Sets the colour of bars or of the line, depending on the trace kind.
    pub fn with_color(mut self, color: &str) -> Self {
        match self.kind {
            TraceKind::Bar => self.marker = Some(Marker { color: color.to_string() }),
            TraceKind::Scatter => {
                let width = self.line.as_ref().and_then(|l| l.width);
                self.line = Some(Line {
                    color: color.to_string(),
                    width,
                });
            }
        }
        self
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        if let Some(line) = self.line.as_mut() {
            line.width = Some(width);
        }
        self
    }

    pub fn on_secondary_axis(mut self) -> Self {
        self.yaxis = AxisRef::Secondary;
        self
    }

    pub fn with_hovertemplate(mut self, template: impl Into<String>) -> Self {
        self.hovertemplate = Some(template.into());
        self
    }

    pub fn hide_legend(mut self) -> Self {
        self.showlegend = Some(false);
        self
    }

    /// Colour used when drawing this trace statically.
    pub fn color(&self) -> Option<&str> {
        match self.kind {
            TraceKind::Bar => self.marker.as_ref().map(|m| m.color.as_str()),
            TraceKind::Scatter => self.line.as_ref().map(|l| l.color.as_str()),
        }
    }

    pub fn is_stacked(&self) -> bool {
        self.stackgroup.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickformat: Option<&'static str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gridcolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zerolinecolor: Option<&'static str>,
    #[serde(skip)]
    pub number_format: Option<NumberFormat>,
}

impl Axis {
    /// Categorical x axis; keeps numeric-looking years in row order.
    pub fn category(title: Option<&str>) -> Self {
        Self {
            title: title.map(Title::from),
            axis_type: Some("category"),
            gridcolor: Some(GRID_COLOR),
            ..Self::default()
        }
    }

    pub fn value(title: &str) -> Self {
        Self {
            title: Some(title.into()),
            gridcolor: Some(GRID_COLOR),
            zerolinecolor: Some(GRID_COLOR),
            ..Self::default()
        }
    }

    /// Right-hand axis sharing the x axis with `y`.
    pub fn secondary(title: &str) -> Self {
        Self {
            title: Some(title.into()),
            overlaying: Some("y"),
            side: Some("right"),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.tickformat = Some(format.d3());
        self.number_format = Some(format);
        self
    }

    pub fn title_text(&self) -> &str {
        self.title.as_ref().map(|t| t.text.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub height: u32,
    pub paper_bgcolor: &'static str,
    pub plot_bgcolor: &'static str,
    pub font: Font,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis2: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

impl Layout {
    /// White theme at the dashboard's panel height.
    pub fn new(title: &str, xaxis: Axis, yaxis: Axis) -> Self {
        Self {
            title: title.into(),
            height: CHART_HEIGHT,
            paper_bgcolor: "white",
            plot_bgcolor: "white",
            font: Font { color: FONT_COLOR },
            hovermode: None,
            barmode: None,
            xaxis,
            yaxis,
            yaxis2: None,
            legend: None,
            showlegend: None,
        }
    }

    pub fn unified_hover(mut self) -> Self {
        self.hovermode = Some("x unified");
        self
    }

    pub fn grouped_bars(mut self) -> Self {
        self.barmode = Some("group");
        self
    }

    /// One full-width bar per category when traces do not share categories.
    pub fn relative_bars(mut self) -> Self {
        self.barmode = Some("relative");
        self
    }

    pub fn with_secondary_axis(mut self, axis: Axis) -> Self {
        self.yaxis2 = Some(axis);
        self
    }

    pub fn with_legend_title(mut self, title: &str) -> Self {
        self.legend = Some(Legend {
            title: title.into(),
        });
        self
    }

    pub fn hide_legend(mut self) -> Self {
        self.showlegend = Some(false);
        self
    }

    pub fn legend_visible(&self) -> bool {
        self.showlegend.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn new(layout: Layout) -> Self {
        Self {
            data: Vec::new(),
            layout,
        }
    }

    pub fn add_trace(mut self, trace: Trace) -> Self {
        self.data.push(trace);
        self
    }

    pub fn title(&self) -> &str {
        &self.layout.title.text
    }

    pub fn has_secondary_axis(&self) -> bool {
        self.data.iter().any(|t| t.yaxis == AxisRef::Secondary)
    }
}
