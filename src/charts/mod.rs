//! Charts module - figure model, builders and static rendering

pub mod figure;
mod plotter;
mod renderer;

pub use figure::{Figure, NumberFormat, Trace};
pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};
