//! finboard - financial dashboard over six CSV tables
//!
//! Loads the tables, derives the metrics, builds eight Plotly charts and
//! serves them as one page. Charts can also be exported as PNGs and a deck.

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod ppt;
pub mod report;
pub mod server;
