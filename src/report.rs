//! Static export: one PNG per chart plus a slide deck holding all of them.

use crate::charts::{RenderError, StaticChartRenderer};
use crate::dashboard::Dashboard;
use crate::ppt::{PptError, PptGenerator};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DECK_FILE_NAME: &str = "financial_dashboard.pptx";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Failed to write slide deck: {0}")]
    Ppt(#[from] PptError),
}

#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub images: Vec<PathBuf>,
    pub deck: PathBuf,
    pub slides: usize,
}

pub struct ReportExporter;

impl ReportExporter {
    /// Render every chart at `width` x `height` and write the PNGs and the
    /// deck into `out_dir`, creating it if needed.
    pub fn export(
        dashboard: &Dashboard,
        out_dir: &Path,
        width: u32,
        height: u32,
    ) -> Result<ReportSummary, ReportError> {
        let panels: Vec<_> = dashboard.panels().collect();

        let rendered = panels
            .par_iter()
            .map(|panel| StaticChartRenderer::render_png(&panel.figure, width, height))
            .collect::<Result<Vec<Vec<u8>>, RenderError>>()?;

        fs::create_dir_all(out_dir).map_err(|source| ReportError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let mut images = Vec::with_capacity(rendered.len());
        for (panel, png) in panels.iter().zip(&rendered) {
            let path = out_dir.join(format!("{}.png", panel.kind.slug()));
            fs::write(&path, png).map_err(|source| ReportError::Io {
                path: path.clone(),
                source,
            })?;
            images.push(path);
        }

        let deck = out_dir.join(DECK_FILE_NAME);
        let slides = PptGenerator::generate_ppt_from_bytes(&rendered, &deck, &dashboard.title)?;
        info!(
            dir = %out_dir.display(),
            images = images.len(),
            slides,
            "exported dashboard"
        );

        Ok(ReportSummary {
            images,
            deck,
            slides,
        })
    }
}
