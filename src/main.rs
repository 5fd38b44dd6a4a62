//! finboard - Financial Reporting Dashboard
//!
//! Reads six CSV tables, builds the dashboard and either serves it over HTTP
//! or exports the charts as PNGs and a PowerPoint deck.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use finboard::config::{
    DataConfig, DEFAULT_BIND, DEFAULT_DATA_DIR, DEFAULT_EXPORT_HEIGHT, DEFAULT_EXPORT_WIDTH,
    DEFAULT_TITLE,
};
use finboard::dashboard::Dashboard;
use finboard::data::DataLoader;
use finboard::report::ReportExporter;
use finboard::server::{self, AppState};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "finboard", version, about = "Financial reporting dashboard")]
struct Cli {
    /// Directory holding the six CSV tables
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// Page heading
    #[arg(long, global = true, default_value = DEFAULT_TITLE)]
    title: String,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the dashboard page (default)
    Serve {
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: String,
    },
    /// Write every chart as PNG plus a slide deck
    Export {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = DEFAULT_EXPORT_WIDTH)]
        width: u32,
        #[arg(long, default_value_t = DEFAULT_EXPORT_HEIGHT)]
        height: u32,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = DataConfig::new(&cli.data_dir);
    let tables = DataLoader::load_all(&config)
        .with_context(|| format!("loading tables from {}", config.data_dir().display()))?;
    let dashboard = Dashboard::build(&cli.title, &tables).context("building charts")?;

    match cli.command.unwrap_or(Command::Serve {
        bind: DEFAULT_BIND.to_string(),
    }) {
        Command::Serve { bind } => {
            let page = dashboard.render_html().context("rendering dashboard page")?;
            let listener = TcpListener::bind(&bind)
                .await
                .with_context(|| format!("binding {bind}"))?;
            server::serve(listener, AppState::new(page))
                .await
                .context("server failed")?;
        }
        Command::Export { out, width, height } => {
            let summary = tokio::task::spawn_blocking(move || {
                ReportExporter::export(&dashboard, &out, width, height)
            })
            .await
            .context("export task panicked")?
            .context("exporting charts")?;
            info!(
                deck = %summary.deck.display(),
                slides = summary.slides,
                "export complete"
            );
        }
    }
    Ok(())
}
