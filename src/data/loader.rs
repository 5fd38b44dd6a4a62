//! CSV Data Loader Module
//! Reads the six financial tables from disk using Polars.

use crate::config::DataConfig;
use polars::prelude::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Data file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("Failed to load CSV {}: {source}", path.display())]
    CsvError {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("Expected {expected} tables, loaded {found}")]
    TableCount { expected: usize, found: usize },
}

/// The six input tables, each backed by a fixed file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Revenue,
    Cogs,
    Profit,
    Expenses,
    Budget,
    BalanceSheet,
}

impl Dataset {
    pub const ALL: [Dataset; 6] = [
        Dataset::Revenue,
        Dataset::Cogs,
        Dataset::Profit,
        Dataset::Expenses,
        Dataset::Budget,
        Dataset::BalanceSheet,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Dataset::Revenue => "revenue_df.csv",
            Dataset::Cogs => "cogs_df.csv",
            Dataset::Profit => "profit_df.csv",
            Dataset::Expenses => "expenses_df.csv",
            Dataset::Budget => "budget_df.csv",
            Dataset::BalanceSheet => "balance_sheet_df.csv",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Revenue => "revenue",
            Dataset::Cogs => "cogs",
            Dataset::Profit => "profit",
            Dataset::Expenses => "expenses",
            Dataset::Budget => "budget",
            Dataset::BalanceSheet => "balance_sheet",
        }
    }
}

/// All tables the dashboard is built from. Read-only after load.
#[derive(Debug, Clone)]
pub struct FinancialTables {
    pub revenue: DataFrame,
    pub cogs: DataFrame,
    pub profit: DataFrame,
    pub expenses: DataFrame,
    pub budget: DataFrame,
    pub balance_sheet: DataFrame,
}

impl FinancialTables {
    /// Tables in `Dataset::ALL` order; any other count is an error.
    fn from_frames(frames: Vec<DataFrame>) -> Result<Self, LoaderError> {
        let [revenue, cogs, profit, expenses, budget, balance_sheet] =
            <[DataFrame; 6]>::try_from(frames).map_err(|frames| LoaderError::TableCount {
                expected: Dataset::ALL.len(),
                found: frames.len(),
            })?;
        Ok(Self {
            revenue,
            cogs,
            profit,
            expenses,
            budget,
            balance_sheet,
        })
    }
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a single CSV file. Malformed rows are an error, not skipped.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::MissingFile(path.to_path_buf()));
        }

        let csv_error = |source| LoaderError::CsvError {
            path: path.to_path_buf(),
            source,
        };

        LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()
            .map_err(csv_error)?
            .collect()
            .map_err(csv_error)
    }

    /// Load all six tables from the configured directory.
    pub fn load_all(config: &DataConfig) -> Result<FinancialTables, LoaderError> {
        let frames = Dataset::ALL
            .par_iter()
            .map(|&dataset| {
                let path = config.path_for(dataset);
                let df = Self::load_csv(&path)?;
                info!(
                    table = dataset.name(),
                    rows = df.height(),
                    columns = df.width(),
                    "loaded table"
                );
                Ok(df)
            })
            .collect::<Result<Vec<DataFrame>, LoaderError>>()?;

        // `collect` on an indexed parallel iterator keeps the order of `Dataset::ALL`.
        FinancialTables::from_frames(frames)
    }
}
