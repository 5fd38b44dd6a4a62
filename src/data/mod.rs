//! Data module - CSV loading and derived financial tables

mod loader;
mod processor;

pub use loader::{DataLoader, Dataset, FinancialTables, LoaderError};
pub use processor::{DataProcessor, ProcessorError, CAGR_PERIODS};

/// Column names shared by the input CSV files and the derived tables.
pub mod columns {
    pub const YEAR: &str = "Year";
    pub const CONSOLIDATED: &str = "Consolidated";
    pub const BUSINESS_UNITS: [&str; 3] = ["Business 1", "Business 2", "Business 3"];

    pub const COGS: &str = "COGS";

    pub const PROFIT_AMOUNT: &str = "Profit $";
    pub const PROFIT_PCT: &str = "Profit %";

    pub const SALARIES: &str = "Salaries";
    pub const RENT: &str = "Rent";
    pub const DEPRECIATION: &str = "D&A";
    pub const INTEREST: &str = "Interest";
    pub const TOTAL: &str = "Total";
    pub const EXPENSE_LINES: [&str; 4] = [SALARIES, RENT, DEPRECIATION, INTEREST];

    pub const CATEGORY: &str = "Category";
    pub const VALUE: &str = "Value";
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::FinancialTables;
    use polars::prelude::*;

    /// Five years of small, round numbers. Business 1 doubles over the span.
    pub fn tables() -> FinancialTables {
        let years = ["Year -4", "Year -3", "Year -2", "Year -1", "Year 0"];
        FinancialTables {
            revenue: df!(
                "Year" => years,
                "Business 1" => [100.0, 120.0, 140.0, 170.0, 200.0],
                "Business 2" => [80.0, 85.0, 90.0, 95.0, 100.0],
                "Business 3" => [20.0, 25.0, 30.0, 35.0, 100.0],
                "Consolidated" => [200.0, 230.0, 260.0, 300.0, 400.0]
            )
            .expect("revenue fixture"),
            cogs: df!(
                "Year" => years,
                "COGS" => [100.0, 115.0, 117.0, 150.0, 160.0]
            )
            .expect("cogs fixture"),
            profit: df!(
                "Year" => years,
                "Profit $" => [40.0, 45.0, 63.0, 60.0, 120.0],
                "Profit %" => [20.0, 19.57, 24.23, 20.0, 30.0]
            )
            .expect("profit fixture"),
            expenses: df!(
                "Year" => years,
                "Salaries" => [40.0, 46.0, 52.0, 60.0, 80.0],
                "Rent" => [10.0, 11.5, 13.0, 15.0, 20.0],
                "D&A" => [6.0, 7.0, 9.0, 10.0, 12.0],
                "Interest" => [4.0, 5.5, 6.0, 5.0, 8.0],
                "Total" => [60.0, 70.0, 80.0, 90.0, 120.0]
            )
            .expect("expenses fixture"),
            budget: df!(
                "Category" => ["Revenue", "COGS", "Expenses", "Profit ($)", "Profit (%)"],
                "Value" => [380.0, 150.0, 110.0, 120.0, 31.6]
            )
            .expect("budget fixture"),
            balance_sheet: df!(
                "Item" => ["Current Assets", "Non-current Assets", "Total Assets"],
                "Value" => [250.0, 750.0, 1000.0]
            )
            .expect("balance sheet fixture"),
        }
    }
}
