//! Data Processor Module
//! Derives the small per-chart tables (snapshots, ratios, growth rates).

use super::columns;
use super::FinancialTables;
use polars::prelude::*;
use thiserror::Error;

/// CAGR is always measured over four periods (five yearly data points).
pub const CAGR_PERIODS: u32 = 4;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("'{0}' has no rows")]
    EmptyTable(String),
    #[error("Column '{column}' has a null value at row {row}")]
    NullValue { column: String, row: usize },
    #[error("Budget has no '{0}' category")]
    MissingCategory(String),
    #[error("Expected at least {expected} rows in '{table}', found {found}")]
    InsufficientRows {
        table: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Row count mismatch: '{left}' has {left_rows} rows, '{right}' has {right_rows}")]
    RowCountMismatch {
        left: &'static str,
        left_rows: usize,
        right: &'static str,
        right_rows: usize,
    },
}

/// Labels of the budget-vs-actual comparison, in display order.
pub const BUDGET_LABELS: [&str; 4] = ["Revenue", "COGS", "Expenses", "Profit"];

/// Budget table categories matching `BUDGET_LABELS`.
const BUDGET_CATEGORIES: [&str; 4] = ["Revenue", "COGS", "Expenses", "Profit ($)"];

pub const BALANCE_SHEET_LABELS: [&str; 2] = ["Current Assets", "Non-current Assets"];

/// Stateless derivations over read-only tables.
pub struct DataProcessor;

impl DataProcessor {
    /// Read a column as floats. Nulls are rejected.
    pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, ProcessorError> {
        let casted = df.column(name)?.cast(&DataType::Float64)?;
        casted
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| ProcessorError::NullValue {
                    column: name.to_string(),
                    row,
                })
            })
            .collect()
    }

    /// Read a column as display labels, whatever its stored type.
    pub fn label_column(df: &DataFrame, name: &str) -> Result<Vec<String>, ProcessorError> {
        let casted = df.column(name)?.cast(&DataType::String)?;
        Ok(casted
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect())
    }

    pub fn first_value(df: &DataFrame, name: &str) -> Result<f64, ProcessorError> {
        Self::numeric_column(df, name)?
            .first()
            .copied()
            .ok_or_else(|| ProcessorError::EmptyTable(name.to_string()))
    }

    pub fn last_value(df: &DataFrame, name: &str) -> Result<f64, ProcessorError> {
        Self::numeric_column(df, name)?
            .last()
            .copied()
            .ok_or_else(|| ProcessorError::EmptyTable(name.to_string()))
    }

    /// `(last / first)^(1 / periods) - 1`
    pub fn compound_growth_rate(first: f64, last: f64, periods: u32) -> f64 {
        (last / first).powf(1.0 / periods as f64) - 1.0
    }

    /// Latest-period revenue per business unit plus the consolidated total.
    ///
    /// Output columns: ["Business", "Revenue"]
    pub fn cumulative_revenue(revenue: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let names: Vec<&str> = columns::BUSINESS_UNITS
            .iter()
            .copied()
            .chain(std::iter::once(columns::CONSOLIDATED))
            .collect();
        let values = names
            .iter()
            .map(|name| Self::last_value(revenue, name))
            .collect::<Result<Vec<f64>, _>>()?;

        Ok(DataFrame::new(vec![
            Column::new("Business".into(), names),
            Column::new("Revenue".into(), values),
        ])?)
    }

    /// Four-period compound growth of each business unit, in percent.
    ///
    /// Output columns: ["Business Unit", "CAGR (%)"]
    pub fn cagr_table(revenue: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let rates = columns::BUSINESS_UNITS
            .iter()
            .map(|unit| {
                let first = Self::first_value(revenue, unit)?;
                let last = Self::last_value(revenue, unit)?;
                Ok(Self::compound_growth_rate(first, last, CAGR_PERIODS) * 100.0)
            })
            .collect::<Result<Vec<f64>, ProcessorError>>()?;

        Ok(DataFrame::new(vec![
            Column::new("Business Unit".into(), columns::BUSINESS_UNITS.to_vec()),
            Column::new("CAGR (%)".into(), rates),
        ])?)
    }

    /// COGS, salaries and rent as a share of consolidated revenue, per year.
    ///
    /// Output columns: ["Year", "COGS %", "Salaries %", "Rent %"]
    pub fn cost_structure_pct(
        revenue: &DataFrame,
        cogs: &DataFrame,
        expenses: &DataFrame,
    ) -> Result<DataFrame, ProcessorError> {
        Self::ensure_not_empty("revenue", revenue)?;
        Self::ensure_same_height("revenue", revenue, "cogs", cogs)?;
        Self::ensure_same_height("revenue", revenue, "expenses", expenses)?;

        let years = Self::label_column(revenue, columns::YEAR)?;
        let consolidated = Self::numeric_column(revenue, columns::CONSOLIDATED)?;
        let pct_of_revenue = |values: Vec<f64>| -> Vec<f64> {
            values
                .iter()
                .zip(&consolidated)
                .map(|(v, total)| v / total * 100.0)
                .collect()
        };

        let cogs_pct = pct_of_revenue(Self::numeric_column(cogs, columns::COGS)?);
        let salaries_pct = pct_of_revenue(Self::numeric_column(expenses, columns::SALARIES)?);
        let rent_pct = pct_of_revenue(Self::numeric_column(expenses, columns::RENT)?);

        Ok(DataFrame::new(vec![
            Column::new("Year".into(), years),
            Column::new("COGS %".into(), cogs_pct),
            Column::new("Salaries %".into(), salaries_pct),
            Column::new("Rent %".into(), rent_pct),
        ])?)
    }

    /// `Value` of the first budget row whose `Category` matches.
    pub fn budget_value(budget: &DataFrame, category: &str) -> Result<f64, ProcessorError> {
        let matched = budget
            .clone()
            .lazy()
            .filter(col(columns::CATEGORY).eq(lit(category)))
            .select([col(columns::VALUE).cast(DataType::Float64)])
            .collect()?;
        if matched.height() == 0 {
            return Err(ProcessorError::MissingCategory(category.to_string()));
        }

        matched
            .column(columns::VALUE)?
            .f64()?
            .get(0)
            .ok_or_else(|| ProcessorError::NullValue {
                column: columns::VALUE.to_string(),
                row: 0,
            })
    }

    /// Budgeted vs latest actual value for revenue, COGS, expenses and profit.
    ///
    /// Output columns: ["Category", "Budget", "Actual"]
    pub fn budget_vs_actual(tables: &FinancialTables) -> Result<DataFrame, ProcessorError> {
        let budget = BUDGET_CATEGORIES
            .iter()
            .map(|category| Self::budget_value(&tables.budget, category))
            .collect::<Result<Vec<f64>, _>>()?;

        let actual = vec![
            Self::last_value(&tables.revenue, columns::CONSOLIDATED)?,
            Self::last_value(&tables.cogs, columns::COGS)?,
            Self::last_value(&tables.expenses, columns::TOTAL)?,
            Self::last_value(&tables.profit, columns::PROFIT_AMOUNT)?,
        ];

        Ok(DataFrame::new(vec![
            Column::new("Category".into(), BUDGET_LABELS.to_vec()),
            Column::new("Budget".into(), budget),
            Column::new("Actual".into(), actual),
        ])?)
    }

    /// First two balance sheet values, labelled current and non-current assets.
    ///
    /// Output columns: ["Asset Type", "Value"]
    pub fn balance_sheet_summary(balance_sheet: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let values = Self::numeric_column(balance_sheet, columns::VALUE)?;
        if values.len() < BALANCE_SHEET_LABELS.len() {
            return Err(ProcessorError::InsufficientRows {
                table: "balance_sheet",
                expected: BALANCE_SHEET_LABELS.len(),
                found: values.len(),
            });
        }

        Ok(DataFrame::new(vec![
            Column::new("Asset Type".into(), BALANCE_SHEET_LABELS.to_vec()),
            Column::new("Value".into(), values[..BALANCE_SHEET_LABELS.len()].to_vec()),
        ])?)
    }

    /// Charts never draw from a table without rows.
    pub fn ensure_not_empty(table: &str, df: &DataFrame) -> Result<(), ProcessorError> {
        if df.height() == 0 {
            return Err(ProcessorError::EmptyTable(table.to_string()));
        }
        Ok(())
    }

    fn ensure_same_height(
        left: &'static str,
        left_df: &DataFrame,
        right: &'static str,
        right_df: &DataFrame,
    ) -> Result<(), ProcessorError> {
        if left_df.height() != right_df.height() {
            return Err(ProcessorError::RowCountMismatch {
                left,
                left_rows: left_df.height(),
                right,
                right_rows: right_df.height(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn compound_growth_rate_matches_formula() {
        assert_close(DataProcessor::compound_growth_rate(100.0, 200.0, 4), 2f64.powf(0.25) - 1.0);
        assert_close(DataProcessor::compound_growth_rate(50.0, 50.0, 4), 0.0);
    }

    #[test]
    fn cagr_table_uses_first_and_last_rows_over_four_periods() {
        let tables = fixtures::tables();
        let cagr = DataProcessor::cagr_table(&tables.revenue).expect("cagr");

        assert_eq!(
            DataProcessor::label_column(&cagr, "Business Unit").expect("labels"),
            vec!["Business 1", "Business 2", "Business 3"]
        );
        let rates = DataProcessor::numeric_column(&cagr, "CAGR (%)").expect("rates");
        assert_close(rates[0], (2f64.powf(0.25) - 1.0) * 100.0);
        assert_close(rates[1], ((100.0f64 / 80.0).powf(0.25) - 1.0) * 100.0);
        assert_close(rates[2], (5f64.powf(0.25) - 1.0) * 100.0);
    }

    #[test]
    fn cost_structure_is_share_of_consolidated_revenue() {
        let tables = fixtures::tables();
        let pct = DataProcessor::cost_structure_pct(&tables.revenue, &tables.cogs, &tables.expenses)
            .expect("cost structure");

        assert_eq!(
            DataProcessor::label_column(&pct, "Year").expect("years"),
            vec!["Year -4", "Year -3", "Year -2", "Year -1", "Year 0"]
        );
        let cogs = DataProcessor::numeric_column(&pct, "COGS %").expect("cogs");
        let salaries = DataProcessor::numeric_column(&pct, "Salaries %").expect("salaries");
        let rent = DataProcessor::numeric_column(&pct, "Rent %").expect("rent");
        assert_close(cogs[0], 50.0);
        assert_close(cogs[4], 40.0);
        assert_close(salaries[1], 46.0 / 230.0 * 100.0);
        assert_close(rent[3], 5.0);
    }

    #[test]
    fn cost_structure_rejects_misaligned_tables() {
        let tables = fixtures::tables();
        let short_cogs = tables.cogs.head(Some(3));
        let err = DataProcessor::cost_structure_pct(&tables.revenue, &short_cogs, &tables.expenses)
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::RowCountMismatch {
                right: "cogs",
                right_rows: 3,
                ..
            }
        ));
    }

    #[test]
    fn budget_vs_actual_pulls_one_scalar_per_category() {
        let tables = fixtures::tables();
        let cmp = DataProcessor::budget_vs_actual(&tables).expect("budget vs actual");

        assert_eq!(
            DataProcessor::label_column(&cmp, "Category").expect("labels"),
            BUDGET_LABELS.to_vec()
        );
        assert_eq!(
            DataProcessor::numeric_column(&cmp, "Budget").expect("budget"),
            vec![380.0, 150.0, 110.0, 120.0]
        );
        assert_eq!(
            DataProcessor::numeric_column(&cmp, "Actual").expect("actual"),
            vec![400.0, 160.0, 120.0, 120.0]
        );
    }

    #[test]
    fn budget_lookup_takes_first_match_and_reports_missing_category() {
        let budget = df!(
            "Category" => ["Revenue", "Revenue", "COGS"],
            "Value" => [1.0, 2.0, 3.0]
        )
        .expect("budget");
        assert_close(DataProcessor::budget_value(&budget, "Revenue").expect("revenue"), 1.0);

        let err = DataProcessor::budget_value(&budget, "Profit ($)").unwrap_err();
        assert!(matches!(err, ProcessorError::MissingCategory(c) if c == "Profit ($)"));
    }

    #[test]
    fn budget_lookup_reports_null_value_separately_from_missing_category() {
        let budget = df!(
            "Category" => ["Revenue", "COGS"],
            "Value" => [None, Some(3.0)]
        )
        .expect("budget");

        let err = DataProcessor::budget_value(&budget, "Revenue").unwrap_err();
        assert!(matches!(err, ProcessorError::NullValue { ref column, row: 0 } if column == "Value"));
        assert_close(DataProcessor::budget_value(&budget, "COGS").expect("cogs"), 3.0);
    }

    #[test]
    fn cost_structure_rejects_empty_tables() {
        let tables = fixtures::tables();
        let err = DataProcessor::cost_structure_pct(
            &tables.revenue.head(Some(0)),
            &tables.cogs.head(Some(0)),
            &tables.expenses.head(Some(0)),
        )
        .unwrap_err();
        assert!(matches!(err, ProcessorError::EmptyTable(t) if t == "revenue"));
    }

    #[test]
    fn cumulative_revenue_snapshots_last_row() {
        let tables = fixtures::tables();
        let snap = DataProcessor::cumulative_revenue(&tables.revenue).expect("snapshot");
        assert_eq!(
            DataProcessor::label_column(&snap, "Business").expect("labels"),
            vec!["Business 1", "Business 2", "Business 3", "Consolidated"]
        );
        assert_eq!(
            DataProcessor::numeric_column(&snap, "Revenue").expect("values"),
            vec![200.0, 100.0, 100.0, 400.0]
        );
    }

    #[test]
    fn balance_sheet_summary_takes_first_two_rows() {
        let tables = fixtures::tables();
        let summary = DataProcessor::balance_sheet_summary(&tables.balance_sheet).expect("summary");
        assert_eq!(
            DataProcessor::numeric_column(&summary, "Value").expect("values"),
            vec![250.0, 750.0]
        );

        let single = tables.balance_sheet.head(Some(1));
        assert!(matches!(
            DataProcessor::balance_sheet_summary(&single),
            Err(ProcessorError::InsufficientRows { found: 1, .. })
        ));
    }

    #[test]
    fn empty_and_malformed_tables_fail_loudly() {
        let tables = fixtures::tables();
        let empty = tables.revenue.head(Some(0));
        assert!(matches!(
            DataProcessor::cumulative_revenue(&empty),
            Err(ProcessorError::EmptyTable(_))
        ));

        let missing = tables.revenue.drop("Business 2").expect("drop");
        assert!(matches!(
            DataProcessor::cagr_table(&missing),
            Err(ProcessorError::PolarsError(_))
        ));

        let with_null = df!("Value" => [Some(1.0), None]).expect("df");
        assert!(matches!(
            DataProcessor::numeric_column(&with_null, "Value"),
            Err(ProcessorError::NullValue { row: 1, .. })
        ));
    }

    #[test]
    fn derivations_do_not_mutate_inputs() {
        let tables = fixtures::tables();
        let before = tables.clone();

        DataProcessor::cagr_table(&tables.revenue).expect("cagr");
        DataProcessor::budget_vs_actual(&tables).expect("budget");
        DataProcessor::cost_structure_pct(&tables.revenue, &tables.cogs, &tables.expenses)
            .expect("cost");

        assert!(tables.revenue.equals(&before.revenue));
        assert!(tables.budget.equals(&before.budget));
        assert!(tables.expenses.equals(&before.expenses));
    }
}
