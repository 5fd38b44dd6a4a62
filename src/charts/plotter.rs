//! Chart Plotter Module
//! Builds the eight dashboard figures from the financial tables.

use crate::charts::figure::{Axis, Figure, Layout, Mode, NumberFormat, Trace};
use crate::data::{columns, DataProcessor, FinancialTables, ProcessorError};
use polars::prelude::DataFrame;

pub const BUSINESS_UNIT_COLORS: [&str; 3] = ["#1f77b4", "#ff7f0e", "#2ca02c"];
pub const CUMULATIVE_REVENUE_COLORS: [&str; 4] = ["#bbbbbb", "#888888", "#555555", "#000066"];
pub const EXPENSE_COLORS: [&str; 4] = ["#d62728", "#9467bd", "#8c564b", "#e377c2"];
/// Default qualitative palette for line charts without explicit colours.
pub const PALETTE: [&str; 3] = ["#636efa", "#EF553B", "#00cc96"];

const PROFIT_BAR_COLOR: &str = "#2ca02c";
const PROFIT_LINE_COLOR: &str = "#ff7f0e";
const BUDGET_COLOR: &str = "#9467bd";
const ACTUAL_COLOR: &str = "#1f77b4";
const BALANCE_SHEET_COLOR: &str = "#1f77b4";
const CAGR_COLOR: &str = "#2ca02c";

/// Hover line of a long-format series: `variable=name<br>x=..<br>value=..`.
fn series_hover(variable: &str, x_label: &str, value_label: &str, format: NumberFormat) -> String {
    format!(
        "{variable}=%{{fullData.name}}<br>{x_label}=%{{x}}<br>{value_label}=%{{y:{}}}<extra></extra>",
        format.d3()
    )
}

/// Hover line of a single bar: `x=..<br>value=..`.
fn bar_hover(x_label: &str, value_label: &str, format: NumberFormat) -> String {
    format!(
        "{x_label}=%{{x}}<br>{value_label}=%{{y:{}}}<extra></extra>",
        format.d3()
    )
}

/// Builds the dashboard charts. Every builder takes tables by reference and
/// returns a fresh figure.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Revenue per business unit over time, stacked.
    pub fn business_unit_revenue(revenue: &DataFrame) -> Result<Figure, ProcessorError> {
        Self::stacked_area(
            revenue,
            "Business Unit Revenue",
            &columns::BUSINESS_UNITS,
            &BUSINESS_UNIT_COLORS,
            "Revenue ($)",
            "Business Unit",
        )
    }

    /// Profit amount as bars with the margin percentage on a right-hand axis.
    pub fn profit_margin(profit: &DataFrame) -> Result<Figure, ProcessorError> {
        DataProcessor::ensure_not_empty("profit", profit)?;
        let years = DataProcessor::label_column(profit, columns::YEAR)?;
        let amount = DataProcessor::numeric_column(profit, columns::PROFIT_AMOUNT)?;
        let margin = DataProcessor::numeric_column(profit, columns::PROFIT_PCT)?;

        let layout = Layout::new(
            "Profit Margin",
            Axis::category(None),
            Axis::value("Profit ($)").with_format(NumberFormat::Currency),
        )
        .with_secondary_axis(Axis::secondary("Profit (%)"))
        .unified_hover();

        Ok(Figure::new(layout)
            .add_trace(
                Trace::bar("Profit ($)", years.clone(), amount)
                    .with_color(PROFIT_BAR_COLOR)
                    .with_hovertemplate("Year: %{x}<br>Profit: $%{y:,.0f}"),
            )
            .add_trace(
                Trace::line("Profit (%)", years, margin, Mode::LinesMarkers)
                    .with_color(PROFIT_LINE_COLOR)
                    .with_line_width(3.0)
                    .on_secondary_axis()
                    .with_hovertemplate("Year: %{x}<br>Profit %: %{y}%"),
            ))
    }

    /// Latest-period revenue per business and consolidated, one coloured bar each.
    pub fn cumulative_revenue(revenue: &DataFrame) -> Result<Figure, ProcessorError> {
        let snapshot = DataProcessor::cumulative_revenue(revenue)?;
        let names = DataProcessor::label_column(&snapshot, "Business")?;
        let values = DataProcessor::numeric_column(&snapshot, "Revenue")?;

        let layout = Layout::new(
            "Cumulative Revenue (Year 0)",
            Axis::category(Some("Business")),
            Axis::value("Revenue ($)"),
        )
        .relative_bars()
        .hide_legend();

        let hover = bar_hover("Business", "Revenue ($)", NumberFormat::Thousands);
        Ok(names
            .into_iter()
            .zip(values)
            .zip(CUMULATIVE_REVENUE_COLORS.iter().cycle())
            .fold(Figure::new(layout), |fig, ((name, value), color)| {
                fig.add_trace(
                    Trace::bar(&name, vec![name.clone()], vec![value])
                        .with_color(color)
                        .with_hovertemplate(hover.clone())
                        .hide_legend(),
                )
            }))
    }

    /// Expense lines over time, stacked.
    pub fn expenses_trend(expenses: &DataFrame) -> Result<Figure, ProcessorError> {
        Self::stacked_area(
            expenses,
            "Expenses Trend",
            &columns::EXPENSE_LINES,
            &EXPENSE_COLORS,
            "Expense ($)",
            "Expense Type",
        )
    }

    /// Budgeted against latest actual values, grouped per category.
    pub fn budget_vs_actual(tables: &FinancialTables) -> Result<Figure, ProcessorError> {
        let cmp = DataProcessor::budget_vs_actual(tables)?;
        let labels = DataProcessor::label_column(&cmp, "Category")?;
        let budget = DataProcessor::numeric_column(&cmp, "Budget")?;
        let actual = DataProcessor::numeric_column(&cmp, "Actual")?;

        let layout = Layout::new(
            "Budget vs Actual (Year 0)",
            Axis::category(None),
            Axis::value("Amount ($)").with_format(NumberFormat::Currency),
        )
        .grouped_bars()
        .unified_hover();

        Ok(Figure::new(layout)
            .add_trace(Trace::bar("Budget", labels.clone(), budget).with_color(BUDGET_COLOR))
            .add_trace(Trace::bar("Actual", labels, actual).with_color(ACTUAL_COLOR)))
    }

    pub fn balance_sheet_summary(balance_sheet: &DataFrame) -> Result<Figure, ProcessorError> {
        let summary = DataProcessor::balance_sheet_summary(balance_sheet)?;
        let labels = DataProcessor::label_column(&summary, "Asset Type")?;
        let values = DataProcessor::numeric_column(&summary, "Value")?;

        let layout = Layout::new(
            "Balance Sheet Summary (Year 0)",
            Axis::category(Some("Asset Type")),
            Axis::value("Amount ($)"),
        );

        Ok(Figure::new(layout).add_trace(
            Trace::bar("Value", labels, values)
                .with_color(BALANCE_SHEET_COLOR)
                .with_hovertemplate(bar_hover("Asset Type", "Amount ($)", NumberFormat::Thousands)),
        ))
    }

    /// Four-period compound growth per business unit.
    pub fn cagr(revenue: &DataFrame) -> Result<Figure, ProcessorError> {
        let table = DataProcessor::cagr_table(revenue)?;
        let units = DataProcessor::label_column(&table, "Business Unit")?;
        let rates = DataProcessor::numeric_column(&table, "CAGR (%)")?;

        let layout = Layout::new(
            "5-Year CAGR by Business Unit",
            Axis::category(Some("Business Unit")),
            Axis::value("CAGR (%)"),
        );

        Ok(Figure::new(layout).add_trace(
            Trace::bar("CAGR (%)", units, rates)
                .with_color(CAGR_COLOR)
                .with_hovertemplate(bar_hover(
                    "Business Unit",
                    "CAGR (%)",
                    NumberFormat::TwoDecimals,
                )),
        ))
    }

    /// COGS, salaries and rent as a percentage of consolidated revenue.
    pub fn cost_structure(tables: &FinancialTables) -> Result<Figure, ProcessorError> {
        let pct =
            DataProcessor::cost_structure_pct(&tables.revenue, &tables.cogs, &tables.expenses)?;
        let years = DataProcessor::label_column(&pct, "Year")?;

        let layout = Layout::new(
            "Cost Structure as % of Revenue",
            Axis::category(Some("Year")),
            Axis::value("% of Revenue"),
        )
        .with_legend_title("Cost Type")
        .unified_hover();

        let hover = series_hover("Cost Type", "Year", "% of Revenue", NumberFormat::OneDecimal);
        ["COGS %", "Salaries %", "Rent %"]
            .iter()
            .zip(PALETTE)
            .try_fold(Figure::new(layout), |fig, (name, color)| {
                let values = DataProcessor::numeric_column(&pct, name)?;
                Ok(fig.add_trace(
                    Trace::line(name, years.clone(), values, Mode::LinesMarkers)
                        .with_color(color)
                        .with_hovertemplate(hover.clone()),
                ))
            })
    }

    fn stacked_area(
        df: &DataFrame,
        title: &str,
        series: &[&str],
        colors: &[&str],
        value_label: &str,
        variable_label: &str,
    ) -> Result<Figure, ProcessorError> {
        DataProcessor::ensure_not_empty(title, df)?;
        let years = DataProcessor::label_column(df, columns::YEAR)?;
        let layout = Layout::new(title, Axis::category(Some("Year")), Axis::value(value_label))
            .with_legend_title(variable_label)
            .unified_hover();

        let hover = series_hover(variable_label, "Year", value_label, NumberFormat::Thousands);
        series
            .iter()
            .zip(colors.iter().cycle())
            .try_fold(Figure::new(layout), |fig, (name, color)| {
                let values = DataProcessor::numeric_column(df, name)?;
                Ok(fig.add_trace(
                    Trace::stacked_area(name, "one", years.clone(), values)
                        .with_color(color)
                        .with_hovertemplate(hover.clone()),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::figure::{AxisRef, TraceKind};
    use crate::data::fixtures;

    #[test]
    fn business_unit_revenue_stacks_three_units() {
        let tables = fixtures::tables();
        let fig = ChartPlotter::business_unit_revenue(&tables.revenue).expect("figure");

        assert_eq!(fig.title(), "Business Unit Revenue");
        assert_eq!(fig.data.len(), 3);
        for (trace, color) in fig.data.iter().zip(BUSINESS_UNIT_COLORS) {
            assert!(trace.is_stacked());
            assert_eq!(trace.kind, TraceKind::Scatter);
            assert_eq!(trace.color(), Some(color));
            assert_eq!(trace.x.len(), 5);
        }
        assert_eq!(fig.data[0].y, vec![100.0, 120.0, 140.0, 170.0, 200.0]);
        assert_eq!(fig.layout.hovermode, Some("x unified"));
        assert!(fig.data[0]
            .hovertemplate
            .as_deref()
            .is_some_and(|h| h.contains("%{y:,.0f}")));
    }

    #[test]
    fn profit_margin_puts_percentage_on_secondary_axis() {
        let tables = fixtures::tables();
        let fig = ChartPlotter::profit_margin(&tables.profit).expect("figure");

        assert_eq!(fig.data.len(), 2);
        assert_eq!(fig.data[0].kind, TraceKind::Bar);
        assert_eq!(fig.data[0].yaxis, AxisRef::Primary);
        assert_eq!(fig.data[1].yaxis, AxisRef::Secondary);
        assert_eq!(fig.data[1].mode, Some(Mode::LinesMarkers));
        assert!(fig.has_secondary_axis());
        assert_eq!(fig.layout.yaxis.tickformat, Some("$,.0f"));
        assert_eq!(
            fig.layout.yaxis2.as_ref().map(|a| a.title_text()),
            Some("Profit (%)")
        );
    }

    #[test]
    fn cumulative_revenue_has_one_bar_per_business_without_legend() {
        let tables = fixtures::tables();
        let fig = ChartPlotter::cumulative_revenue(&tables.revenue).expect("figure");

        let names: Vec<&str> = fig.data.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Business 1", "Business 2", "Business 3", "Consolidated"]);
        let colors: Vec<Option<&str>> = fig.data.iter().map(|t| t.color()).collect();
        assert_eq!(
            colors,
            CUMULATIVE_REVENUE_COLORS.iter().map(|c| Some(*c)).collect::<Vec<_>>()
        );
        assert_eq!(fig.data[3].y, vec![400.0]);
        assert!(!fig.layout.legend_visible());
        assert_eq!(fig.layout.barmode, Some("relative"));
        let layout = serde_json::to_value(&fig.layout).expect("layout json");
        assert_eq!(layout["barmode"], "relative");
    }

    #[test]
    fn budget_vs_actual_groups_two_bar_series() {
        let tables = fixtures::tables();
        let fig = ChartPlotter::budget_vs_actual(&tables).expect("figure");

        assert_eq!(fig.layout.barmode, Some("group"));
        assert_eq!(fig.data[0].name, "Budget");
        assert_eq!(fig.data[1].name, "Actual");
        assert_eq!(fig.data[0].x, ["Revenue", "COGS", "Expenses", "Profit"]);
        assert_eq!(fig.data[1].y, vec![400.0, 160.0, 120.0, 120.0]);
    }

    #[test]
    fn expenses_cagr_balance_sheet_and_cost_structure() {
        let tables = fixtures::tables();

        let expenses = ChartPlotter::expenses_trend(&tables.expenses).expect("expenses");
        assert_eq!(expenses.data.len(), 4);
        assert_eq!(expenses.data[2].name, "D&A");

        let cagr = ChartPlotter::cagr(&tables.revenue).expect("cagr");
        assert_eq!(cagr.data.len(), 1);
        assert!((cagr.data[0].y[0] - (2f64.powf(0.25) - 1.0) * 100.0).abs() < 1e-9);

        let bs = ChartPlotter::balance_sheet_summary(&tables.balance_sheet).expect("bs");
        assert_eq!(bs.data[0].x, ["Current Assets", "Non-current Assets"]);

        let cost = ChartPlotter::cost_structure(&tables).expect("cost");
        assert_eq!(cost.data.len(), 3);
        assert!(cost.data.iter().all(|t| t.mode == Some(Mode::LinesMarkers)));
        assert_eq!(cost.data[0].y[0], 50.0);
    }

    #[test]
    fn builders_leave_tables_untouched() {
        let tables = fixtures::tables();
        let before = tables.clone();

        ChartPlotter::business_unit_revenue(&tables.revenue).expect("revenue");
        ChartPlotter::cumulative_revenue(&tables.revenue).expect("cumulative");
        ChartPlotter::budget_vs_actual(&tables).expect("budget");
        ChartPlotter::cost_structure(&tables).expect("cost");

        assert!(tables.revenue.equals(&before.revenue));
        assert!(tables.cogs.equals(&before.cogs));
        assert!(tables.budget.equals(&before.budget));
        assert!(tables.expenses.equals(&before.expenses));
    }

    #[test]
    fn missing_column_fails_the_chart() {
        let tables = fixtures::tables();
        let profit = tables.profit.drop("Profit %").expect("drop");
        assert!(ChartPlotter::profit_margin(&profit).is_err());
    }

    #[test]
    fn empty_tables_fail_every_time_series_chart() {
        let tables = fixtures::tables();
        let empty = |df: &DataFrame| df.head(Some(0));

        assert!(matches!(
            ChartPlotter::profit_margin(&empty(&tables.profit)),
            Err(ProcessorError::EmptyTable(_))
        ));
        assert!(matches!(
            ChartPlotter::business_unit_revenue(&empty(&tables.revenue)),
            Err(ProcessorError::EmptyTable(_))
        ));
        assert!(matches!(
            ChartPlotter::expenses_trend(&empty(&tables.expenses)),
            Err(ProcessorError::EmptyTable(_))
        ));

        let mut no_rows = tables.clone();
        no_rows.revenue = empty(&tables.revenue);
        no_rows.cogs = empty(&tables.cogs);
        no_rows.expenses = empty(&tables.expenses);
        assert!(matches!(
            ChartPlotter::cost_structure(&no_rows),
            Err(ProcessorError::EmptyTable(_))
        ));
    }
}
