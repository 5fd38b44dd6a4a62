//! Dashboard layout: eight charts in four rows of two, rendered to one HTML page.

use crate::charts::{ChartPlotter, Figure};
use crate::data::{FinancialTables, ProcessorError};
use std::fmt::Write as _;
use tracing::{debug, info};

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const PANELS_PER_ROW: usize = 2;

/// The dashboard charts, in page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    BusinessUnitRevenue,
    ProfitMargin,
    CumulativeRevenue,
    ExpensesTrend,
    BudgetVsActual,
    BalanceSheetSummary,
    Cagr,
    CostStructure,
}

impl ChartKind {
    pub const ALL: [ChartKind; 8] = [
        ChartKind::BusinessUnitRevenue,
        ChartKind::ProfitMargin,
        ChartKind::CumulativeRevenue,
        ChartKind::ExpensesTrend,
        ChartKind::BudgetVsActual,
        ChartKind::BalanceSheetSummary,
        ChartKind::Cagr,
        ChartKind::CostStructure,
    ];

    /// Stable identifier used for element ids and exported file names.
    pub fn slug(self) -> &'static str {
        match self {
            ChartKind::BusinessUnitRevenue => "business_unit_revenue",
            ChartKind::ProfitMargin => "profit_margin",
            ChartKind::CumulativeRevenue => "cumulative_revenue",
            ChartKind::ExpensesTrend => "expenses_trend",
            ChartKind::BudgetVsActual => "budget_vs_actual",
            ChartKind::BalanceSheetSummary => "balance_sheet_summary",
            ChartKind::Cagr => "cagr",
            ChartKind::CostStructure => "cost_structure",
        }
    }

    pub fn build(self, tables: &FinancialTables) -> Result<Figure, ProcessorError> {
        match self {
            ChartKind::BusinessUnitRevenue => ChartPlotter::business_unit_revenue(&tables.revenue),
            ChartKind::ProfitMargin => ChartPlotter::profit_margin(&tables.profit),
            ChartKind::CumulativeRevenue => ChartPlotter::cumulative_revenue(&tables.revenue),
            ChartKind::ExpensesTrend => ChartPlotter::expenses_trend(&tables.expenses),
            ChartKind::BudgetVsActual => ChartPlotter::budget_vs_actual(tables),
            ChartKind::BalanceSheetSummary => {
                ChartPlotter::balance_sheet_summary(&tables.balance_sheet)
            }
            ChartKind::Cagr => ChartPlotter::cagr(&tables.revenue),
            ChartKind::CostStructure => ChartPlotter::cost_structure(tables),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Panel {
    pub kind: ChartKind,
    pub figure: Figure,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub title: String,
    pub rows: Vec<Vec<Panel>>,
}

impl Dashboard {
    /// Build every chart. The first failing chart aborts the build.
    pub fn build(title: &str, tables: &FinancialTables) -> Result<Self, ProcessorError> {
        let panels = ChartKind::ALL
            .iter()
            .map(|&kind| {
                let figure = kind.build(tables)?;
                debug!(chart = kind.slug(), traces = figure.data.len(), "built chart");
                Ok(Panel { kind, figure })
            })
            .collect::<Result<Vec<Panel>, ProcessorError>>()?;
        info!(charts = panels.len(), "dashboard built");

        let rows = panels
            .chunks(PANELS_PER_ROW)
            .map(|row| row.to_vec())
            .collect();

        Ok(Self {
            title: title.to_string(),
            rows,
        })
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.rows.iter().flatten()
    }

    /// Full HTML document; charts are drawn client-side by Plotly.js.
    pub fn render_html(&self) -> serde_json::Result<String> {
        let mut body = String::new();
        let last_row = self.rows.len().saturating_sub(1);
        for (i, row) in self.rows.iter().enumerate() {
            let row_style = if i < last_row { " style=\"margin-bottom: 30px;\"" } else { "" };
            let _ = writeln!(body, "    <div class=\"row\"{row_style}>");
            for panel in row {
                let _ = writeln!(
                    body,
                    "      <div style=\"width: 50%; display: inline-block;\"><div id=\"{}\" class=\"graph\"></div></div>",
                    panel.kind.slug()
                );
            }
            body.push_str("    </div>\n");
        }

        let mut scripts = String::new();
        for panel in self.panels() {
            let _ = writeln!(
                scripts,
                "    Plotly.newPlot(\"{}\", {}, {}, {{\"responsive\": true}});",
                panel.kind.slug(),
                script_json(&panel.figure.data)?,
                script_json(&panel.figure.layout)?,
            );
        }

        let title = escape_html(&self.title);
        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <script src="{PLOTLY_JS}" charset="utf-8"></script>
  <style>
    body {{ margin: 0; font-family: "Open Sans", verdana, arial, sans-serif; }}
    .row {{ font-size: 0; }}
    .row > div {{ vertical-align: top; font-size: 1rem; }}
  </style>
</head>
<body>
  <div style="padding: 20px;">
    <h1 style="text-align: center; margin: 20px 0;">{title}</h1>
{body}  </div>
  <script>
{scripts}  </script>
</body>
</html>
"#
        ))
    }
}

/// JSON safe to embed inside a `<script>` element.
fn script_json<T: serde::Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    #[test]
    fn lays_out_four_rows_of_two_in_fixed_order() {
        let dashboard = Dashboard::build("Financial Dashboard", &fixtures::tables()).expect("build");

        assert_eq!(dashboard.rows.len(), 4);
        assert!(dashboard.rows.iter().all(|row| row.len() == 2));
        let order: Vec<ChartKind> = dashboard.panels().map(|p| p.kind).collect();
        assert_eq!(order, ChartKind::ALL);
        assert_eq!(dashboard.rows[3][0].figure.title(), "5-Year CAGR by Business Unit");
    }

    #[test]
    fn html_embeds_every_chart_once() {
        let dashboard = Dashboard::build("Financial Dashboard", &fixtures::tables()).expect("build");
        let html = dashboard.render_html().expect("render");

        assert!(html.contains("<h1 style=\"text-align: center; margin: 20px 0;\">Financial Dashboard</h1>"));
        for kind in ChartKind::ALL {
            let container = format!("<div id=\"{}\" class=\"graph\">", kind.slug());
            assert_eq!(html.matches(&container).count(), 1, "{}", kind.slug());
            assert!(html.contains(&format!("Plotly.newPlot(\"{}\"", kind.slug())));
        }
        assert_eq!(html.matches("margin-bottom: 30px").count(), 3);
        assert_eq!(html.matches("width: 50%; display: inline-block;").count(), 8);
    }

    #[test]
    fn embedded_json_cannot_close_the_script() {
        let dashboard = Dashboard::build("Financial Dashboard", &fixtures::tables()).expect("build");
        let html = dashboard.render_html().expect("render");
        let script = html.split("<script>").nth(1).expect("inline script");
        let script = script.split("</script>").next().expect("script body");

        assert!(!script.contains('<'));
        assert!(script.contains("\\u003cbr>"));
    }

    #[test]
    fn title_is_escaped() {
        let dashboard = Dashboard::build("P&L <draft>", &fixtures::tables()).expect("build");
        let html = dashboard.render_html().expect("render");
        assert!(html.contains("<title>P&amp;L &lt;draft&gt;</title>"));
    }

    #[test]
    fn missing_table_column_aborts_the_build() {
        let mut tables = fixtures::tables();
        tables.expenses = tables.expenses.drop("Total").expect("drop");
        assert!(Dashboard::build("x", &tables).is_err());
    }
}
