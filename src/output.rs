use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::reports::period_row;
use crate::types::{DecompositionReport, Effects};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// JSON export: the report plus the settings that produced it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub config: &'a AnalysisConfig,
    pub report: &'a DecompositionReport,
    pub sequential_total: Effects,
    pub max_abs_residual: f64,
}

impl<'a> ReportDocument<'a> {
    pub fn new(report: &'a DecompositionReport, config: &'a AnalysisConfig) -> Self {
        ReportDocument {
            generated_at: Utc::now(),
            config,
            report,
            sequential_total: report.sequential_total(),
            max_abs_residual: report.max_abs_residual(),
        }
    }
}

/// Write all export files into `dir` and return their paths.
pub fn export_report(
    dir: impl AsRef<Path>,
    report: &DecompositionReport,
    config: &AnalysisConfig,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let range = format!("{}-{}", report.start_year, report.end_year);
    let yearly = dir.join("lmdi_yearly_results.csv");
    let overall = dir.join(format!("lmdi_overall_{}_results.csv", range));
    let mix = dir.join("fuel_mix_comparison.csv");
    let emissions = dir.join("emissions_by_fuel.csv");
    let json = dir.join("lmdi_report.json");

    let sequential: Vec<_> = report.sequential.iter().map(period_row).collect();
    write_csv(&yearly, &sequential)?;
    write_csv(&overall, &[period_row(&report.overall)])?;
    write_csv(&mix, &report.fuel_mix_rows())?;
    write_csv(&emissions, &report.emissions_rows())?;
    write_json(&json, &ReportDocument::new(report, config))?;

    let paths = vec![yearly, overall, mix, emissions, json];
    info!(files = paths.len(), dir = %dir.display(), "report exported");
    Ok(paths)
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_table(rows, max_rows));
}
