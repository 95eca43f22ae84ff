// Multi-period orchestration.
//
// `analyze` is the single entry point from raw rows to a finished report.
// Every validation step runs before the first decomposition, so a failing
// request never yields partial results.
use crate::config::AnalysisConfig;
use crate::decompose::decompose_period;
use crate::error::{LmdiError, Result};
use crate::normalize::{check_required_columns, normalize_row, row_year};
use crate::reports::assemble_report;
use crate::types::{DecompositionReport, PeriodDecomposition, RawRow, YearRecord};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Sequential (adjacent-year) decompositions plus the direct first/last one.
///
/// The two are computed independently. LMDI-I is path dependent over more
/// than two points, so the chained sequential effects and the overall effects
/// generally differ; only their total changes agree.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesDecomposition {
    pub sequential: Vec<PeriodDecomposition>,
    pub overall: PeriodDecomposition,
}

fn ensure_unique_sorted(sorted: &[&YearRecord]) -> Result<()> {
    if let Some(pair) = sorted.windows(2).find(|w| w[0].year() == w[1].year()) {
        return Err(LmdiError::DuplicateYear(pair[0].year()));
    }
    Ok(())
}

/// Decompose a series of records. Records may arrive in any order; they are
/// paired after sorting by year. Repeated years are rejected.
pub fn decompose_series(records: &[YearRecord], epsilon: f64) -> Result<SeriesDecomposition> {
    let mut sorted: Vec<&YearRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.year());
    ensure_unique_sorted(&sorted)?;

    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) if sorted.len() >= 2 => (*first, *last),
        _ => return Err(LmdiError::InsufficientData { found: sorted.len() }),
    };

    let sequential: Vec<PeriodDecomposition> = sorted
        .par_windows(2)
        .map(|pair| decompose_period(pair[0], pair[1], epsilon))
        .collect();
    let overall = decompose_period(first, last, epsilon);

    Ok(SeriesDecomposition { sequential, overall })
}

/// Validate raw rows against `cfg` and turn the in-range ones into sorted
/// [`YearRecord`]s.
///
/// Errors, in the order checked: configuration, required columns (first row),
/// unreadable years, duplicate years in range, fewer than two years in range.
pub fn prepare_records(rows: &[RawRow], cfg: &AnalysisConfig) -> Result<Vec<YearRecord>> {
    cfg.validate()?;
    let first = rows
        .first()
        .ok_or(LmdiError::InsufficientData { found: 0 })?;
    check_required_columns(first, cfg)?;

    let mut in_range: Vec<(i32, &RawRow)> = Vec::with_capacity(rows.len());
    for row in rows {
        let year = row_year(row, cfg)?;
        if (cfg.start_year..=cfg.end_year).contains(&year) {
            in_range.push((year, row));
        }
    }
    in_range.sort_by_key(|(year, _)| *year);
    if let Some(pair) = in_range.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(LmdiError::DuplicateYear(pair[0].0));
    }
    if in_range.len() < 2 {
        return Err(LmdiError::InsufficientData { found: in_range.len() });
    }
    debug!(
        total_rows = rows.len(),
        in_range = in_range.len(),
        "rows filtered to {}-{}",
        cfg.start_year,
        cfg.end_year
    );

    in_range
        .into_iter()
        .map(|(_, row)| normalize_row(row, cfg))
        .collect()
}

/// Run a complete analysis: validate, normalize, decompose, assemble.
pub fn analyze(rows: &[RawRow], cfg: &AnalysisConfig) -> Result<DecompositionReport> {
    let records = prepare_records(rows, cfg)?;
    info!(
        years = records.len(),
        start = cfg.start_year,
        end = cfg.end_year,
        "running LMDI decomposition"
    );

    let series = decompose_series(&records, cfg.epsilon)?;
    for period in series.sequential.iter().chain(std::iter::once(&series.overall)) {
        debug!(
            period = %period.period_label,
            total_change = period.total_change,
            residual = period.residual,
            "period decomposed"
        );
        if !period.residual_within(cfg.residual_tolerance) {
            warn!(
                period = %period.period_label,
                residual = period.residual,
                tolerance = cfg.residual_tolerance,
                "decomposition residual exceeds tolerance"
            );
        }
    }

    let report = assemble_report(&records, series, cfg);
    if !report.missing_years.is_empty() {
        warn!(missing = ?report.missing_years, "years without data inside the requested range");
    }
    Ok(report)
}
