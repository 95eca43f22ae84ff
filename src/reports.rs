use crate::aggregate::SeriesDecomposition;
use crate::config::AnalysisConfig;
use crate::types::{
    DecompositionReport, Effects, EmissionsByFuelRow, FuelEmissionsSnapshot, FuelKind,
    FuelMixRow, FuelMixSnapshot, PeriodDecomposition, PeriodRow, YearRecord,
};
use crate::util::{format_number, format_residual};
use std::collections::HashSet;

/// Build the final report from sorted records and their decompositions.
///
/// `records` must be sorted by year and non-empty (as produced by
/// `prepare_records`); snapshots are taken at the first and last record.
pub fn assemble_report(
    records: &[YearRecord],
    series: SeriesDecomposition,
    cfg: &AnalysisConfig,
) -> DecompositionReport {
    let endpoints = records.first().zip(records.last());
    DecompositionReport {
        start_year: series.overall.base_year,
        end_year: series.overall.comparison_year,
        sequential: series.sequential,
        overall: series.overall,
        fuel_mix: endpoints
            .map(|(s, e)| fuel_mix_snapshot(s, e))
            .unwrap_or_default(),
        emissions_by_fuel: endpoints
            .map(|(s, e)| emissions_snapshot(s, e))
            .unwrap_or_default(),
        missing_years: missing_years(records, cfg.start_year, cfg.end_year),
    }
}

fn share(rec: &YearRecord, fuel: FuelKind) -> f64 {
    if rec.total_energy_gj() > 0.0 {
        rec.energy_gj(fuel) / rec.total_energy_gj()
    } else {
        0.0
    }
}

pub fn fuel_mix_snapshot(start: &YearRecord, end: &YearRecord) -> Vec<FuelMixSnapshot> {
    FuelKind::ALL
        .into_iter()
        .map(|fuel| FuelMixSnapshot {
            fuel,
            start_energy_gj: start.energy_gj(fuel),
            end_energy_gj: end.energy_gj(fuel),
            start_share: share(start, fuel),
            end_share: share(end, fuel),
        })
        .collect()
}

pub fn emissions_snapshot(start: &YearRecord, end: &YearRecord) -> Vec<FuelEmissionsSnapshot> {
    FuelKind::ALL
        .into_iter()
        .map(|fuel| FuelEmissionsSnapshot {
            fuel,
            start_emissions_t: start.emissions_t(fuel),
            end_emissions_t: end.emissions_t(fuel),
            change: end.emissions_t(fuel) - start.emissions_t(fuel),
        })
        .collect()
}

fn missing_years(records: &[YearRecord], from: i32, to: i32) -> Vec<i32> {
    let present: HashSet<i32> = records.iter().map(YearRecord::year).collect();
    (from..=to).filter(|y| !present.contains(y)).collect()
}

impl DecompositionReport {
    /// The overall (first vs last year) decomposition.
    pub fn summary(&self) -> &PeriodDecomposition {
        &self.overall
    }

    /// Effects of all sequential periods added together.
    ///
    /// Comparable with, but not equal to, `overall.effects`.
    pub fn sequential_total(&self) -> Effects {
        self.sequential.iter().map(|p| p.effects).sum()
    }

    pub fn max_abs_residual(&self) -> f64 {
        self.sequential
            .iter()
            .chain(std::iter::once(&self.overall))
            .map(|p| p.residual.abs())
            .fold(0.0, f64::max)
    }

    /// Sequential periods followed by the overall period, formatted for tables.
    pub fn period_rows(&self) -> Vec<PeriodRow> {
        self.sequential
            .iter()
            .chain(std::iter::once(&self.overall))
            .map(period_row)
            .collect()
    }

    pub fn fuel_mix_rows(&self) -> Vec<FuelMixRow> {
        self.fuel_mix
            .iter()
            .map(|m| FuelMixRow {
                fuel: m.fuel.display_name().to_string(),
                start_energy_gj: format_number(m.start_energy_gj, 0),
                end_energy_gj: format_number(m.end_energy_gj, 0),
                start_share_pct: format_number(m.start_share * 100.0, 2),
                end_share_pct: format_number(m.end_share * 100.0, 2),
            })
            .collect()
    }

    pub fn emissions_rows(&self) -> Vec<EmissionsByFuelRow> {
        let mut rows: Vec<&FuelEmissionsSnapshot> = self.emissions_by_fuel.iter().collect();
        // Largest increase first.
        rows.sort_by(|a, b| b.change.total_cmp(&a.change));
        rows.into_iter()
            .map(|e| EmissionsByFuelRow {
                fuel: e.fuel.display_name().to_string(),
                start_emissions: format_number(e.start_emissions_t, 2),
                end_emissions: format_number(e.end_emissions_t, 2),
                change: format_number(e.change, 2),
            })
            .collect()
    }
}

pub fn period_row(p: &PeriodDecomposition) -> PeriodRow {
    PeriodRow {
        period: p.period_label.clone(),
        total_change: format_number(p.total_change, 2),
        production: format_number(p.effects.production, 2),
        structure: format_number(p.effects.structure, 2),
        intensity: format_number(p.effects.intensity, 2),
        mix: format_number(p.effects.mix, 2),
        emission_factor: format_number(p.effects.emission_factor, 2),
        sum_of_effects: format_number(p.sum_of_effects, 2),
        residual: format_residual(p.residual),
    }
}
