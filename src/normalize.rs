// Raw row -> YearRecord.
//
// Consumption cells are converted to GJ and tCO2 using the injected fuel
// table. Blank or non-numeric cells read as zero; only the year is mandatory
// per row. Column presence is checked once, up front, by
// `check_required_columns`.
use crate::config::AnalysisConfig;
use crate::error::{LmdiError, Result};
use crate::types::{FuelMap, RawRow, YearRecord};
use crate::util::{parse_f64_safe, parse_year};

/// Verify that the header (as seen through the first row) carries every
/// column the analysis reads. All missing names are reported together.
pub fn check_required_columns(row: &RawRow, cfg: &AnalysisConfig) -> Result<()> {
    let mut missing: Vec<&str> = cfg
        .required_columns()
        .into_iter()
        .filter(|col| !row.contains_key(*col))
        .collect();
    if !cfg.columns.year.iter().any(|c| row.contains_key(c)) {
        missing.insert(0, primary_year_column(cfg));
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LmdiError::MissingField(missing.join(", ")))
    }
}

/// Read the year from the first configured year column that is present.
pub fn row_year(row: &RawRow, cfg: &AnalysisConfig) -> Result<i32> {
    cfg.columns
        .year
        .iter()
        .find_map(|col| row.get(col))
        .and_then(|cell| parse_year(Some(cell.as_str())))
        .ok_or_else(|| LmdiError::MissingField(primary_year_column(cfg).to_string()))
}

fn primary_year_column(cfg: &AnalysisConfig) -> &str {
    cfg.columns.year.first().map(String::as_str).unwrap_or("Year")
}

fn numeric_cell(row: &RawRow, column: &str) -> f64 {
    parse_f64_safe(row.get(column).map(String::as_str)).unwrap_or(0.0)
}

/// Convert one raw row into a canonical [`YearRecord`].
///
/// `energy_gj = consumption * unit_multiplier * energy_content` and
/// `emissions_t = energy_gj * emission_coeff / 1000`.
pub fn normalize_row(row: &RawRow, cfg: &AnalysisConfig) -> Result<YearRecord> {
    let year = row_year(row, cfg)?;
    let energy: FuelMap<f64> = cfg.fuels.map(|_, spec| {
        numeric_cell(row, &spec.column) * spec.unit_multiplier * spec.energy_content
    });
    let emissions = energy.map(|fuel, gj| gj * cfg.fuels[fuel].emission_coeff / 1000.0);
    let output = numeric_cell(row, &cfg.columns.output);
    let value_added = numeric_cell(row, &cfg.columns.value_added);
    Ok(YearRecord::new(year, output, value_added, energy, emissions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FuelKind;

    fn full_row(year: &str) -> RawRow {
        let cfg = AnalysisConfig::default();
        let mut row = RawRow::new();
        row.insert("Year".into(), year.into());
        for (_, spec) in cfg.fuels.iter() {
            row.insert(spec.column.clone(), "0".into());
        }
        row.insert(cfg.columns.output.clone(), "1000".into());
        row.insert(cfg.columns.value_added.clone(), "50,000".into());
        row
    }

    #[test]
    fn converts_consumption_to_energy_and_emissions() {
        let cfg = AnalysisConfig::default();
        let mut row = full_row("2012");
        row.insert(cfg.fuels[FuelKind::Coal].column.clone(), "500".into());
        row.insert(cfg.fuels[FuelKind::Electricity].column.clone(), "5000".into());

        let rec = normalize_row(&row, &cfg).unwrap();
        // 500 thousand tonnes * 11.9 GJ/t
        assert!((rec.energy_gj(FuelKind::Coal) - 5_950_000.0).abs() < 1e-6);
        assert!((rec.emissions_t(FuelKind::Coal) - 600_950.0).abs() < 1e-6);
        // 5000 mln kWh * 0.0036 GJ/kWh
        assert!((rec.energy_gj(FuelKind::Electricity) - 18_000_000.0).abs() < 1e-6);
        assert!((rec.emissions_t(FuelKind::Electricity) - 432_000.0).abs() < 1e-6);
        assert!((rec.total_energy_gj() - 23_950_000.0).abs() < 1e-6);
        assert!((rec.total_emissions_t() - 1_032_950.0).abs() < 1e-6);
        assert_eq!(rec.output(), 1000.0);
        assert_eq!(rec.value_added(), 50_000.0);
    }

    #[test]
    fn heat_never_emits() {
        let cfg = AnalysisConfig::default();
        let mut row = full_row("2012");
        row.insert(cfg.fuels[FuelKind::Heat].column.clone(), "300".into());
        let rec = normalize_row(&row, &cfg).unwrap();
        assert!(rec.energy_gj(FuelKind::Heat) > 0.0);
        assert_eq!(rec.emissions_t(FuelKind::Heat), 0.0);
    }

    #[test]
    fn blank_and_text_cells_read_as_zero() {
        let cfg = AnalysisConfig::default();
        let mut row = full_row("2012");
        row.insert(cfg.fuels[FuelKind::Gas].column.clone(), "".into());
        row.insert(cfg.fuels[FuelKind::Diesel].column.clone(), "n/a".into());
        let rec = normalize_row(&row, &cfg).unwrap();
        assert_eq!(rec.energy_gj(FuelKind::Gas), 0.0);
        assert_eq!(rec.energy_gj(FuelKind::Diesel), 0.0);
    }

    #[test]
    fn unparsable_year_is_a_missing_field() {
        let cfg = AnalysisConfig::default();
        let err = normalize_row(&full_row("twenty"), &cfg).unwrap_err();
        assert!(matches!(err, LmdiError::MissingField(ref f) if f == "Year"));
    }

    #[test]
    fn lowercase_year_header_is_accepted() {
        let cfg = AnalysisConfig::default();
        let mut row = full_row("2012");
        row.remove("Year");
        row.insert("year".into(), "2014".into());
        assert_eq!(normalize_row(&row, &cfg).unwrap().year(), 2014);
        check_required_columns(&row, &cfg).unwrap();
    }

    #[test]
    fn missing_columns_are_listed() {
        let cfg = AnalysisConfig::default();
        let mut row = full_row("2012");
        row.remove(&cfg.fuels[FuelKind::Diesel].column);
        row.remove(&cfg.columns.value_added);
        let err = check_required_columns(&row, &cfg).unwrap_err();
        match err {
            LmdiError::MissingField(msg) => {
                assert!(msg.contains("Diesel_manufacturing_consumption"));
                assert!(msg.contains("GVA_manufacturing USD"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
