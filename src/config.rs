// Analysis configuration.
//
// Every constant the engine needs (fuel energy contents, emission
// coefficients, unit multipliers, column names, epsilon) lives here and is
// passed explicitly to the normalizer and decomposer.
use crate::error::{LmdiError, Result};
use crate::types::{FuelKind, FuelMap};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Per-fuel conversion constants and the source column holding consumption.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelSpec {
    /// GJ per native unit (tonne, m3, kWh, Gcal).
    pub energy_content: f64,
    /// kg CO2 per GJ.
    pub emission_coeff: f64,
    /// Scale of the reported figure: 1e3 for "thousand ...", 1e6 for "mln ...".
    pub unit_multiplier: f64,
    pub column: String,
}

impl FuelSpec {
    fn new(energy_content: f64, emission_coeff: f64, unit_multiplier: f64, column: &str) -> Self {
        FuelSpec {
            energy_content,
            emission_coeff,
            unit_multiplier,
            column: column.to_string(),
        }
    }
}

/// Names of the non-fuel columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnMapping {
    /// Accepted headers for the year, tried in order.
    pub year: Vec<String>,
    pub output: String,
    pub value_added: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        ColumnMapping {
            year: vec!["Year".to_string(), "year".to_string()],
            output: "Production Output (thousand tonne)".to_string(),
            value_added: "GVA_manufacturing USD".to_string(),
        }
    }
}

pub fn default_fuels() -> FuelMap<FuelSpec> {
    FuelMap::from_fn(|fuel| match fuel {
        // Lignite
        FuelKind::Coal => FuelSpec::new(
            11.9,
            101.0,
            1e3,
            "Coal_manufacturing_consumption (thousand tonnes)",
        ),
        FuelKind::Gas => FuelSpec::new(0.0373, 56.1, 1e6, "Gas_manufacturing_consumption (mln m3)"),
        FuelKind::ResidualOil => FuelSpec::new(
            41.0,
            77.4,
            1e3,
            "Residual_Oil_manufacturing_consumption (thousand tonnes)",
        ),
        FuelKind::Diesel => FuelSpec::new(
            43.0,
            74.1,
            1e3,
            "Diesel_manufacturing_consumption (thousand tonnes)",
        ),
        FuelKind::Gasoline => FuelSpec::new(
            44.0,
            69.3,
            1e3,
            "Gasoline_manufacturing_consumption (thousand tonnes)",
        ),
        // Hydropower operational emissions only.
        FuelKind::Electricity => FuelSpec::new(
            0.0036,
            24.0,
            1e6,
            "Electricity_manufacturing_Consumption (mln kWh)",
        ),
        // Secondary energy: its CO2 is already counted in the primary fuels.
        FuelKind::Heat => FuelSpec::new(
            4.184,
            0.0,
            1e3,
            "Heat_manufacturing_consumption (thousand gigacalories)",
        ),
    })
}

/// Inputs of one analysis request. Read-only once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub start_year: i32,
    pub end_year: i32,
    /// Floor for logs and divisions, and the equality tolerance.
    pub epsilon: f64,
    /// Periods whose |residual| exceeds this are logged; results are unchanged.
    pub residual_tolerance: f64,
    pub columns: ColumnMapping,
    pub fuels: FuelMap<FuelSpec>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            start_year: 2012,
            end_year: 2023,
            epsilon: DEFAULT_EPSILON,
            residual_tolerance: 1e-6,
            columns: ColumnMapping::default(),
            fuels: default_fuels(),
        }
    }
}

impl AnalysisConfig {
    /// Load a config from a JSON file. Omitted fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: AnalysisConfig = serde_json::from_str(&text)?;
        Ok(cfg)
    }

    pub fn with_years(mut self, start_year: i32, end_year: i32) -> Self {
        self.start_year = start_year;
        self.end_year = end_year;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Check the year range and numeric settings before any data is touched.
    pub fn validate(&self) -> Result<()> {
        let (start, end) = (self.start_year, self.end_year);
        if start >= end {
            return Err(LmdiError::InvalidRange {
                start,
                end,
                reason: "start year must be less than end year",
            });
        }
        if start < MIN_YEAR || end > MAX_YEAR {
            return Err(LmdiError::InvalidRange {
                start,
                end,
                reason: "years must be between 1900 and 2100",
            });
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(LmdiError::InvalidConfig(format!(
                "epsilon must be a positive finite number, got {}",
                self.epsilon
            )));
        }
        if !(self.residual_tolerance.is_finite() && self.residual_tolerance >= 0.0) {
            return Err(LmdiError::InvalidConfig(format!(
                "residual tolerance must be non-negative, got {}",
                self.residual_tolerance
            )));
        }
        if self.columns.year.is_empty() {
            return Err(LmdiError::InvalidConfig("no year column configured".to_string()));
        }
        for (fuel, spec) in self.fuels.iter() {
            let finite = [spec.energy_content, spec.emission_coeff, spec.unit_multiplier]
                .iter()
                .all(|v| v.is_finite() && *v >= 0.0);
            if !finite {
                return Err(LmdiError::InvalidConfig(format!(
                    "constants for {} must be finite and non-negative",
                    fuel.key()
                )));
            }
            if spec.column.trim().is_empty() {
                return Err(LmdiError::InvalidConfig(format!(
                    "no column mapped for {}",
                    fuel.key()
                )));
            }
        }
        Ok(())
    }

    /// All columns that must exist in the input header.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = self.fuels.values().map(|s| s.column.as_str()).collect();
        cols.push(self.columns.output.as_str());
        cols.push(self.columns.value_added.as_str());
        cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AnalysisConfig::default().validate().unwrap();
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = AnalysisConfig::default().with_years(2020, 2015).validate().unwrap_err();
        assert!(matches!(err, LmdiError::InvalidRange { start: 2020, end: 2015, .. }));
    }

    #[test]
    fn equal_years_are_rejected() {
        let err = AnalysisConfig::default().with_years(2015, 2015).validate().unwrap_err();
        assert!(matches!(err, LmdiError::InvalidRange { .. }));
    }

    #[test]
    fn out_of_bounds_years_are_rejected() {
        for (s, e) in [(1850, 2000), (2000, 2150)] {
            let err = AnalysisConfig::default().with_years(s, e).validate().unwrap_err();
            assert!(matches!(err, LmdiError::InvalidRange { .. }), "{s}-{e}");
        }
    }

    #[test]
    fn non_positive_epsilon_is_rejected() {
        for eps in [0.0, -1e-9, f64::NAN] {
            let err = AnalysisConfig::default().with_epsilon(eps).validate().unwrap_err();
            assert!(matches!(err, LmdiError::InvalidConfig(_)));
        }
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{"startYear": 2014, "endYear": 2018}"#).unwrap();
        assert_eq!(cfg.start_year, 2014);
        assert_eq!(cfg.epsilon, DEFAULT_EPSILON);
        assert_eq!(cfg.fuels[FuelKind::Heat].emission_coeff, 0.0);
        assert_eq!(cfg.columns.output, "Production Output (thousand tonne)");
    }

    #[test]
    fn config_roundtrips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let mut cfg = AnalysisConfig::default().with_years(2013, 2016);
        cfg.fuels[FuelKind::Coal].energy_content = 25.8;
        std::fs::write(&path, serde_json::to_string_pretty(&cfg).unwrap()).unwrap();

        let loaded = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn required_columns_cover_fuels_and_economics() {
        let cfg = AnalysisConfig::default();
        let cols = cfg.required_columns();
        assert_eq!(cols.len(), FuelKind::COUNT + 2);
        assert!(cols.contains(&"GVA_manufacturing USD"));
        assert!(cols.contains(&"Heat_manufacturing_consumption (thousand gigacalories)"));
    }
}
