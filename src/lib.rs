//! LMDI-I decomposition of manufacturing CO2 emissions.
//!
//! Splits the change in emissions between years into production, economic
//! structure, energy intensity, fuel mix and emission factor effects, both
//! year over year and directly between the first and last year.
//!
//! ```no_run
//! use lmdi_report::{aggregate::analyze, config::AnalysisConfig, loader::load_rows};
//!
//! let (rows, _) = load_rows("manufacturing_data.csv")?;
//! let cfg = AnalysisConfig::default().with_years(2012, 2023);
//! let report = analyze(&rows, &cfg)?;
//! println!("{:.2} tCO2", report.summary().total_change);
//! # Ok::<(), lmdi_report::error::LmdiError>(())
//! ```
pub mod aggregate;
pub mod config;
pub mod decompose;
pub mod error;
pub mod loader;
pub mod log_mean;
pub mod normalize;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use aggregate::{analyze, decompose_series, prepare_records, SeriesDecomposition};
pub use config::AnalysisConfig;
pub use decompose::decompose_period;
pub use error::{LmdiError, Result};
pub use log_mean::log_mean;
pub use types::{DecompositionReport, Effects, FuelKind, FuelMap, PeriodDecomposition, YearRecord};
