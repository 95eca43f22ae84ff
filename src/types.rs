use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Index, IndexMut};
use tabled::Tabled;

/// One CSV row as delivered by the tabular reader: header -> raw cell text.
pub type RawRow = HashMap<String, String>;

/// Fuels tracked by the decomposition. The set is closed; per-fuel data is
/// always held in a [`FuelMap`] so every fuel has an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FuelKind {
    Coal,
    Gas,
    #[serde(rename = "Residual_Oil")]
    ResidualOil,
    Diesel,
    Gasoline,
    Electricity,
    Heat,
}

impl FuelKind {
    pub const COUNT: usize = 7;

    pub const ALL: [FuelKind; FuelKind::COUNT] = [
        FuelKind::Coal,
        FuelKind::Gas,
        FuelKind::ResidualOil,
        FuelKind::Diesel,
        FuelKind::Gasoline,
        FuelKind::Electricity,
        FuelKind::Heat,
    ];

    /// Stable key used in config files and JSON output.
    pub fn key(self) -> &'static str {
        match self {
            FuelKind::Coal => "Coal",
            FuelKind::Gas => "Gas",
            FuelKind::ResidualOil => "Residual_Oil",
            FuelKind::Diesel => "Diesel",
            FuelKind::Gasoline => "Gasoline",
            FuelKind::Electricity => "Electricity",
            FuelKind::Heat => "Heat",
        }
    }

    /// Human-readable label for tables.
    pub fn display_name(self) -> &'static str {
        match self {
            FuelKind::ResidualOil => "Residual Oil",
            other => other.key(),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FuelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Dense map with exactly one value per [`FuelKind`].
///
/// Serializes as a JSON object keyed by [`FuelKind::key`]. Deserializing
/// requires every fuel to be present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelMap<T>([T; FuelKind::COUNT]);

impl<T> FuelMap<T> {
    pub fn from_fn(mut f: impl FnMut(FuelKind) -> T) -> Self {
        FuelMap(std::array::from_fn(|i| f(FuelKind::ALL[i])))
    }

    pub fn iter(&self) -> impl Iterator<Item = (FuelKind, &T)> + '_ {
        FuelKind::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.0.iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(FuelKind, &T) -> U) -> FuelMap<U> {
        FuelMap::from_fn(|fuel| f(fuel, &self[fuel]))
    }
}

impl<T: Default> Default for FuelMap<T> {
    fn default() -> Self {
        FuelMap::from_fn(|_| T::default())
    }
}

impl<T> Index<FuelKind> for FuelMap<T> {
    type Output = T;

    fn index(&self, fuel: FuelKind) -> &T {
        &self.0[fuel.index()]
    }
}

impl<T> IndexMut<FuelKind> for FuelMap<T> {
    fn index_mut(&mut self, fuel: FuelKind) -> &mut T {
        &mut self.0[fuel.index()]
    }
}

impl<T: Serialize> Serialize for FuelMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FuelKind::COUNT))?;
        for (fuel, value) in self.iter() {
            map.serialize_entry(fuel.key(), value)?;
        }
        map.end()
    }
}

impl<'de, T> Deserialize<'de> for FuelMap<T>
where
    T: Deserialize<'de> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut entries = BTreeMap::<FuelKind, T>::deserialize(deserializer)?;
        if let Some(missing) = FuelKind::ALL.iter().find(|f| !entries.contains_key(f)) {
            return Err(de::Error::custom(format!(
                "fuel map is missing an entry for {}",
                missing.key()
            )));
        }
        Ok(FuelMap::from_fn(|fuel| entries.remove(&fuel).unwrap_or_default()))
    }
}

/// Canonical per-year input to the decomposition.
///
/// Built once by the normalizer; totals are derived from the per-fuel values
/// at construction and the record is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    year: i32,
    output: f64,
    value_added: f64,
    energy_gj: FuelMap<f64>,
    emissions_t: FuelMap<f64>,
    total_energy_gj: f64,
    total_emissions_t: f64,
}

impl YearRecord {
    pub fn new(
        year: i32,
        output: f64,
        value_added: f64,
        energy_gj: FuelMap<f64>,
        emissions_t: FuelMap<f64>,
    ) -> Self {
        let total_energy_gj = energy_gj.values().sum();
        let total_emissions_t = emissions_t.values().sum();
        YearRecord {
            year,
            output,
            value_added,
            energy_gj,
            emissions_t,
            total_energy_gj,
            total_emissions_t,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn value_added(&self) -> f64 {
        self.value_added
    }

    pub fn energy_gj(&self, fuel: FuelKind) -> f64 {
        self.energy_gj[fuel]
    }

    pub fn emissions_t(&self, fuel: FuelKind) -> f64 {
        self.emissions_t[fuel]
    }

    pub fn total_energy_gj(&self) -> f64 {
        self.total_energy_gj
    }

    pub fn total_emissions_t(&self) -> f64 {
        self.total_emissions_t
    }
}

/// The five LMDI-I factor contributions, in tCO2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Effects {
    #[serde(rename = "productionEffect")]
    pub production: f64,
    #[serde(rename = "structureEffect")]
    pub structure: f64,
    #[serde(rename = "intensityEffect")]
    pub intensity: f64,
    #[serde(rename = "mixEffect")]
    pub mix: f64,
    #[serde(rename = "emissionFactorEffect")]
    pub emission_factor: f64,
}

impl Effects {
    pub fn sum(&self) -> f64 {
        self.production + self.structure + self.intensity + self.mix + self.emission_factor
    }
}

impl Add for Effects {
    type Output = Effects;

    fn add(mut self, rhs: Effects) -> Effects {
        self += rhs;
        self
    }
}

impl AddAssign for Effects {
    fn add_assign(&mut self, rhs: Effects) {
        self.production += rhs.production;
        self.structure += rhs.structure;
        self.intensity += rhs.intensity;
        self.mix += rhs.mix;
        self.emission_factor += rhs.emission_factor;
    }
}

impl Sum for Effects {
    fn sum<I: Iterator<Item = Effects>>(iter: I) -> Effects {
        iter.fold(Effects::default(), Add::add)
    }
}

/// Decomposition of the emissions change between a base and a comparison year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDecomposition {
    pub period_label: String,
    pub base_year: i32,
    pub comparison_year: i32,
    pub total_change: f64,
    #[serde(flatten)]
    pub effects: Effects,
    pub sum_of_effects: f64,
    pub residual: f64,
}

impl PeriodDecomposition {
    /// True when `|residual| <= tolerance`.
    pub fn residual_within(&self, tolerance: f64) -> bool {
        self.residual.abs() <= tolerance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelMixSnapshot {
    pub fuel: FuelKind,
    pub start_energy_gj: f64,
    pub end_energy_gj: f64,
    /// Share of total energy at the start year, as a fraction in [0, 1].
    pub start_share: f64,
    pub end_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelEmissionsSnapshot {
    pub fuel: FuelKind,
    pub start_emissions_t: f64,
    pub end_emissions_t: f64,
    pub change: f64,
}

/// Everything one analysis produces, handed to rendering and export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecompositionReport {
    pub start_year: i32,
    pub end_year: i32,
    pub sequential: Vec<PeriodDecomposition>,
    pub overall: PeriodDecomposition,
    pub fuel_mix: Vec<FuelMixSnapshot>,
    pub emissions_by_fuel: Vec<FuelEmissionsSnapshot>,
    /// Years inside the requested range that had no record.
    pub missing_years: Vec<i32>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PeriodRow {
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: String,
    #[serde(rename = "TotalChange")]
    #[tabled(rename = "TotalChange")]
    pub total_change: String,
    #[serde(rename = "Production")]
    #[tabled(rename = "Production")]
    pub production: String,
    #[serde(rename = "Structure")]
    #[tabled(rename = "Structure")]
    pub structure: String,
    #[serde(rename = "Intensity")]
    #[tabled(rename = "Intensity")]
    pub intensity: String,
    #[serde(rename = "Mix")]
    #[tabled(rename = "Mix")]
    pub mix: String,
    #[serde(rename = "EmissionFactor")]
    #[tabled(rename = "EmissionFactor")]
    pub emission_factor: String,
    #[serde(rename = "SumOfEffects")]
    #[tabled(rename = "SumOfEffects")]
    pub sum_of_effects: String,
    #[serde(rename = "Residual")]
    #[tabled(rename = "Residual")]
    pub residual: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FuelMixRow {
    #[serde(rename = "Fuel")]
    #[tabled(rename = "Fuel")]
    pub fuel: String,
    #[serde(rename = "StartEnergyGJ")]
    #[tabled(rename = "StartEnergyGJ")]
    pub start_energy_gj: String,
    #[serde(rename = "EndEnergyGJ")]
    #[tabled(rename = "EndEnergyGJ")]
    pub end_energy_gj: String,
    #[serde(rename = "StartSharePct")]
    #[tabled(rename = "StartSharePct")]
    pub start_share_pct: String,
    #[serde(rename = "EndSharePct")]
    #[tabled(rename = "EndSharePct")]
    pub end_share_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct EmissionsByFuelRow {
    #[serde(rename = "Fuel")]
    #[tabled(rename = "Fuel")]
    pub fuel: String,
    #[serde(rename = "StartEmissions")]
    #[tabled(rename = "StartEmissions")]
    pub start_emissions: String,
    #[serde(rename = "EndEmissions")]
    #[tabled(rename = "EndEmissions")]
    pub end_emissions: String,
    #[serde(rename = "Change")]
    #[tabled(rename = "Change")]
    pub change: String,
}
