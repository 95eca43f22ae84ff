// Five-factor LMDI-I decomposition of one period.
//
// For each fuel f with emissions C_f = Y * (VA/Y) * (E/VA) * (E_f/E) * (C_f/E_f):
//
//   effect_k += L(C_f^b, C_f^c) * ln(x_k^c / x_k^b)
//
// where L is the logarithmic mean. Since the product telescopes exactly, the
// five effects sum to the change in total emissions whenever no factor hits
// the epsilon floor.
use crate::log_mean::log_mean;
use crate::types::{Effects, FuelKind, PeriodDecomposition, YearRecord};

/// `num / den`, or 0 when the denominator is zero.
fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// `ln(max(c, eps) / max(b, eps))`
fn log_ratio(base: f64, comparison: f64, epsilon: f64) -> f64 {
    (comparison.max(epsilon) / base.max(epsilon)).ln()
}

/// Economic-structure factor: value added per unit of physical output.
fn structure(rec: &YearRecord) -> f64 {
    safe_div(rec.value_added(), rec.output())
}

/// Energy-intensity factor: GJ per unit of value added.
fn intensity(rec: &YearRecord) -> f64 {
    safe_div(rec.total_energy_gj(), rec.value_added())
}

fn fuel_share(rec: &YearRecord, fuel: FuelKind, epsilon: f64) -> f64 {
    if rec.total_energy_gj() > epsilon {
        rec.energy_gj(fuel) / rec.total_energy_gj()
    } else {
        0.0
    }
}

/// Implied emission factor (tCO2 per GJ); 0 for a fuel with no energy use.
fn emission_factor(rec: &YearRecord, fuel: FuelKind, epsilon: f64) -> f64 {
    let energy = rec.energy_gj(fuel);
    if energy > epsilon {
        rec.emissions_t(fuel) / energy
    } else {
        0.0
    }
}

/// Decompose the change in total emissions from `base` to `comparison`.
///
/// Used unchanged for adjacent-year pairs and for the direct first/last pair.
pub fn decompose_period(
    base: &YearRecord,
    comparison: &YearRecord,
    epsilon: f64,
) -> PeriodDecomposition {
    let log_output = log_ratio(base.output(), comparison.output(), epsilon);
    let log_structure = log_ratio(structure(base), structure(comparison), epsilon);
    let log_intensity = log_ratio(intensity(base), intensity(comparison), epsilon);

    let mut effects = Effects::default();
    for fuel in FuelKind::ALL {
        let (c_b, c_c) = (base.emissions_t(fuel), comparison.emissions_t(fuel));
        let w = log_mean(c_b, c_c, epsilon);
        if w.abs() < epsilon && c_b.abs() < epsilon && c_c.abs() < epsilon {
            continue;
        }

        effects.production += w * log_output;
        effects.structure += w * log_structure;
        effects.intensity += w * log_intensity;

        let log_share = log_ratio(
            fuel_share(base, fuel, epsilon),
            fuel_share(comparison, fuel, epsilon),
            epsilon,
        );
        effects.mix += w * log_share;

        let ef_b = emission_factor(base, fuel, epsilon);
        let ef_c = emission_factor(comparison, fuel, epsilon);
        // Near-equal factors count as static so float noise stays out.
        let log_ef = if (ef_b - ef_c).abs() >= epsilon {
            log_ratio(ef_b, ef_c, epsilon)
        } else {
            0.0
        };
        effects.emission_factor += w * log_ef;
    }

    let total_change = comparison.total_emissions_t() - base.total_emissions_t();
    let sum_of_effects = effects.sum();
    PeriodDecomposition {
        period_label: format!("{}-{}", base.year(), comparison.year()),
        base_year: base.year(),
        comparison_year: comparison.year(),
        total_change,
        effects,
        sum_of_effects,
        residual: total_change - sum_of_effects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EPSILON as EPS;
    use crate::types::FuelMap;
    use proptest::prelude::*;

    fn single_fuel(year: i32, output: f64, value_added: f64, energy: f64, emissions: f64) -> YearRecord {
        let mut e = FuelMap::<f64>::default();
        let mut c = FuelMap::<f64>::default();
        e[FuelKind::Coal] = energy;
        c[FuelKind::Coal] = emissions;
        YearRecord::new(year, output, value_added, e, c)
    }

    #[test]
    fn single_fuel_effects_sum_to_total_change() {
        // Output x1.05, structure x1.02; energy 500 -> 600 fixes the intensity ratio.
        let base = single_fuel(2012, 1000.0, 2000.0, 500.0, 50.0);
        let comp = single_fuel(2013, 1050.0, 2142.0, 600.0, 80.0);
        let d = decompose_period(&base, &comp, EPS);

        assert!((d.total_change - 30.0).abs() < 1e-12);
        assert!(d.residual.abs() < 1e-6, "residual {}", d.residual);
        assert!(d.residual_within(1e-6));
        assert_eq!(d.period_label, "2012-2013");

        let w = log_mean(50.0, 80.0, EPS);
        assert!((d.effects.production - w * 1.05f64.ln()).abs() < 1e-9);
        assert!((d.effects.structure - w * 1.02f64.ln()).abs() < 1e-9);
        // One fuel: its share is 1 in both years.
        assert!(d.effects.mix.abs() < 1e-12);
        let ef_ratio = (80.0 / 600.0) / (50.0 / 500.0);
        assert!((d.effects.emission_factor - w * f64::ln(ef_ratio)).abs() < 1e-9);
    }

    #[test]
    fn fixed_macro_ratios_sum_to_total_change() {
        // Output 1.05, structure 1.02, intensity 0.98.
        let base = single_fuel(2012, 100.0, 200.0, 500.0, 50.0);
        let va_c = 105.0 * 2.0 * 1.02;
        let energy_c = va_c * 2.5 * 0.98;
        let comp = single_fuel(2013, 105.0, va_c, energy_c, 80.0);
        let d = decompose_period(&base, &comp, EPS);

        let w = log_mean(50.0, 80.0, EPS);
        assert!((d.effects.intensity - w * 0.98f64.ln()).abs() < 1e-9);
        assert!((d.sum_of_effects - d.total_change).abs() < 1e-6);
    }

    #[test]
    fn multi_fuel_decomposition_is_exact() {
        let mk = |year, output, va, coal: (f64, f64), gas: (f64, f64), heat_gj: f64| {
            let mut e = FuelMap::<f64>::default();
            let mut c = FuelMap::<f64>::default();
            e[FuelKind::Coal] = coal.0;
            c[FuelKind::Coal] = coal.1;
            e[FuelKind::Gas] = gas.0;
            c[FuelKind::Gas] = gas.1;
            e[FuelKind::Heat] = heat_gj;
            YearRecord::new(year, output, va, e, c)
        };
        let base = mk(2015, 800.0, 4000.0, (6.0e6, 606_000.0), (3.0e6, 168_300.0), 1.0e6);
        let comp = mk(2016, 860.0, 4500.0, (5.5e6, 560_000.0), (3.6e6, 201_960.0), 1.3e6);
        let d = decompose_period(&base, &comp, EPS);
        assert!(d.residual.abs() < 1e-6 * d.total_change.abs().max(1.0), "residual {}", d.residual);
        assert!(d.effects.mix != 0.0);
    }

    #[test]
    fn identical_years_produce_zero_effects() {
        let rec = single_fuel(2012, 1000.0, 2000.0, 500.0, 50.0);
        let d = decompose_period(&rec, &rec, EPS);
        assert_eq!(d.total_change, 0.0);
        assert_eq!(d.effects, Effects::default());
        assert_eq!(d.residual, 0.0);
    }

    #[test]
    fn inactive_fuels_contribute_nothing() {
        let base = single_fuel(2012, 1000.0, 2000.0, 500.0, 50.0);
        let comp = single_fuel(2013, 1100.0, 2100.0, 520.0, 52.0);
        let d = decompose_period(&base, &comp, EPS);
        // Only coal is active: production effect is its weight times the output log ratio.
        let w = log_mean(50.0, 52.0, EPS);
        assert!((d.effects.production - w * 1.1f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn zero_emission_fuel_has_no_emission_factor_effect() {
        let mut e_b = FuelMap::<f64>::default();
        let mut c_b = FuelMap::<f64>::default();
        e_b[FuelKind::Gas] = 1000.0;
        c_b[FuelKind::Gas] = 56.1;
        e_b[FuelKind::Heat] = 400.0;
        let mut e_c = e_b;
        let c_c = c_b;
        e_c[FuelKind::Heat] = 900.0;
        let base = YearRecord::new(2012, 10.0, 20.0, e_b, c_b);
        let comp = YearRecord::new(2013, 11.0, 21.0, e_c, c_c);
        let d = decompose_period(&base, &comp, EPS);
        assert_eq!(d.effects.emission_factor, 0.0);
    }

    #[test]
    fn fuel_disappearing_stays_finite() {
        let mut e_b = FuelMap::<f64>::default();
        let mut c_b = FuelMap::<f64>::default();
        e_b[FuelKind::Coal] = 500.0;
        c_b[FuelKind::Coal] = 50.0;
        e_b[FuelKind::Gas] = 300.0;
        c_b[FuelKind::Gas] = 17.0;
        let mut e_c = e_b;
        let mut c_c = c_b;
        e_c[FuelKind::Coal] = 0.0;
        c_c[FuelKind::Coal] = 0.0;
        let base = YearRecord::new(2012, 10.0, 20.0, e_b, c_b);
        let comp = YearRecord::new(2013, 10.0, 20.0, e_c, c_c);
        let d = decompose_period(&base, &comp, EPS);
        for v in [d.effects.production, d.effects.mix, d.effects.emission_factor, d.residual] {
            assert!(v.is_finite());
        }
        assert!((d.total_change + 50.0).abs() < 1e-12);
    }

    #[test]
    fn zero_output_and_value_added_do_not_panic() {
        let base = single_fuel(2012, 0.0, 0.0, 500.0, 50.0);
        let comp = single_fuel(2013, 0.0, 0.0, 600.0, 60.0);
        let d = decompose_period(&base, &comp, EPS);
        assert!(d.sum_of_effects.is_finite());
        assert_eq!(d.effects.production, 0.0);
    }

    fn arb_record(year: i32) -> impl Strategy<Value = YearRecord> {
        (
            1.0f64..1e6,
            1.0f64..1e6,
            proptest::array::uniform7(1.0f64..1e7),
            proptest::array::uniform7(0.01f64..0.2),
        )
            .prop_map(move |(output, va, energy, ef)| {
                let e = FuelMap::from_fn(|f| energy[f as usize]);
                let c = FuelMap::from_fn(|f| energy[f as usize] * ef[f as usize]);
                YearRecord::new(year, output, va, e, c)
            })
    }

    proptest! {
        #[test]
        fn active_fuels_decompose_exactly(base in arb_record(2012), comp in arb_record(2013)) {
            let d = decompose_period(&base, &comp, EPS);
            let scale = base.total_emissions_t().max(comp.total_emissions_t());
            prop_assert!(d.residual.abs() <= 1e-9 * scale, "residual {} at scale {}", d.residual, scale);
        }
    }
}
