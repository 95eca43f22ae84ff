/// Logarithmic mean of two non-negative levels, the LMDI-I weight.
///
/// `L(x, y) = (y - x) / (ln y - ln x)`, extended to its limits:
///
/// - `|x - y| <= epsilon` gives the arithmetic mean `(x + y) / 2`, which is the
///   limit as `y -> x` and also yields `0` when both levels are zero.
/// - Exactly one zero argument uses the one-sided form with `ln(epsilon)`
///   standing in for `ln(0)`, keeping the weight finite and positive.
///
/// The result is symmetric in `x` and `y` (bit for bit: arguments are ordered
/// before evaluation) and non-negative for non-negative inputs.
pub fn log_mean(x: f64, y: f64, epsilon: f64) -> f64 {
    let (lo, hi) = if x <= y { (x, y) } else { (y, x) };
    // `<=` also covers hi == epsilon with lo == 0, where the one-sided form
    // below would divide by zero.
    if hi - lo <= epsilon {
        return (lo + hi) / 2.0;
    }
    if lo.abs() < epsilon && hi.abs() < epsilon {
        return 0.0;
    }
    if lo == 0.0 {
        return -hi / (epsilon.ln() - hi.max(epsilon).ln());
    }
    // ln_1p keeps precision when hi and lo are close.
    let log_ratio = if hi / lo < 2.0 {
        ((hi - lo) / lo).ln_1p()
    } else {
        hi.ln() - lo.ln()
    };
    (hi - lo) / log_ratio
}
