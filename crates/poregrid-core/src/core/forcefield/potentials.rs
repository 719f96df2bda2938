/// Lennard-Jones 12-6 energy from a squared distance.
///
/// `E = 4ε[(σ²/r²)³((σ²/r²)³ − 1)]`, in the units of `well_depth`.
///
/// The kernel is unguarded: `dist_sq == 0.0` yields `+∞` for a positive well
/// depth (and `NaN` for a zero one). Callers decide how to report it.
#[inline]
pub fn lennard_jones_12_6(dist_sq: f64, well_depth: f64, sigma: f64) -> f64 {
    let ratio = sigma * sigma / dist_sq;
    let ratio6 = ratio * ratio * ratio;
    4.0 * well_depth * ratio6 * (ratio6 - 1.0)
}

/// Distance of the Lennard-Jones minimum, `2^(1/6) σ`.
#[inline]
pub fn lennard_jones_minimum_distance(sigma: f64) -> f64 {
    sigma * 2f64.powf(1.0 / 6.0)
}
