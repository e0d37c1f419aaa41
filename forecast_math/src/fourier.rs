//! Fourier features for periodic components

use std::f64::consts::PI;

/// Fourier terms of a single time point.
///
/// Returns `[sin(2π·1·t/P), cos(2π·1·t/P), ..., sin(2π·N·t/P), cos(2π·N·t/P)]`
/// for period `P` and order `N`, so the result has `2N` entries.
pub fn fourier_terms(t: f64, period: f64, order: usize) -> Vec<f64> {
    let mut terms = Vec::with_capacity(2 * order);
    for k in 1..=order {
        let angle = 2.0 * PI * k as f64 * t / period;
        terms.push(angle.sin());
        terms.push(angle.cos());
    }
    terms
}
