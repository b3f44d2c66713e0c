//! Shape-preserving elementwise log/exp over vectors and row-major matrices.
//!
//! Probability-domain zeros map to `NEG_INFINITY` and back.

/// Elementwise natural log of a vector.
pub fn ln_vec(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.ln()).collect()
}

/// Elementwise exp of a vector.
pub fn exp_vec(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.exp()).collect()
}

/// Elementwise natural log of a row-major matrix.
pub fn ln_matrix(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    rows.iter().map(|row| ln_vec(row)).collect()
}

/// Elementwise exp of a row-major matrix.
pub fn exp_matrix(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    rows.iter().map(|row| exp_vec(row)).collect()
}
