use super::Criterion;
use serde::Serialize;

/// Saaty random-index table for matrices of order 1..10; larger matrices
/// reuse the order-10 value.
const RANDOM_INDEX: [f64; 10] = [0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49];

/// AHP consistency figures for a pairwise-derived weight vector.
#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyReport {
    pub lambda_max: f64,
    pub ci: f64,
    pub cr: f64,
    pub acceptable: bool,
}

/// Clamp supplied weights to >= 0 and renormalize to sum 1. Criteria without
/// a weight receive an equal share before normalization.
pub(super) fn derive_direct(criteria: &[Criterion]) -> (Vec<f64>, Vec<String>) {
    let mut diagnostics = Vec::new();

    let mut weights: Vec<f64> = criteria
        .iter()
        .map(|criterion| criterion.weight.unwrap_or(1.0).max(0.0))
        .collect();

    if criteria.iter().any(|criterion| criterion.weight.is_none()) {
        diagnostics.push("Missing direct weights defaulted to an equal share.".to_string());
    }
    if criteria
        .iter()
        .any(|criterion| matches!(criterion.weight, Some(w) if w < 0.0))
    {
        diagnostics.push("Negative weights clamped to 0.".to_string());
    }

    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for weight in &mut weights {
            *weight /= total;
        }
    } else {
        let share = 1.0 / weights.len() as f64;
        weights.fill(share);
        diagnostics.push("All weights were zero; equal shares applied.".to_string());
    }

    (weights, diagnostics)
}

/// Geometric-mean weight derivation from an n x n reciprocal comparison
/// matrix, with the principal-eigenvalue consistency check.
pub(super) fn derive_pairwise(
    matrix: &[Vec<f64>],
    n: usize,
) -> Result<(Vec<f64>, ConsistencyReport), String> {
    if matrix.len() != n {
        return Err(format!(
            "pairwise matrix has {} rows, expected {n}",
            matrix.len()
        ));
    }
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != n {
            return Err(format!("pairwise row {i} has {} entries, expected {n}", row.len()));
        }
        if row.iter().any(|value| *value <= 0.0 || !value.is_finite()) {
            return Err(format!("pairwise row {i} contains a non-positive entry"));
        }
    }

    let mut weights: Vec<f64> = matrix
        .iter()
        .map(|row| {
            let product: f64 = row.iter().product();
            product.powf(1.0 / n as f64)
        })
        .collect();
    let total: f64 = weights.iter().sum();
    for weight in &mut weights {
        *weight /= total;
    }

    // lambda_max estimated as the mean of (A w)_i / w_i.
    let lambda_max = matrix
        .iter()
        .zip(&weights)
        .map(|(row, weight)| {
            let aw: f64 = row.iter().zip(&weights).map(|(a, w)| a * w).sum();
            aw / weight
        })
        .sum::<f64>()
        / n as f64;

    let ci = if n > 2 {
        (lambda_max - n as f64) / (n as f64 - 1.0)
    } else {
        0.0
    };
    let ri = RANDOM_INDEX[n.min(RANDOM_INDEX.len()) - 1];
    let cr = if ri > 0.0 { ci / ri } else { 0.0 };

    Ok((
        weights,
        ConsistencyReport {
            lambda_max,
            ci,
            cr,
            acceptable: cr < 0.10,
        },
    ))
}
