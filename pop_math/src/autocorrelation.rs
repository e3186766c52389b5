//! Sample autocovariance and Yule-Walker estimation

use crate::{MathError, Result};

/// Sample autocovariances for lags `0..=max_lag` (biased, divided by `n`)
pub fn autocovariance(data: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    if data.len() <= max_lag {
        return Err(MathError::InsufficientData(format!(
            "Autocovariance up to lag {} needs more than {} observations, got {}",
            max_lag,
            max_lag,
            data.len()
        )));
    }

    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let centered: Vec<f64> = data.iter().map(|x| x - mean).collect();

    Ok((0..=max_lag)
        .map(|lag| {
            centered[lag..]
                .iter()
                .zip(&centered)
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / n
        })
        .collect())
}

/// Yule-Walker AR coefficients via the Levinson-Durbin recursion.
///
/// Returns zeros when the series has no variance, and stops early (leaving the
/// remaining coefficients at zero) if the recursion becomes singular.
pub fn yule_walker(data: &[f64], order: usize) -> Result<Vec<f64>> {
    if order == 0 {
        return Ok(Vec::new());
    }

    let gamma = autocovariance(data, order)?;
    let mut coeffs = vec![0.0; order];
    if gamma[0].abs() < 1e-12 {
        return Ok(coeffs);
    }

    let mut error = gamma[0];
    for k in 0..order {
        let mut acc = gamma[k + 1];
        for j in 0..k {
            acc -= coeffs[j] * gamma[k - j];
        }

        let reflection = acc / error;
        let previous = coeffs.clone();
        coeffs[k] = reflection;
        for j in 0..k {
            coeffs[j] = previous[j] - reflection * previous[k - 1 - j];
        }

        error *= 1.0 - reflection * reflection;
        if error.abs() < 1e-12 {
            break;
        }
    }

    Ok(coeffs)
}
