//! Nelder-Mead simplex minimisation
//!
//! Derivative-free, deterministic, and bounded by both an iteration limit and
//! an optional wall-clock deadline.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Settings for [`nelder_mead`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMeadConfig {
    /// Maximum number of simplex updates
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values across the simplex
    pub tolerance: f64,
    /// Absolute tolerance on the distance of each vertex from the best vertex
    pub x_tolerance: f64,
    /// Offset used to build the initial simplex around the starting point
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            tolerance: 1e-10,
            x_tolerance: 1e-8,
            initial_step: 0.1,
        }
    }
}

/// Outcome of a converged minimisation
#[derive(Debug, Clone, PartialEq)]
pub struct NelderMeadResult {
    pub optimal_point: Vec<f64>,
    pub optimal_value: f64,
    pub iterations: usize,
}

/// Minimise `objective` starting from `initial`.
///
/// Non-finite objective values are treated as `f64::MAX`. Points are clamped
/// into `bounds` when given. Fails with [`MathError::NotConverged`] when the
/// iteration limit is reached and [`MathError::DeadlineExceeded`] when the
/// deadline passes first.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
    deadline: Option<Instant>,
) -> Result<NelderMeadResult>
where
    F: Fn(&[f64]) -> f64,
{
    if let Some(bounds) = bounds {
        if bounds.len() != initial.len() {
            return Err(MathError::InvalidInput(format!(
                "Expected {} bounds, got {}",
                initial.len(),
                bounds.len()
            )));
        }
    }

    let clamp = |mut x: Vec<f64>| -> Vec<f64> {
        if let Some(bounds) = bounds {
            for (value, (lo, hi)) in x.iter_mut().zip(bounds) {
                *value = value.clamp(*lo, *hi);
            }
        }
        x
    };
    let evaluate = |x: &[f64]| -> f64 {
        let value = objective(x);
        if value.is_finite() {
            value
        } else {
            f64::MAX
        }
    };

    let n = initial.len();
    if n == 0 {
        return Ok(NelderMeadResult {
            optimal_point: Vec::new(),
            optimal_value: evaluate(&[]),
            iterations: 0,
        });
    }

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    let start = clamp(initial.to_vec());
    let start_value = evaluate(&start);
    simplex.push((start.clone(), start_value));
    for i in 0..n {
        let mut vertex = start.clone();
        vertex[i] += config.initial_step;
        let mut vertex = clamp(vertex);
        if vertex[i] == start[i] {
            // Pinned against an upper bound; step the other way
            vertex[i] -= config.initial_step;
            vertex = clamp(vertex);
        }
        let value = evaluate(&vertex);
        simplex.push((vertex, value));
    }

    for iteration in 0..config.max_iter {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(MathError::DeadlineExceeded {
                iterations: iteration,
            });
        }

        sort_simplex(&mut simplex);
        if has_converged(&simplex, config) {
            return Ok(finish(simplex, iteration));
        }

        let centroid = centroid(&simplex[..n]);
        let (worst, worst_value) = simplex[n].clone();
        let best_value = simplex[0].1;
        let second_worst_value = simplex[n - 1].1;

        let reflected = clamp(along(&centroid, &worst, -REFLECTION));
        let reflected_value = evaluate(&reflected);

        if reflected_value < best_value {
            let expanded = clamp(along(&centroid, &reflected, EXPANSION));
            let expanded_value = evaluate(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }

        if reflected_value < second_worst_value {
            simplex[n] = (reflected, reflected_value);
            continue;
        }

        let (contracted, accept) = if reflected_value < worst_value {
            let outside = clamp(along(&centroid, &reflected, CONTRACTION));
            let value = evaluate(&outside);
            ((outside, value), value <= reflected_value)
        } else {
            let inside = clamp(along(&centroid, &worst, CONTRACTION));
            let value = evaluate(&inside);
            ((inside, value), value < worst_value)
        };

        if accept {
            simplex[n] = contracted;
        } else {
            let best = simplex[0].0.clone();
            for (vertex, value) in simplex.iter_mut().skip(1) {
                *vertex = clamp(along(&best, vertex, SHRINK));
                *value = evaluate(vertex);
            }
        }
    }

    sort_simplex(&mut simplex);
    if has_converged(&simplex, config) {
        return Ok(finish(simplex, config.max_iter));
    }

    Err(MathError::NotConverged {
        iterations: config.max_iter,
    })
}

/// `origin + factor * (target - origin)`
fn along(origin: &[f64], target: &[f64], factor: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, t)| o + factor * (t - o))
        .collect()
}

fn centroid(vertices: &[(Vec<f64>, f64)]) -> Vec<f64> {
    let dim = vertices[0].0.len();
    let count = vertices.len() as f64;
    (0..dim)
        .map(|j| vertices.iter().map(|(x, _)| x[j]).sum::<f64>() / count)
        .collect()
}

fn sort_simplex(simplex: &mut [(Vec<f64>, f64)]) {
    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
}

fn has_converged(simplex: &[(Vec<f64>, f64)], config: &NelderMeadConfig) -> bool {
    let (best, best_value) = &simplex[0];
    let worst_value = simplex[simplex.len() - 1].1;

    let value_spread = worst_value - best_value;
    let point_spread = simplex
        .iter()
        .skip(1)
        .flat_map(|(x, _)| x.iter().zip(best).map(|(a, b)| (a - b).abs()))
        .fold(0.0_f64, f64::max);

    value_spread <= config.tolerance * (1.0 + best_value.abs())
        && point_spread <= config.x_tolerance
}

fn finish(mut simplex: Vec<(Vec<f64>, f64)>, iterations: usize) -> NelderMeadResult {
    let (optimal_point, optimal_value) = simplex.swap_remove(0);
    NelderMeadResult {
        optimal_point,
        optimal_value,
        iterations,
    }
}
