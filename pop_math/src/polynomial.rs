//! Lag polynomials
//!
//! A polynomial in the backshift operator `B` is stored as its coefficients in
//! ascending powers, so `[1.0, -0.5]` is `1 - 0.5B`.

/// Multiply two lag polynomials
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut product = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            product[i + j] += x * y;
        }
    }
    product
}

/// Autoregressive operator `1 - phi_1 B - ... - phi_p B^p` with lags spaced by `spacing`
pub fn ar_operator(phi: &[f64], spacing: usize) -> Vec<f64> {
    operator(phi, spacing, -1.0)
}

/// Moving-average operator `1 + theta_1 B + ... + theta_q B^q` with lags spaced by `spacing`
pub fn ma_operator(theta: &[f64], spacing: usize) -> Vec<f64> {
    operator(theta, spacing, 1.0)
}

fn operator(coefficients: &[f64], spacing: usize, sign: f64) -> Vec<f64> {
    let spacing = spacing.max(1);
    let mut poly = vec![0.0; coefficients.len() * spacing + 1];
    poly[0] = 1.0;
    for (i, &c) in coefficients.iter().enumerate() {
        poly[(i + 1) * spacing] = sign * c;
    }
    poly
}

/// The operator `(1 - B)^d (1 - B^s)^D`
pub fn differencing_operator(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let regular = ar_operator(&[1.0], 1);
    let seasonal = ar_operator(&[1.0], period);

    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &regular);
    }
    for _ in 0..seasonal_d {
        poly = multiply(&poly, &seasonal);
    }
    poly
}

/// Convert an operator back to recursion coefficients.
///
/// For an AR operator `[1, -a_1, ..., -a_m]` this returns `[a_1, ..., a_m]`,
/// the weights in `x_t = a_1 x_{t-1} + ... + a_m x_{t-m}`.
pub fn recursion_coefficients(ar_op: &[f64]) -> Vec<f64> {
    ar_op.iter().skip(1).map(|c| -c).collect()
}

/// First `n` psi weights of `ma_op(B) / ar_op(B)`.
///
/// `ar_op[0]` must be 1.
pub fn psi_weights(ar_op: &[f64], ma_op: &[f64], n: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(n);
    for j in 0..n {
        let mut value = ma_op.get(j).copied().unwrap_or(0.0);
        for i in 1..ar_op.len().min(j + 1) {
            value -= ar_op[i] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}
