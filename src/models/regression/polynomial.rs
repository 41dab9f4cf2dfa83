//! Polynomial feature expansion.

/// Number of features produced by [`expand_polynomial`].
pub fn expanded_len(base: usize, degree: usize) -> usize {
    let powers = base * degree.saturating_sub(1);
    let interactions = if degree >= 2 {
        base * base.saturating_sub(1) / 2
    } else {
        0
    };
    base + powers + interactions
}

/// Expand base features into polynomial form.
///
/// Output order: the base features, then every feature raised to each
/// power 2..=degree (grouped by power), then the pairwise products
/// `x_i * x_j` for `i < j` when `degree >= 2`.
pub fn expand_polynomial(features: &[f64], degree: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(expanded_len(features.len(), degree));
    out.extend_from_slice(features);

    for power in 2..=degree {
        out.extend(features.iter().map(|x| x.powi(power as i32)));
    }

    if degree >= 2 {
        for i in 0..features.len() {
            for j in (i + 1)..features.len() {
                out.push(features[i] * features[j]);
            }
        }
    }
    out
}
