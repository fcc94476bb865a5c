use super::sparse::SparseVector;

/// Scales `vec` to unit L2 norm in place. A zero vector is left untouched.
pub(crate) fn normalize_vector(vec: &mut SparseVector) {
    let norm = vec.norm();
    if norm > 1e-10 {
        for value in vec.values_mut() {
            *value /= norm;
        }
    }
}

/// Smoothed inverse document frequency.
pub(crate) fn smooth_idf(n_docs: usize, doc_freq: usize) -> f64 {
    ((1.0 + n_docs as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
}
