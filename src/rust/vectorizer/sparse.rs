use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// A row of the TF-IDF matrix: strictly increasing feature indices paired
/// with non-zero weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Builds a vector from `(index, value)` pairs already sorted by index.
    /// Zero entries are dropped.
    pub(crate) fn from_sorted(entries: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (index, value) in entries {
            debug_assert!(indices.last().map_or(true, |&last| last < index));
            if value != 0.0 {
                indices.push(index);
                values.push(value);
            }
        }
        Self { indices, values }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn get(&self, index: usize) -> f64 {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or(0.0)
    }

    /// Largest stored index, if any.
    pub fn max_index(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    pub fn dot(&self, dense: ArrayView1<'_, f64>) -> f64 {
        self.iter().map(|(i, v)| v * dense[i]).sum()
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_zero_entries_dropped() {
        let v = SparseVector::from_sorted(vec![(0, 1.0), (2, 0.0), (5, 2.0)]);
        assert_eq!(v.indices(), &[0, 5]);
        assert_eq!(v.get(5), 2.0);
        assert_eq!(v.get(2), 0.0);
        assert_eq!(v.max_index(), Some(5));
    }

    #[test]
    fn test_dot_with_dense() {
        let v = SparseVector::from_sorted(vec![(1, 2.0), (3, 0.5)]);
        let dense = array![10.0, 1.0, 10.0, 4.0];
        assert_eq!(v.dot(dense.view()), 4.0);
    }
}
