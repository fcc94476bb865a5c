use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{Dataset, DatasetError};

/// Training and held-out partitions of one corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
    /// Source row indices of `train`, in partition order.
    pub train_indices: Vec<usize>,
    /// Source row indices of `test`, in partition order.
    pub test_indices: Vec<usize>,
}

/// Shuffles row indices with a seeded RNG and holds out the first
/// `ceil(test_size * n)` of them. No stratification.
///
/// # Errors
/// `InvalidSplit` if `test_size` is not in (0, 1) or either partition
/// would come out empty.
pub fn train_test_split(dataset: &Dataset, test_size: f64, seed: u64) -> Result<Split, DatasetError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DatasetError::InvalidSplit(format!(
            "test_size {} is not in (0, 1)",
            test_size
        )));
    }

    let n = dataset.len();
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(DatasetError::InvalidSplit(format!(
            "{} records cannot be split with test_size {} into two non-empty partitions",
            n, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train_indices = indices.split_off(n_test);
    let test_indices = indices;
    debug!(
        "Split {} records into {} train / {} test (seed {})",
        n,
        train_indices.len(),
        test_indices.len(),
        seed
    );

    Ok(Split {
        train: dataset.select(&train_indices),
        test: dataset.select(&test_indices),
        train_indices,
        test_indices,
    })
}
