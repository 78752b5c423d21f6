//! Seeded stratified train/test split.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::TrainError;

/// Row indices of each partition, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition row indices so each class keeps its proportion in both halves.
///
/// Per class, `round(count * test_fraction)` rows go to test, clamped so both
/// partitions get at least one. Classes are visited in sorted order and
/// shuffled with one ChaCha8 stream seeded from `seed`, so the result depends
/// only on the labels and the seed. ChaCha8 output is fixed by its algorithm,
/// so splits stay stable across `rand` upgrades.
pub fn stratified_split(
    axis: &str,
    labels: &[&str],
    test_fraction: f64,
    seed: u64,
) -> Result<Split, TrainError> {
    let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        by_class.entry(*label).or_default().push(idx);
    }

    if let Some((class, rows)) = by_class.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(TrainError::InsufficientClassSamples {
            axis: axis.to_string(),
            class: class.to_string(),
            count: rows.len(),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for rows in by_class.values_mut() {
        rows.shuffle(&mut rng);
        let n = rows.len();
        let n_test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}
