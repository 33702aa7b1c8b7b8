// ============================================================
// Layer 4 — Train/Validation/Test Splitter
// ============================================================
// Randomly shuffles samples and splits them into three sets:
//   - Training set:   used to update model weights
//   - Validation set: drives checkpointing and early stopping
//   - Test set:       scored once, with the best checkpoint
//
// The samples arrive grouped by particle species, so the shuffle
// is what gives every set a representative mix.
//
// Split sizes: train = ⌊train·n⌋, validation = ⌊val·n⌋,
// test = whatever remains.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Fractions of the data given to training and validation.
#[derive(Debug, Clone, Copy)]
pub struct SplitFractions {
    pub train: f64,
    pub val:   f64,
}

impl Default for SplitFractions {
    fn default() -> Self {
        Self { train: 0.7, val: 0.2 }
    }
}

#[derive(Debug)]
pub struct DataSplit<T> {
    pub train: Vec<T>,
    pub val:   Vec<T>,
    pub test:  Vec<T>,
}

/// Shuffle `samples` and cut them into train / validation / test.
///
/// A seed makes the shuffle reproducible; without one the
/// generator is seeded from the OS.
pub fn split_dataset<T>(
    mut samples: Vec<T>,
    fractions:   SplitFractions,
    seed:        Option<u64>,
) -> DataSplit<T> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    };

    // Fisher-Yates shuffle
    samples.shuffle(&mut rng);

    let total     = samples.len();
    let train_end = ((total as f64) * fractions.train).floor() as usize;
    let val_end   = train_end + ((total as f64) * fractions.val).floor() as usize;

    // Clamp to valid range to avoid panics on tiny datasets
    let train_end = train_end.min(total);
    let val_end   = val_end.min(total);

    let test = samples.split_off(val_end);
    let val  = samples.split_off(train_end);

    tracing::debug!(
        "Dataset split: {} training, {} validation, {} test",
        samples.len(), val.len(), test.len(),
    );

    DataSplit { train: samples, val, test }
}
