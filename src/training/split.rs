use anyhow::{bail, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use super::Sample;
use crate::mood::MoodLabel;

fn test_count(class_size: usize, test_size: f64) -> usize {
    if class_size < 2 {
        return 0;
    }
    ((class_size as f64 * test_size).round() as usize).clamp(1, class_size - 1)
}

/// Splits into `(train, test)` keeping each mood's proportion in both parts.
/// Every mood with at least two samples lands in both parts; a lone sample
/// goes to training.
pub fn stratified_split(
    samples: Vec<Sample>,
    test_size: f64,
    seed: u64,
) -> Result<(Vec<Sample>, Vec<Sample>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        bail!("Test size must be between 0 and 1, got {}", test_size);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut by_class: Vec<Vec<Sample>> = vec![Vec::new(); MoodLabel::ALL.len()];
    for sample in samples {
        by_class[sample.label.index()].push(sample);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for mut class in by_class {
        class.shuffle(&mut rng);
        let n_test = test_count(class.len(), test_size);
        let rest = class.split_off(n_test);
        test.extend(class);
        train.extend(rest);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    Ok((train, test))
}
