use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};

/// `0..size` in random order. A seed makes the order reproducible.
pub fn shuffled_permutation(size: usize, seed: Option<u64>) -> Vec<usize> {
    let mut values: Vec<usize> = (0..size).collect();
    match seed {
        Some(seed) => values.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => values.shuffle(&mut thread_rng()),
    }
    values
}
