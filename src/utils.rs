use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Split a Vec<T> randomly into p chunks of approximatively the same size.
/// Used to build stratified cross-validation folds.
pub fn split_into_balanced_random_chunks<T: Clone>(
    vec: Vec<T>,
    p: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<Vec<T>> {
    let mut shuffled = vec;
    shuffled.shuffle(rng);

    let n = shuffled.len();
    let base_size = n / p;
    let extra_elements = n % p;

    let mut chunks = Vec::new();
    let mut start = 0;

    for i in 0..p {
        let chunk_size = base_size + if i < extra_elements { 1 } else { 0 };
        let end = start + chunk_size;
        chunks.push(shuffled[start..end].to_vec());
        start = end;
    }

    chunks
}

/// Shuffle the values of one column of a row-major matrix across its rows.
pub fn shuffle_column(x: &mut [f64], rows: usize, cols: usize, col: usize, rng: &mut ChaCha8Rng) {
    let mut values: Vec<f64> = (0..rows).map(|r| x[r * cols + col]).collect();
    values.shuffle(rng);
    for (r, v) in values.into_iter().enumerate() {
        x[r * cols + col] = v;
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
