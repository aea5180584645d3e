//! Seeded k-means++ clustering.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_MAX_ITERS: usize = 100;

fn squared_l2(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum()
}

fn nearest_center(point: &[f32], centers: &[Vec<f32>]) -> (usize, f64) {
    let mut best = (0usize, f64::INFINITY);
    for (c, center) in centers.iter().enumerate() {
        let d = squared_l2(point, center);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

/// Cluster `data` into `k` groups and return the cluster index of every
/// point. `k` is clamped to `1..=data.len()`; all rows must share one
/// dimension.
pub fn kmeans(data: &[Vec<f32>], k: usize, seed: u64, max_iters: usize) -> Vec<usize> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let k = k.clamp(1, n);
    let dim = data[0].len();
    let mut rng = StdRng::seed_from_u64(seed);

    // k-means++ seeding: each next center is drawn with probability
    // proportional to its squared distance from the nearest chosen one.
    let mut centers: Vec<Vec<f32>> = vec![data[rng.gen_range(0..n)].clone()];
    let mut nearest = vec![f64::INFINITY; n];
    while centers.len() < k {
        let last = &centers[centers.len() - 1];
        for (i, point) in data.iter().enumerate() {
            nearest[i] = nearest[i].min(squared_l2(point, last));
        }
        let total: f64 = nearest.iter().sum();
        let idx = if total <= 0.0 {
            // Every point coincides with a center; fall back to index order.
            centers.len() % n
        } else {
            let mut r = rng.gen_range(0.0..total);
            let mut chosen = n - 1;
            for (i, w) in nearest.iter().enumerate() {
                if r < *w {
                    chosen = i;
                    break;
                }
                r -= w;
            }
            chosen
        };
        centers.push(data[idx].clone());
    }

    // Lloyd iterations
    let mut assign = vec![0usize; n];
    for iter in 0..max_iters {
        let mut changed = false;
        for (i, point) in data.iter().enumerate() {
            let (c, _) = nearest_center(point, &centers);
            if assign[i] != c {
                assign[i] = c;
                changed = true;
            }
        }
        if iter > 0 && !changed {
            break;
        }

        let mut sums = vec![vec![0.0f64; dim]; k];
        let mut counts = vec![0usize; k];
        for (point, &c) in data.iter().zip(assign.iter()) {
            counts[c] += 1;
            for (s, x) in sums[c].iter_mut().zip(point.iter()) {
                *s += f64::from(*x);
            }
        }
        for c in 0..k {
            if counts[c] > 0 {
                let inv = 1.0 / counts[c] as f64;
                centers[c] = sums[c].iter().map(|s| (s * inv) as f32).collect();
            }
        }
    }

    assign
}
