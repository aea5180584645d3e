//! PCA projection by power iteration with deflation.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_ITERS: usize = 200;
const TOLERANCE: f64 = 1e-9;

/// Project the rows of `data` onto its first `components` principal axes.
///
/// The covariance matrix is never formed; each iteration computes
/// `Xᵀ(Xv)` on the centered data. Axes are sign-normalised so their largest
/// loading is positive, which keeps output stable for a given seed.
pub fn pca(data: &Array2<f64>, components: usize, seed: u64) -> Array2<f64> {
    let (n, dim) = data.dim();
    let mut projected = Array2::<f64>::zeros((n, components));
    if n == 0 || dim == 0 {
        return projected;
    }

    let mean = data.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(dim));
    let centered = data - &mean;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut axes: Vec<Array1<f64>> = Vec::with_capacity(components);

    for c in 0..components.min(dim) {
        let mut v: Array1<f64> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
        orthogonalize(&mut v, &axes);
        if !normalize(&mut v) {
            break;
        }

        for _ in 0..MAX_ITERS {
            let mut next = centered.t().dot(&centered.dot(&v));
            orthogonalize(&mut next, &axes);
            if !normalize(&mut next) {
                // No variance left along any remaining direction.
                return projected;
            }
            let delta = (&next - &v).mapv(f64::abs).sum();
            v = next;
            if delta < TOLERANCE {
                break;
            }
        }

        let pivot = v
            .iter()
            .copied()
            .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
        if pivot < 0.0 {
            v.mapv_inplace(|x| -x);
        }

        projected.column_mut(c).assign(&centered.dot(&v));
        axes.push(v);
    }

    projected
}

fn orthogonalize(v: &mut Array1<f64>, axes: &[Array1<f64>]) {
    for axis in axes {
        let overlap = v.dot(axis);
        v.scaled_add(-overlap, axis);
    }
}

fn normalize(v: &mut Array1<f64>) -> bool {
    let norm = v.dot(v).sqrt();
    if norm < 1e-12 {
        return false;
    }
    v.mapv_inplace(|x| x / norm);
    true
}
