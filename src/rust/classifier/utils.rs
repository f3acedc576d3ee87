use ndarray::{Array1, ArrayView1};

/// Numerically stable logistic function.
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

pub(crate) fn softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps = logits.mapv(|x| (x - max).exp());
    let sum = exps.sum();
    if sum > 0.0 {
        exps / sum
    } else {
        Array1::zeros(logits.len())
    }
}

/// Scales a sparse vector to unit L2 norm in place. Zero vectors are left untouched.
pub(crate) fn normalize_sparse(vec: &mut [(usize, f64)]) {
    let norm: f64 = vec.iter().map(|&(_, x)| x * x).sum::<f64>().sqrt();
    if norm > 1e-10 {
        for (_, x) in vec.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sigmoid_symmetry() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(3.0) + sigmoid(-3.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(1000.0) <= 1.0);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(array![1.0f32, 2.0, 3.0].view());
        assert!((probs.sum() - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_normalize_sparse() {
        let mut v = vec![(0, 3.0), (4, 4.0)];
        normalize_sparse(&mut v);
        assert!((v[0].1 - 0.6).abs() < 1e-12);
        assert!((v[1].1 - 0.8).abs() < 1e-12);

        let mut empty: Vec<(usize, f64)> = Vec::new();
        normalize_sparse(&mut empty);
        assert!(empty.is_empty());
    }
}
