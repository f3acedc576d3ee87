use log::{debug, info};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::tfidf::SparseVector;
use super::utils::sigmoid;

/// How training rows are weighted per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every row counts once.
    Uniform,
    /// Rows are weighted by `n_samples / (n_classes * n_class_samples)`, so a skewed
    /// split does not bias predictions toward the majority class.
    Balanced,
}

/// Hyper-parameters of the logistic regression fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularisation strength; smaller values regularise more.
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the largest gradient component falls below this value.
    pub tol: f64,
    pub class_weight: ClassWeight,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
            class_weight: ClassWeight::Balanced,
        }
    }
}

/// Binary L2-regularised logistic regression over sparse rows.
///
/// Minimises `0.5 * |w|^2 + C * sum_i s_i * logloss_i` (the intercept is not
/// penalised) with Nesterov-accelerated full-batch gradient descent. The fit uses no
/// randomness, so the same rows always produce the same coefficients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogisticRegression {
    pub params: LogisticParams,
    coef: Array1<f64>,
    intercept: f64,
    n_iter: usize,
}

impl LogisticRegression {
    pub fn fit(
        rows: &[SparseVector],
        labels: &[u8],
        n_features: usize,
        params: LogisticParams,
    ) -> Result<Self, ClassifierError> {
        if rows.len() != labels.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Got {} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if rows.is_empty() {
            return Err(ClassifierError::ValidationError("Cannot fit on zero rows".into()));
        }
        if params.c <= 0.0 {
            return Err(ClassifierError::ValidationError(format!(
                "Regularisation strength C must be positive, got {}",
                params.c
            )));
        }
        if let Some(bad) = labels.iter().find(|&&y| y > 1) {
            return Err(ClassifierError::ValidationError(format!(
                "Labels must be 0 or 1, found {}",
                bad
            )));
        }

        let weights = Self::sample_weights(labels, params.class_weight);
        let total_weight: f64 = weights.iter().sum();
        let l2 = 1.0 / (params.c * total_weight);

        // Rows are unit length, so with the intercept column the squared norm is at most 2.
        let max_sq_norm = rows
            .iter()
            .map(|r| r.iter().map(|(_, v)| v * v).sum::<f64>() + 1.0)
            .fold(1.0, f64::max);
        let lipschitz = 0.25 * max_sq_norm + l2;
        let step = 1.0 / lipschitz;

        let mut coef = Array1::<f64>::zeros(n_features);
        let mut intercept = 0.0;
        let mut prev_coef = coef.clone();
        let mut prev_intercept = intercept;
        let mut n_iter = 0;

        for iter in 1..=params.max_iter {
            n_iter = iter;
            let momentum = (iter as f64 - 1.0) / (iter as f64 + 2.0);
            let look_coef = &coef + &((&coef - &prev_coef) * momentum);
            let look_intercept = intercept + momentum * (intercept - prev_intercept);

            let (grad_coef, grad_intercept) =
                Self::gradient(rows, labels, &weights, total_weight, l2, &look_coef, look_intercept);

            let grad_max = grad_coef
                .iter()
                .fold(grad_intercept.abs(), |acc, g| acc.max(g.abs()));

            prev_coef = coef;
            prev_intercept = intercept;
            coef = &look_coef - &(grad_coef * step);
            intercept = look_intercept - step * grad_intercept;

            if grad_max < params.tol {
                debug!("Gradient converged after {} iterations (max |g| = {:.2e})", iter, grad_max);
                break;
            }
        }

        info!(
            "Fitted logistic regression: {} features, {} rows, {} iterations",
            n_features,
            rows.len(),
            n_iter
        );

        Ok(Self {
            params,
            coef,
            intercept,
            n_iter,
        })
    }

    fn sample_weights(labels: &[u8], class_weight: ClassWeight) -> Vec<f64> {
        match class_weight {
            ClassWeight::Uniform => vec![1.0; labels.len()],
            ClassWeight::Balanced => {
                let positives = labels.iter().filter(|&&y| y == 1).count();
                let counts = [labels.len() - positives, positives];
                let n = labels.len() as f64;
                labels
                    .iter()
                    .map(|&y| n / (2.0 * counts[y as usize] as f64))
                    .collect()
            }
        }
    }

    fn gradient(
        rows: &[SparseVector],
        labels: &[u8],
        weights: &[f64],
        total_weight: f64,
        l2: f64,
        coef: &Array1<f64>,
        intercept: f64,
    ) -> (Array1<f64>, f64) {
        let mut grad = coef * l2;
        let mut grad_intercept = 0.0;
        for ((row, &y), &w) in rows.iter().zip(labels).zip(weights) {
            let p = sigmoid(Self::dot(coef, row) + intercept);
            let residual = w * (p - y as f64) / total_weight;
            for &(j, v) in row {
                grad[j] += residual * v;
            }
            grad_intercept += residual;
        }
        (grad, grad_intercept)
    }

    fn dot(coef: &Array1<f64>, row: &SparseVector) -> f64 {
        row.iter().map(|&(j, v)| coef[j] * v).sum()
    }

    /// Raw margin `w . x + b`.
    pub fn decision_function(&self, row: &SparseVector) -> f64 {
        Self::dot(&self.coef, row) + self.intercept
    }

    /// Probabilities of class 0 and class 1, in that order.
    pub fn predict_proba(&self, row: &SparseVector) -> [f64; 2] {
        let p = sigmoid(self.decision_function(row));
        [1.0 - p, p]
    }

    pub fn predict(&self, row: &SparseVector) -> u8 {
        if self.decision_function(row) > 0.0 {
            1
        } else {
            0
        }
    }

    pub fn n_features(&self) -> usize {
        self.coef.len()
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }
}
