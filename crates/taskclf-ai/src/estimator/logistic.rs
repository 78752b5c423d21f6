//! Multinomial logistic regression fitted by full-batch gradient descent.

use serde::{Deserialize, Serialize};
use taskclf_core::EstimatorConfig;

use super::{Estimator, argmax};

/// Softmax regression with L2 penalty on the weights (not the intercepts).
///
/// Minimises `mean(cross_entropy) + ||W||² / (2·C·n)`, the per-sample form of
/// `C·sum(loss) + ||W||²/2`. The step size is `learning_rate / L`, where `L`
/// bounds the gradient's Lipschitz constant from the largest row norm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    max_iter: usize,
    learning_rate: f64,
    tolerance: f64,
    c: f64,
    /// `n_classes × n_features`
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    /// Iterations run by the last fit.
    n_iter: usize,
}

impl LogisticRegression {
    pub fn new(config: &EstimatorConfig) -> Self {
        Self {
            max_iter: config.max_iter,
            learning_rate: config.learning_rate,
            tolerance: config.tolerance,
            c: config.c,
            weights: Vec::new(),
            intercepts: Vec::new(),
            n_iter: 0,
        }
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    fn logits(&self, x: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| b + w.iter().zip(x).map(|(wi, xi)| wi * xi).sum::<f64>())
            .collect()
    }

    /// Class probabilities for one row.
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        softmax(&self.logits(x))
    }
}

fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = z.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

impl Estimator for LogisticRegression {
    fn fit(&mut self, x: &[Vec<f64>], y: &[usize], n_classes: usize) {
        let n = x.len();
        let d = x.first().map_or(0, |r| r.len());
        self.weights = vec![vec![0.0; d]; n_classes];
        self.intercepts = vec![0.0; n_classes];
        self.n_iter = 0;

        // One class (or no data): zero weights already predict class 0.
        if n == 0 || n_classes < 2 {
            return;
        }

        let lambda = 1.0 / (self.c * n as f64);
        let max_sq_norm = x
            .iter()
            .map(|r| 1.0 + r.iter().map(|v| v * v).sum::<f64>())
            .fold(0.0, f64::max);
        let lipschitz = 0.5 * max_sq_norm + lambda;
        let step = self.learning_rate / lipschitz;

        let mut grad_w = vec![vec![0.0; d]; n_classes];
        let mut grad_b = vec![0.0; n_classes];

        for iter in 0..self.max_iter {
            grad_w.iter_mut().for_each(|g| g.fill(0.0));
            grad_b.fill(0.0);

            for (row, &class) in x.iter().zip(y) {
                let probs = self.predict_proba(row);
                for (k, p) in probs.iter().enumerate() {
                    let err = p - if k == class { 1.0 } else { 0.0 };
                    grad_b[k] += err;
                    for (g, v) in grad_w[k].iter_mut().zip(row) {
                        *g += err * v;
                    }
                }
            }

            let inv_n = 1.0 / n as f64;
            let mut max_abs: f64 = 0.0;
            for k in 0..n_classes {
                grad_b[k] *= inv_n;
                max_abs = max_abs.max(grad_b[k].abs());
                for (g, w) in grad_w[k].iter_mut().zip(&self.weights[k]) {
                    *g = *g * inv_n + lambda * w;
                    max_abs = max_abs.max(g.abs());
                }
            }

            for k in 0..n_classes {
                self.intercepts[k] -= step * grad_b[k];
                for (w, g) in self.weights[k].iter_mut().zip(&grad_w[k]) {
                    *w -= step * g;
                }
            }

            self.n_iter = iter + 1;
            if max_abs < self.tolerance {
                break;
            }
        }
    }

    fn predict(&self, x: &[f64]) -> usize {
        if self.intercepts.is_empty() {
            return 0;
        }
        argmax(&self.logits(x))
    }
}
