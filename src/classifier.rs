use crate::error::CoreError;

/// A fitted model able to label unseen samples.
pub trait TrainedModel: Send + Sync {
    /// Predict one label per row of a row-major matrix with `feature_len`
    /// columns.
    fn predict(&self, x: &[f64], feature_len: usize) -> Vec<u8>;
}

/// Learning backend injected into the fitness evaluator, so the optimizer
/// stays agnostic to the actual algorithm. Implementations must be pure:
/// no shared mutable state across `fit` calls, they run concurrently.
pub trait Classifier: Send + Sync {
    fn fit(
        &self,
        x: &[f64],
        y: &[u8],
        feature_len: usize,
    ) -> Result<Box<dyn TrainedModel>, CoreError>;
}

/// Gaussian naive Bayes, the default backend. Cheap to fit, deterministic,
/// and exposes a numeric failure mode (empty training split) the optimizer
/// must recover from.
pub struct GaussianNb {
    /// Fraction of the largest feature variance added to every variance
    /// to keep degenerate (constant) columns from producing infinities.
    pub var_smoothing: f64,
}

impl Default for GaussianNb {
    fn default() -> Self {
        GaussianNb {
            var_smoothing: 1e-9,
        }
    }
}

pub struct GaussianNbModel {
    classes: Vec<u8>,
    log_priors: Vec<f64>,
    /// Per class, per feature
    means: Vec<Vec<f64>>,
    variances: Vec<Vec<f64>>,
}

impl Classifier for GaussianNb {
    fn fit(
        &self,
        x: &[f64],
        y: &[u8],
        feature_len: usize,
    ) -> Result<Box<dyn TrainedModel>, CoreError> {
        if y.is_empty() || feature_len == 0 {
            return Err(CoreError::Evaluation(
                "Cannot fit on an empty training split".to_string(),
            ));
        }
        if x.len() != y.len() * feature_len {
            return Err(CoreError::Evaluation(format!(
                "Training matrix has {} values, expected {}",
                x.len(),
                y.len() * feature_len
            )));
        }

        let mut classes: Vec<u8> = y.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let n = y.len() as f64;
        let mut log_priors = Vec::with_capacity(classes.len());
        let mut means = Vec::with_capacity(classes.len());
        let mut variances = Vec::with_capacity(classes.len());

        for &class in &classes {
            let rows: Vec<usize> = (0..y.len()).filter(|&i| y[i] == class).collect();
            let count = rows.len() as f64;
            log_priors.push((count / n).ln());

            let mut class_means = vec![0.0; feature_len];
            for &r in &rows {
                for f in 0..feature_len {
                    class_means[f] += x[r * feature_len + f];
                }
            }
            for m in class_means.iter_mut() {
                *m /= count;
            }

            let mut class_vars = vec![0.0; feature_len];
            for &r in &rows {
                for f in 0..feature_len {
                    let d = x[r * feature_len + f] - class_means[f];
                    class_vars[f] += d * d;
                }
            }
            for v in class_vars.iter_mut() {
                *v /= count;
            }

            means.push(class_means);
            variances.push(class_vars);
        }

        // Smooth variances against the largest one observed over all
        // classes and features, falling back to the smoothing constant
        // when every column is constant.
        let max_var = variances
            .iter()
            .flatten()
            .cloned()
            .fold(0.0_f64, f64::max);
        let epsilon = if max_var > 0.0 {
            self.var_smoothing * max_var
        } else {
            self.var_smoothing
        };
        for class_vars in variances.iter_mut() {
            for v in class_vars.iter_mut() {
                *v += epsilon;
            }
        }

        Ok(Box::new(GaussianNbModel {
            classes,
            log_priors,
            means,
            variances,
        }))
    }
}

impl TrainedModel for GaussianNbModel {
    fn predict(&self, x: &[f64], feature_len: usize) -> Vec<u8> {
        let rows = x.len() / feature_len.max(1);
        let mut predictions = Vec::with_capacity(rows);

        for r in 0..rows {
            let sample = &x[r * feature_len..(r + 1) * feature_len];
            let mut best_class = self.classes[0];
            let mut best_score = f64::NEG_INFINITY;

            for (c, &class) in self.classes.iter().enumerate() {
                let mut score = self.log_priors[c];
                for f in 0..feature_len {
                    let mean = self.means[c][f];
                    let var = self.variances[c][f];
                    let d = sample[f] - mean;
                    score -= 0.5 * ((2.0 * std::f64::consts::PI * var).ln() + d * d / var);
                }
                if score > best_score {
                    best_score = score;
                    best_class = class;
                }
            }
            predictions.push(best_class);
        }

        predictions
    }
}
