//! Training metrics, per-epoch history and early stopping

use std::fmt;

/// Metrics accumulated over one training or validation pass
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    /// Number of correct predictions
    pub correct: usize,
    /// Total predictions
    pub total: usize,
    /// Sum of averaged minibatch losses (training only)
    pub loss_sum: f64,
    /// Number of minibatch losses accumulated
    pub batch_count: usize,
    /// Wall-clock duration of the pass in seconds
    pub elapsed_secs: f64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single prediction
    pub fn record(&mut self, predicted: usize, gold: usize) {
        if predicted == gold {
            self.correct += 1;
        }
        self.total += 1;
    }

    /// Record the averaged loss of one minibatch
    pub fn record_loss(&mut self, loss: f32) {
        self.loss_sum += loss as f64;
        self.batch_count += 1;
    }

    /// Fraction of correct predictions, 0 when nothing was seen
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    /// Average minibatch loss, if any minibatch was trained
    pub fn avg_loss(&self) -> Option<f64> {
        (self.batch_count > 0).then(|| self.loss_sum / self.batch_count as f64)
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Acc: {:.2}% ({}/{}) | Time: {:.2}s",
            self.accuracy() * 100.0,
            self.correct,
            self.total,
            self.elapsed_secs
        )?;
        if let Some(loss) = self.avg_loss() {
            write!(f, " | Loss: {:.4}", loss)?;
        }
        Ok(())
    }
}

/// Per-epoch results, appended in epoch order
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub train_accuracies: Vec<f64>,
    pub train_times: Vec<f64>,
    pub train_losses: Vec<f64>,
    pub val_accuracies: Vec<f64>,
    pub val_times: Vec<f64>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record metrics for an epoch
    pub fn record_epoch(&mut self, train: &Metrics, val: &Metrics) {
        self.train_accuracies.push(train.accuracy());
        self.train_times.push(train.elapsed_secs);
        self.train_losses.push(train.avg_loss().unwrap_or(0.0));
        self.val_accuracies.push(val.accuracy());
        self.val_times.push(val.elapsed_secs);
    }

    /// Number of epochs recorded
    pub fn epochs(&self) -> usize {
        self.train_accuracies.len()
    }

    /// Highest validation accuracy seen
    pub fn best_val_accuracy(&self) -> Option<f64> {
        self.val_accuracies.iter().copied().reduce(f64::max)
    }
}

/// A misclassified review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSample {
    pub text: String,
    pub gold: usize,
    pub predicted: usize,
}

/// Misclassified reviews in the order they were found, optionally capped
#[derive(Debug, Clone, Default)]
pub struct ErrorSamples {
    samples: Vec<ErrorSample>,
    limit: Option<usize>,
}

impl ErrorSamples {
    /// Keep every sample
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Keep only the first `limit` samples
    pub fn bounded(limit: usize) -> Self {
        ErrorSamples {
            samples: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn push(&mut self, text: &str, gold: usize, predicted: usize) {
        if self.limit.is_some_and(|limit| self.samples.len() >= limit) {
            return;
        }
        self.samples.push(ErrorSample {
            text: text.to_string(),
            gold,
            predicted,
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorSample> {
        self.samples.iter()
    }
}

/// Stops when validation accuracy drops while training accuracy rises
///
/// Both "last" accuracies start at zero and are carried forward only while
/// training continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarlyStopping {
    last_train_accuracy: f64,
    last_val_accuracy: f64,
}

impl EarlyStopping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check an epoch's accuracies; returns true when training should stop
    pub fn should_stop(&mut self, train_accuracy: f64, val_accuracy: f64) -> bool {
        if val_accuracy < self.last_val_accuracy && train_accuracy > self.last_train_accuracy {
            return true;
        }
        self.last_train_accuracy = train_accuracy;
        self.last_val_accuracy = val_accuracy;
        false
    }

    pub fn last_train_accuracy(&self) -> f64 {
        self.last_train_accuracy
    }

    /// Validation accuracy of the last epoch that did not trigger a stop
    pub fn last_val_accuracy(&self) -> f64 {
        self.last_val_accuracy
    }
}
