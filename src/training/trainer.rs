//! Minibatch training and evaluation loops shared by both classifiers

use std::time::Instant;

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Int, Tensor};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;

use crate::data::{ReviewDataset, ReviewSample};
use crate::model::{nll_loss, predicted_class, StarClassifier};
use crate::training::metrics::{EarlyStopping, ErrorSamples, Metrics, TrainingHistory};
use crate::{Result, StarsError};

/// Everything a finished run produced
#[derive(Debug)]
pub struct TrainingOutcome<M> {
    pub model: M,
    pub history: TrainingHistory,
    pub train_errors: ErrorSamples,
    pub val_errors: ErrorSamples,
    /// Final early-stopping state, for runs that use it
    pub early_stopping: Option<EarlyStopping>,
}

/// Owns a model, its optimizer and the shuffle generator
pub struct Trainer<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + StarClassifier<B>,
    O: Optimizer<M, B>,
{
    model: M,
    optimizer: O,
    learning_rate: f64,
    minibatch_size: usize,
    rng: StdRng,
    device: B::Device,
}

impl<B, M, O> Trainer<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + StarClassifier<B>,
    O: Optimizer<M, B>,
{
    pub fn new(
        model: M,
        optimizer: O,
        learning_rate: f64,
        minibatch_size: usize,
        rng: StdRng,
        device: B::Device,
    ) -> Self {
        Trainer {
            model,
            optimizer,
            learning_rate,
            minibatch_size,
            rng,
            device,
        }
    }

    pub fn minibatch_size(&self) -> usize {
        self.minibatch_size
    }

    /// Fail early when a split cannot fill a single minibatch
    pub fn check_trainable(&self, train: &ReviewDataset<M::Features>) -> Result<()> {
        if train.len() < self.minibatch_size {
            return Err(StarsError::Data(format!(
                "training split has {} reviews, fewer than one minibatch of {}",
                train.len(),
                self.minibatch_size
            )));
        }
        Ok(())
    }

    /// Shuffle a split with the trainer's generator
    pub fn shuffle(&mut self, data: &mut ReviewDataset<M::Features>) {
        data.shuffle(&mut self.rng);
    }

    /// Train for one epoch: shuffle, then one optimizer step per full minibatch
    ///
    /// Each minibatch folds its per-example losses into one sum, divides by the
    /// minibatch size and backpropagates once.
    pub fn train_epoch(
        &mut self,
        data: &mut ReviewDataset<M::Features>,
        errors: &mut ErrorSamples,
    ) -> Result<Metrics> {
        let start = Instant::now();
        self.shuffle(data);

        let mut metrics = Metrics::new();
        let progress = progress_bar(data.len() / self.minibatch_size, "train");

        for minibatch in data.minibatches(self.minibatch_size) {
            let summed = minibatch
                .iter()
                .map(|sample| self.example_loss(sample, &mut metrics, errors))
                .reduce(|total, loss| total + loss);
            let Some(summed) = summed else {
                continue;
            };

            let loss = summed.div_scalar(self.minibatch_size as f32);
            let loss_value: f32 = loss.clone().into_scalar().elem();
            if !loss_value.is_finite() {
                progress.abandon();
                return Err(StarsError::Numerical(format!(
                    "minibatch loss is {} after {} examples",
                    loss_value, metrics.total
                )));
            }
            metrics.record_loss(loss_value);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &self.model);
            self.model = self
                .optimizer
                .step(self.learning_rate, self.model.clone(), grads);

            progress.inc(1);
        }

        progress.finish_and_clear();
        metrics.elapsed_secs = start.elapsed().as_secs_f64();
        Ok(metrics)
    }

    /// Evaluate the current model without updating it
    pub fn evaluate(
        &self,
        samples: &[ReviewSample<M::Features>],
        errors: &mut ErrorSamples,
    ) -> Metrics {
        evaluate(&self.model, samples, &self.device, errors)
    }

    fn example_loss(
        &self,
        sample: &ReviewSample<M::Features>,
        metrics: &mut Metrics,
        errors: &mut ErrorSamples,
    ) -> Tensor<B, 1> {
        let log_probs = self.model.log_probs(&sample.features, &self.device);

        let predicted = predicted_class(&log_probs);
        metrics.record(predicted, sample.label);
        if predicted != sample.label {
            errors.push(&sample.text, sample.label, predicted);
        }

        let target = Tensor::<B, 1, Int>::from_ints([sample.label as i32], &self.device);
        nll_loss(log_probs, target)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }
}

/// Score every sample with the model, collecting misclassifications
pub fn evaluate<B, M>(
    model: &M,
    samples: &[ReviewSample<M::Features>],
    device: &B::Device,
    errors: &mut ErrorSamples,
) -> Metrics
where
    B: Backend,
    M: StarClassifier<B>,
{
    let start = Instant::now();
    let mut metrics = Metrics::new();
    let progress = progress_bar(samples.len(), "validate");

    for sample in samples {
        let predicted = predicted_class(&model.log_probs(&sample.features, device));
        metrics.record(predicted, sample.label);
        if predicted != sample.label {
            errors.push(&sample.text, sample.label, predicted);
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    metrics.elapsed_secs = start.elapsed().as_secs_f64();
    metrics
}

fn progress_bar(len: usize, message: &'static str) -> ProgressBar {
    let progress = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{msg:>8} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
    {
        progress.set_style(style.progress_chars("#>-"));
    }
    progress.set_message(message);
    progress
}
