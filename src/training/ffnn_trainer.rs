//! Training loop for the feed-forward model

use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::momentum::MomentumConfig;
use burn::optim::{Sgd, SgdConfig};
use burn::tensor::backend::AutodiffBackend;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::data::{BagOfWords, ReviewDataset};
use crate::model::{FFNNConfig, FFNNModel};
use crate::training::metrics::{ErrorSamples, TrainingHistory};
use crate::training::trainer::{Trainer, TrainingOutcome};
use crate::{FfnnRunConfig, Result, StarsError};

type FFNNOptimizer<B> =
    OptimizerAdaptor<Sgd<<B as AutodiffBackend>::InnerBackend>, FFNNModel<B>, B>;

/// Trainer for the bag-of-words model: SGD with momentum for a fixed number of epochs
pub struct FFNNTrainer<B: AutodiffBackend> {
    trainer: Trainer<B, FFNNModel<B>, FFNNOptimizer<B>>,
    error_sample_limit: usize,
}

impl<B: AutodiffBackend> FFNNTrainer<B> {
    /// Seed the backend and shuffle generator, then build the model
    pub fn new(
        device: B::Device,
        model_config: FFNNConfig,
        run: &FfnnRunConfig,
        minibatch_size: usize,
        error_sample_limit: usize,
    ) -> Self {
        B::seed(run.seed);
        let model = FFNNModel::new(&device, model_config);

        let optimizer = SgdConfig::new()
            .with_momentum(Some(
                MomentumConfig::new()
                    .with_momentum(run.momentum)
                    .with_dampening(0.0),
            ))
            .init();

        FFNNTrainer {
            trainer: Trainer::new(
                model,
                optimizer,
                run.learning_rate,
                minibatch_size,
                StdRng::seed_from_u64(run.seed),
                device,
            ),
            error_sample_limit,
        }
    }

    /// Train for exactly `epochs` epochs
    ///
    /// Validation only scores the samples covered by full minibatches.
    pub fn train(
        mut self,
        mut train: ReviewDataset<BagOfWords>,
        val: ReviewDataset<BagOfWords>,
        epochs: usize,
    ) -> Result<TrainingOutcome<FFNNModel<B>>> {
        self.trainer.check_trainable(&train)?;
        self.check_dimensions(&train)?;
        self.check_dimensions(&val)?;

        let minibatch_size = self.trainer.minibatch_size();
        let mut history = TrainingHistory::new();
        let mut train_errors = ErrorSamples::bounded(self.error_sample_limit);
        let mut val_errors = ErrorSamples::bounded(self.error_sample_limit);

        log::info!(
            "Starting FFNN training for {} epochs ({} training, {} validation reviews)",
            epochs,
            train.len(),
            val.len()
        );

        for epoch in 1..=epochs {
            log::info!("Training started for epoch {}", epoch);
            let train_metrics = self.trainer.train_epoch(&mut train, &mut train_errors)?;
            log::info!(
                "Training completed for epoch {}: {}",
                epoch,
                train_metrics
            );

            log::info!("Validation started for epoch {}", epoch);
            let val_metrics = self
                .trainer
                .evaluate(val.minibatched(minibatch_size), &mut val_errors);
            log::info!(
                "Validation completed for epoch {}: {}",
                epoch,
                val_metrics
            );

            history.record_epoch(&train_metrics, &val_metrics);
        }

        Ok(TrainingOutcome {
            model: self.trainer.into_model(),
            history,
            train_errors,
            val_errors,
            early_stopping: None,
        })
    }

    fn check_dimensions(&self, data: &ReviewDataset<BagOfWords>) -> Result<()> {
        let expected = self.trainer.model().input_dim();
        match data.samples().iter().find(|s| s.features.dim() != expected) {
            Some(sample) => Err(StarsError::Numerical(format!(
                "bag-of-words vector has {} entries but the model expects {}",
                sample.features.dim(),
                expected
            ))),
            None => Ok(()),
        }
    }
}
