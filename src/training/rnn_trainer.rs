//! Training loop for the recurrent model
//!
//! Runs until the early-stopping rule fires: validation accuracy falls while
//! training accuracy still rises. An optional epoch cap bounds runs that never
//! trigger it.

use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig};
use burn::tensor::backend::AutodiffBackend;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::data::{EmbeddedSequence, ReviewDataset};
use crate::model::{RNNConfig, RNNModel};
use crate::training::metrics::{EarlyStopping, ErrorSamples, Metrics, TrainingHistory};
use crate::training::trainer::{Trainer, TrainingOutcome};
use crate::{Result, RnnRunConfig, StarsError};

type RNNOptimizer<B> = OptimizerAdaptor<Adam, RNNModel<B>, B>;

/// Trainer for the embedding-sequence model: Adam with early stopping
pub struct RNNTrainer<B: AutodiffBackend> {
    trainer: Trainer<B, RNNModel<B>, RNNOptimizer<B>>,
    max_epochs: Option<usize>,
}

impl<B: AutodiffBackend> RNNTrainer<B> {
    pub fn new(
        device: B::Device,
        model_config: RNNConfig,
        run: &RnnRunConfig,
        minibatch_size: usize,
    ) -> Self {
        let rng = match run.seed {
            Some(seed) => {
                B::seed(seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_os_rng(),
        };

        let model = RNNModel::new(&device, model_config);
        let optimizer = AdamConfig::new().with_epsilon(1e-8).init();

        RNNTrainer {
            trainer: Trainer::new(
                model,
                optimizer,
                run.learning_rate,
                minibatch_size,
                rng,
                device,
            ),
            max_epochs: run.max_epochs,
        }
    }

    /// Train until early stopping (or the epoch cap) ends the run
    ///
    /// Validation reshuffles its split each epoch and scores every sample.
    /// Training misclassifications are not kept; validation ones all are.
    pub fn train(
        mut self,
        mut train: ReviewDataset<EmbeddedSequence>,
        mut val: ReviewDataset<EmbeddedSequence>,
    ) -> Result<TrainingOutcome<RNNModel<B>>> {
        self.trainer.check_trainable(&train)?;
        self.check_dimensions(&train)?;
        self.check_dimensions(&val)?;

        let mut train_errors = ErrorSamples::bounded(0);
        let mut val_errors = ErrorSamples::unbounded();

        log::info!(
            "Starting RNN training ({} training, {} validation reviews)",
            train.len(),
            val.len()
        );

        let trainer = &mut self.trainer;
        let (history, stopper) = train_until_overfit(self.max_epochs, |epoch| {
            log::info!("Training started for epoch {}", epoch);
            let train_metrics = trainer.train_epoch(&mut train, &mut train_errors)?;
            log::info!(
                "Training completed for epoch {}: {}",
                epoch,
                train_metrics
            );

            log::info!("Validation started for epoch {}", epoch);
            trainer.shuffle(&mut val);
            let val_metrics = trainer.evaluate(val.samples(), &mut val_errors);
            log::info!(
                "Validation completed for epoch {}: {}",
                epoch,
                val_metrics
            );

            Ok((train_metrics, val_metrics))
        })?;

        Ok(TrainingOutcome {
            model: self.trainer.into_model(),
            history,
            train_errors,
            val_errors,
            early_stopping: Some(stopper),
        })
    }

    fn check_dimensions(&self, data: &ReviewDataset<EmbeddedSequence>) -> Result<()> {
        let expected = self.trainer.model().input_dim();
        match data.samples().iter().find(|s| s.features.dim() != expected) {
            Some(sample) => Err(StarsError::Numerical(format!(
                "embedding vectors have {} entries but the model expects {}",
                sample.features.dim(),
                expected
            ))),
            None => Ok(()),
        }
    }
}

/// Run epochs until the early-stopping rule fires or `max_epochs` is reached
///
/// `run_epoch` receives the 1-based epoch number and returns that epoch's
/// training and validation metrics.
fn train_until_overfit(
    max_epochs: Option<usize>,
    mut run_epoch: impl FnMut(usize) -> Result<(Metrics, Metrics)>,
) -> Result<(TrainingHistory, EarlyStopping)> {
    let mut history = TrainingHistory::new();
    let mut stopper = EarlyStopping::new();
    if max_epochs.is_none() {
        log::debug!("No epoch cap set; early stopping is the only exit");
    }

    let mut epoch = 0;
    loop {
        if max_epochs.is_some_and(|max| epoch >= max) {
            log::warn!(
                "Reached the cap of {} epochs before early stopping fired",
                epoch
            );
            break;
        }
        epoch += 1;

        let (train_metrics, val_metrics) = run_epoch(epoch)?;
        history.record_epoch(&train_metrics, &val_metrics);

        if stopper.should_stop(train_metrics.accuracy(), val_metrics.accuracy()) {
            log::info!(
                "Training done to avoid overfitting! Best validation accuracy: {:.4}",
                stopper.last_val_accuracy()
            );
            break;
        }
    }

    Ok((history, stopper))
}
