//! Model training
//!
//! Shared minibatch loop, per-model trainers, and metrics tracking.

pub mod ffnn_trainer;
pub mod metrics;
pub mod rnn_trainer;
pub mod trainer;

pub use ffnn_trainer::FFNNTrainer;
pub use metrics::{EarlyStopping, ErrorSample, ErrorSamples, Metrics, TrainingHistory};
pub use rnn_trainer::RNNTrainer;
pub use trainer::{evaluate, Trainer, TrainingOutcome};
