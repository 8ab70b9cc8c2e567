//! Neural network architectures
//!
//! Two classifiers over the same five rating classes:
//! - FFNN: one hidden layer over bag-of-words counts
//! - RNN: single-layer tanh recurrent unit over word embeddings

pub mod ffnn;
pub mod rnn;

pub use ffnn::{FFNNConfig, FFNNModel};
pub use rnn::{RNNConfig, RNNModel};

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Int, Tensor};

/// A five-way rating classifier over some per-review encoding
pub trait StarClassifier<B: Backend> {
    /// Encoded form of a single review
    type Features;

    /// Log-probabilities `[1, NUM_CLASSES]` for one review
    fn log_probs(&self, features: &Self::Features, device: &B::Device) -> Tensor<B, 2>;
}

/// Negative log likelihood of the gold classes, averaged over the batch
///
/// # Arguments
/// * `log_probs` - Log-probabilities [batch, classes]
/// * `targets` - Gold class indices [batch]
pub fn nll_loss<B: Backend>(log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    let batch_size = targets.dims()[0];
    log_probs
        .gather(1, targets.reshape([batch_size, 1]))
        .neg()
        .mean()
}

/// Index of the most likely class for a single-row output
pub fn predicted_class<B: Backend>(log_probs: &Tensor<B, 2>) -> usize {
    let index: i64 = log_probs.clone().argmax(1).into_scalar().elem();
    index as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::activation::log_softmax;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_nll_loss_picks_gold_entries() {
        let device = Default::default();
        let probs = Tensor::<TestBackend, 2>::from_floats(
            [[0.1, 0.2, 0.3, 0.3, 0.1], [0.5, 0.1, 0.1, 0.1, 0.2]],
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([2, 0], &device);

        let loss: f32 = nll_loss(probs.log(), targets).into_scalar().elem();
        let expected = -(0.3f32.ln() + 0.5f32.ln()) / 2.0;
        assert!((loss - expected).abs() < 1e-5, "loss {} != {}", loss, expected);
    }

    #[test]
    fn test_predicted_class() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_floats([[0.0, 3.0, 1.0, -2.0, 2.5]], &device);
        assert_eq!(predicted_class(&log_softmax(logits, 1)), 1);
    }
}
