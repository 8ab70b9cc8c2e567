//! Feed-forward classifier over bag-of-words counts
//!
//! Architecture: Input(|vocab|) → Hidden(h) → ReLU → Linear(5) → LogSoftmax

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation::{log_softmax, relu};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::StarClassifier;
use crate::data::BagOfWords;
use crate::NUM_CLASSES;

/// Configuration for the FFNN model
#[derive(Debug, Clone)]
pub struct FFNNConfig {
    /// Input dimension (vocabulary size including the unknown slot)
    pub input_dim: usize,
    /// Hidden layer width
    pub hidden_dim: usize,
}

/// One hidden layer feed-forward network
#[derive(Module, Debug)]
pub struct FFNNModel<B: Backend> {
    hidden: Linear<B>,
    output: Linear<B>,
    input_dim: usize,
}

impl<B: Backend> FFNNModel<B> {
    /// Create a new FFNN model
    pub fn new(device: &B::Device, config: FFNNConfig) -> Self {
        FFNNModel {
            hidden: LinearConfig::new(config.input_dim, config.hidden_dim).init(device),
            output: LinearConfig::new(config.hidden_dim, NUM_CLASSES).init(device),
            input_dim: config.input_dim,
        }
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `input` - Word-count vectors [batch, input_dim]
    ///
    /// # Returns
    /// Log-probabilities [batch, 5]
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.hidden.forward(input));
        let logits = self.output.forward(x);
        log_softmax(logits, 1)
    }
}

impl<B: Backend> StarClassifier<B> for FFNNModel<B> {
    type Features = BagOfWords;

    fn log_probs(&self, features: &BagOfWords, device: &B::Device) -> Tensor<B, 2> {
        let input = Tensor::<B, 1>::from_floats(features.to_dense().as_slice(), device)
            .reshape([1, features.dim()]);
        self.forward(input)
    }
}
