//! Recurrent classifier over word-embedding sequences
//!
//! A single-layer Elman network: h_t = tanh(W_ih·x_t + b_ih + W_hh·h_{t-1} + b_hh).
//! Only the final hidden state feeds the output layer.

use burn::module::Module;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::tensor::activation::{log_softmax, tanh};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::StarClassifier;
use crate::data::EmbeddedSequence;
use crate::NUM_CLASSES;

/// Configuration for the RNN model
#[derive(Debug, Clone)]
pub struct RNNConfig {
    /// Embedding dimension of each time step
    pub input_dim: usize,
    /// Recurrent hidden size
    pub hidden_size: usize,
}

impl Default for RNNConfig {
    fn default() -> Self {
        RNNConfig {
            input_dim: 50,
            hidden_size: 64,
        }
    }
}

/// Final hidden state of the recurrent layer
#[derive(Debug, Clone)]
pub struct RNNState<B: Backend> {
    /// [num_layers, batch, hidden_size]
    pub hidden: Tensor<B, 3>,
}

/// Single tanh recurrent layer
#[derive(Module, Debug)]
pub struct RecurrentLayer<B: Backend> {
    input_to_hidden: Linear<B>,
    hidden_to_hidden: Linear<B>,
    hidden_size: usize,
}

impl<B: Backend> RecurrentLayer<B> {
    pub fn new(device: &B::Device, input_dim: usize, hidden_size: usize) -> Self {
        // Every weight and bias uniform in ±1/sqrt(hidden_size)
        let bound = 1.0 / (hidden_size as f64).sqrt();
        let init = Initializer::Uniform {
            min: -bound,
            max: bound,
        };

        RecurrentLayer {
            input_to_hidden: LinearConfig::new(input_dim, hidden_size)
                .with_initializer(init.clone())
                .init(device),
            hidden_to_hidden: LinearConfig::new(hidden_size, hidden_size)
                .with_initializer(init)
                .init(device),
            hidden_size,
        }
    }

    /// Run the layer over a whole sequence from a zero state
    ///
    /// # Arguments
    /// * `input` - Sequence [batch, seq_len, input_dim]
    pub fn forward(&self, input: Tensor<B, 3>) -> RNNState<B> {
        let [batch_size, seq_len, _] = input.dims();
        let projected = self.input_to_hidden.forward(input);

        let mut hidden = Tensor::<B, 2>::zeros([batch_size, self.hidden_size], &projected.device());
        for t in 0..seq_len {
            let step = projected
                .clone()
                .slice([0..batch_size, t..t + 1, 0..self.hidden_size])
                .reshape([batch_size, self.hidden_size]);
            hidden = tanh(step + self.hidden_to_hidden.forward(hidden));
        }

        RNNState {
            hidden: hidden.unsqueeze_dim(0),
        }
    }
}

/// Recurrent rating classifier
#[derive(Module, Debug)]
pub struct RNNModel<B: Backend> {
    rnn: RecurrentLayer<B>,
    output: Linear<B>,
    input_dim: usize,
    hidden_size: usize,
}

impl<B: Backend> RNNModel<B> {
    /// Create a new RNN model
    pub fn new(device: &B::Device, config: RNNConfig) -> Self {
        RNNModel {
            rnn: RecurrentLayer::new(device, config.input_dim, config.hidden_size),
            output: LinearConfig::new(config.hidden_size, NUM_CLASSES).init(device),
            input_dim: config.input_dim,
            hidden_size: config.hidden_size,
        }
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `inputs` - Embedded sequence [batch, seq_len, input_dim]
    ///
    /// # Returns
    /// Log-probabilities [1, 5]
    pub fn forward(&self, inputs: Tensor<B, 3>) -> Tensor<B, 2> {
        let state = self.rnn.forward(inputs);
        let [num_layers, batch_size, _] = state.hidden.dims();

        // Last layer's final hidden state: [batch, hidden_size]
        let last = state
            .hidden
            .slice([num_layers - 1..num_layers, 0..batch_size, 0..self.hidden_size])
            .reshape([batch_size, self.hidden_size]);
        let output = self.output.forward(last);

        // Sum over the batch dimension; a no-op at batch size 1
        let summed = output.sum_dim(0);
        log_softmax(summed, 1)
    }
}

impl<B: Backend> StarClassifier<B> for RNNModel<B> {
    type Features = EmbeddedSequence;

    fn log_probs(&self, features: &EmbeddedSequence, device: &B::Device) -> Tensor<B, 2> {
        let input = Tensor::<B, 1>::from_floats(features.values(), device)
            .reshape([1, features.len(), features.dim()]);
        self.forward(input)
    }
}
