//! Star-rating prediction from review text
//!
//! Two small classifiers trained on the same data: a feed-forward network over
//! bag-of-words counts and a recurrent network over pre-trained word embeddings.

pub mod data;
pub mod model;
pub mod report;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of rating classes (1 to 5 stars)
pub const NUM_CLASSES: usize = 5;

/// A tokenized review with its 0-based rating class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub tokens: Vec<String>,
    pub label: usize,
}

impl Review {
    /// Build a review from raw text and a 1-5 star rating
    pub fn from_stars(text: &str, stars: u8) -> Result<Self> {
        if !(1..=NUM_CLASSES as u8).contains(&stars) {
            return Err(StarsError::Data(format!(
                "stars must be between 1 and {}, got {}",
                NUM_CLASSES, stars
            )));
        }

        Ok(Review {
            tokens: text.split_whitespace().map(str::to_string).collect(),
            label: (stars - 1) as usize,
        })
    }

    /// The original text, tokens joined by single spaces
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Which classifier a run trains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Ffnn,
    Rnn,
}

impl ModelKind {
    /// Short name used in output file names
    pub fn file_stem(&self) -> &'static str {
        match self {
            ModelKind::Ffnn => "ffnn",
            ModelKind::Rnn => "rnn",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Ffnn => write!(f, "FFNN"),
            ModelKind::Rnn => write!(f, "RNN"),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum StarsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding table error: {0}")]
    Embedding(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Numerical error: {0}")]
    Numerical(String),
}

pub type Result<T> = std::result::Result<T, StarsError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub training: TrainingConfig,
    pub ffnn: FfnnRunConfig,
    pub rnn: RnnRunConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub minibatch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfnnRunConfig {
    pub learning_rate: f64,
    pub momentum: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RnnRunConfig {
    pub learning_rate: f64,
    pub embedding_path: String,
    pub embedding_dim: usize,
    /// Fixed shuffle seed; a fresh OS seed is drawn when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Hard cap on epochs; early stopping is the only exit when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_epochs: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub error_samples_dir: String,
    pub results_dir: String,
    pub error_sample_limit: usize,
}

impl OutputConfig {
    pub fn error_samples_path(&self, kind: ModelKind) -> std::path::PathBuf {
        std::path::Path::new(&self.error_samples_dir)
            .join(format!("error_samples_{}.txt", kind.file_stem()))
    }

    pub fn results_path(&self, kind: ModelKind) -> std::path::PathBuf {
        std::path::Path::new(&self.results_dir).join(format!("test_{}.out", kind.file_stem()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            training: TrainingConfig { minibatch_size: 16 },
            ffnn: FfnnRunConfig {
                learning_rate: 0.01,
                momentum: 0.9,
                seed: 42,
            },
            rnn: RnnRunConfig {
                learning_rate: 0.01,
                embedding_path: "word_embedding.bin".to_string(),
                embedding_dim: 50,
                seed: None,
                max_epochs: None,
            },
            output: OutputConfig {
                error_samples_dir: "error-samples".to_string(),
                results_dir: "results".to_string(),
                error_sample_limit: 10,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StarsError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| StarsError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StarsError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.training.minibatch_size == 0 {
            return Err(StarsError::Config(
                "training.minibatch_size must be at least 1".to_string(),
            ));
        }
        if self.rnn.embedding_dim == 0 {
            return Err(StarsError::Config(
                "rnn.embedding_dim must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
