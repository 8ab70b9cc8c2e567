//! Data loading and vectorization
//!
//! JSON review loading, bag-of-words vocabulary, pre-trained embedding lookup
//! and the sample containers the trainers iterate over.

pub mod dataset;
pub mod embedding;
pub mod loader;
pub mod vocab;

pub use dataset::{ReviewDataset, ReviewSample};
pub use embedding::{sequence_text, EmbeddedSequence, EmbeddingTable};
pub use loader::{load_data, load_reviews};
pub use vocab::{build_vocabulary, BagOfWords, Vocabulary};
