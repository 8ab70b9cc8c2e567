//! Bag-of-words vocabulary and vectorization
//!
//! The vocabulary is built from the training split only. Tokens are indexed in
//! lexicographic order with the unknown-token sentinel appended last, so the
//! mapping is stable for a fixed training set.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::Review;

/// Sentinel standing in for any token unseen in training
pub const UNK: &str = "<UNK>";

/// Collect the distinct tokens of a set of reviews
pub fn build_vocabulary(reviews: &[Review]) -> BTreeSet<String> {
    reviews
        .iter()
        .flat_map(|r| r.tokens.iter().cloned())
        .collect()
}

/// Token <-> index mapping over the training vocabulary plus [`UNK`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    index_to_word: Vec<String>,
    word_to_index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Index a vocabulary: sorted tokens first, then the sentinel
    ///
    /// A literal `<UNK>` token in the input is folded into the sentinel so
    /// every index stays inside the feature vector.
    pub fn build_index(vocabulary: BTreeSet<String>) -> Self {
        let mut index_to_word: Vec<String> =
            vocabulary.into_iter().filter(|w| w != UNK).collect();
        index_to_word.push(UNK.to_string());

        let word_to_index = index_to_word
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();

        Vocabulary {
            index_to_word,
            word_to_index,
        }
    }

    /// Number of indexed entries, sentinel included
    pub fn len(&self) -> usize {
        self.index_to_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_word.is_empty()
    }

    pub fn unk_index(&self) -> usize {
        self.index_to_word.len() - 1
    }

    /// Index of a token, falling back to the sentinel
    pub fn index_of(&self, token: &str) -> usize {
        self.word_to_index
            .get(token)
            .copied()
            .unwrap_or_else(|| self.unk_index())
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.index_to_word.get(index).map(String::as_str)
    }

    /// Tokens in index order
    pub fn tokens(&self) -> &[String] {
        &self.index_to_word
    }

    /// Count each token of a review into its vocabulary slot
    pub fn vectorize(&self, review: &Review) -> BagOfWords {
        let mut counts = BTreeMap::new();
        for token in &review.tokens {
            *counts.entry(self.index_of(token)).or_insert(0.0) += 1.0;
        }
        BagOfWords {
            dim: self.len(),
            counts,
        }
    }
}

/// Word-count feature vector, stored sparsely
#[derive(Debug, Clone, PartialEq)]
pub struct BagOfWords {
    dim: usize,
    counts: BTreeMap<usize, f32>,
}

impl BagOfWords {
    /// Length of the dense vector
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Count at a slot (zero when absent)
    pub fn get(&self, index: usize) -> f32 {
        self.counts.get(&index).copied().unwrap_or(0.0)
    }

    /// Non-zero `(index, count)` entries in index order
    pub fn nonzero(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.counts.iter().map(|(&i, &c)| (i, c))
    }

    pub fn to_dense(&self) -> Vec<f32> {
        let mut dense = vec![0.0; self.dim];
        for (i, c) in self.nonzero() {
            dense[i] = c;
        }
        dense
    }
}
