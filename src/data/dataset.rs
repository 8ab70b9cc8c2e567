//! Vectorized review samples
//!
//! Each sample keeps a readable text and its gold label next to the encoded
//! features so misclassifications can be reported.

use burn::data::dataset::Dataset;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::Review;

/// One vectorized review
#[derive(Debug, Clone)]
pub struct ReviewSample<F> {
    /// Text reported for misclassifications
    pub text: String,
    /// Gold class in `0..NUM_CLASSES`
    pub label: usize,
    pub features: F,
}

/// Ordered collection of samples for one split
#[derive(Debug, Clone)]
pub struct ReviewDataset<F> {
    samples: Vec<ReviewSample<F>>,
}

impl<F> ReviewDataset<F> {
    /// Vectorize reviews with the given encoder
    pub fn from_reviews(reviews: &[Review], encode: impl FnMut(&Review) -> F) -> Self {
        Self::from_reviews_with_text(reviews, Review::text, encode)
    }

    /// Vectorize reviews, recording each sample's text with `describe`
    pub fn from_reviews_with_text(
        reviews: &[Review],
        describe: impl Fn(&Review) -> String,
        mut encode: impl FnMut(&Review) -> F,
    ) -> Self {
        let samples = reviews
            .iter()
            .map(|review| ReviewSample {
                text: describe(review),
                label: review.label,
                features: encode(review),
            })
            .collect();
        ReviewDataset { samples }
    }

    pub fn from_samples(samples: Vec<ReviewSample<F>>) -> Self {
        ReviewDataset { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[ReviewSample<F>] {
        &self.samples
    }

    /// Shuffle in place with the caller's generator
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.samples.shuffle(rng);
    }

    /// Full minibatches in order; the trailing `len % size` samples are skipped
    pub fn minibatches(&self, size: usize) -> std::slice::ChunksExact<'_, ReviewSample<F>> {
        self.samples.chunks_exact(size)
    }

    /// The prefix covered by full minibatches of `size`
    pub fn minibatched(&self, size: usize) -> &[ReviewSample<F>] {
        let covered = (self.samples.len() / size) * size;
        &self.samples[..covered]
    }
}

impl<F> Dataset<ReviewSample<F>> for ReviewDataset<F>
where
    F: Clone + Send + Sync,
{
    fn get(&self, index: usize) -> Option<ReviewSample<F>> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
