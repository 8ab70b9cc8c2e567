//! Pre-trained word embedding table
//!
//! Maps lowercase tokens to fixed-size vectors. The table is read once and never
//! updated during training. Binary tables are bincode-encoded; pickled and JSON
//! token -> list dictionaries and GloVe text files are accepted as well, picked
//! by file extension.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, Review, StarsError};

/// Fallback key for tokens missing from the table
pub const UNK_KEY: &str = "unk";

/// Token -> vector lookup with an `unk` fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingTable {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl EmbeddingTable {
    /// Build a table, checking every vector has `dim` entries and `unk` exists
    pub fn new(dim: usize, vectors: HashMap<String, Vec<f32>>) -> Result<Self> {
        if let Some((token, v)) = vectors.iter().find(|(_, v)| v.len() != dim) {
            return Err(StarsError::Embedding(format!(
                "vector for {:?} has {} dimensions, expected {}",
                token,
                v.len(),
                dim
            )));
        }
        if !vectors.contains_key(UNK_KEY) {
            return Err(StarsError::Embedding(format!(
                "table has no {:?} entry",
                UNK_KEY
            )));
        }
        Ok(EmbeddingTable { dim, vectors })
    }

    /// Load a table, choosing the format from the extension
    ///
    /// `.json` is an object of token -> array, `.pkl` a pickled dict of
    /// token -> list of floats, `.txt` is GloVe text. Anything else is read as
    /// the binary format written by [`EmbeddingTable::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            StarsError::Embedding(format!("cannot open {}: {}", path.display(), e))
        })?;
        let reader = BufReader::new(file);

        let table = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_map(serde_json::from_reader(reader)?)?,
            Some("pkl") => {
                let vectors = serde_pickle::from_reader(reader, serde_pickle::DeOptions::new())
                    .map_err(|e| {
                        StarsError::Embedding(format!("cannot unpickle {}: {}", path.display(), e))
                    })?;
                Self::from_map(vectors)?
            }
            Some("txt") => Self::from_glove(reader)?,
            _ => {
                let table: EmbeddingTable = bincode::deserialize_from(reader).map_err(|e| {
                    StarsError::Embedding(format!("cannot decode {}: {}", path.display(), e))
                })?;
                Self::new(table.dim, table.vectors)?
            }
        };

        log::info!(
            "Loaded {} embeddings of dimension {} from {}",
            table.len(),
            table.dim,
            path.display()
        );
        Ok(table)
    }

    /// Build a table from a token -> vector map, taking the dimension from `unk`
    pub fn from_map(vectors: HashMap<String, Vec<f32>>) -> Result<Self> {
        let dim = vectors.get(UNK_KEY).map(Vec::len).ok_or_else(|| {
            StarsError::Embedding(format!("table has no {:?} entry", UNK_KEY))
        })?;
        Self::new(dim, vectors)
    }

    /// Parse GloVe text: one `token v1 v2 ...` line per entry
    ///
    /// A zero `unk` vector is added when the file has none.
    pub fn from_glove(reader: impl BufRead) -> Result<Self> {
        let mut vectors = HashMap::new();
        let mut dim = None;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let Some(token) = parts.next() else {
                continue;
            };
            let values = parts
                .map(|v| v.parse::<f32>())
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| {
                    StarsError::Embedding(format!("line {}: {}", line_no + 1, e))
                })?;

            match dim {
                None => dim = Some(values.len()),
                Some(d) if d != values.len() => {
                    return Err(StarsError::Embedding(format!(
                        "line {}: {} values, expected {}",
                        line_no + 1,
                        values.len(),
                        d
                    )))
                }
                _ => {}
            }
            vectors.insert(token.to_lowercase(), values);
        }

        let dim = dim.ok_or_else(|| StarsError::Embedding("empty GloVe file".to_string()))?;
        vectors
            .entry(UNK_KEY.to_string())
            .or_insert_with(|| vec![0.0; dim]);
        Self::new(dim, vectors)
    }

    /// Write the binary format read back by [`EmbeddingTable::load`]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        bincode::serialize_into(writer, self)
            .map_err(|e| StarsError::Embedding(format!("cannot encode table: {}", e)))
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Case-insensitive lookup with `unk` fallback
    pub fn lookup(&self, token: &str) -> &[f32] {
        self.vectors
            .get(&token.to_lowercase())
            .or_else(|| self.vectors.get(UNK_KEY))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Embed a review as a sequence of vectors, one per surviving token
    ///
    /// A review with no tokens left after punctuation stripping becomes a
    /// single `unk` step so the recurrent model always sees one input.
    pub fn embed(&self, review: &Review) -> EmbeddedSequence {
        let tokens = sequence_tokens(review);
        let mut values = Vec::with_capacity(tokens.len().max(1) * self.dim);

        if tokens.is_empty() {
            values.extend_from_slice(self.lookup(UNK_KEY));
        }
        for token in &tokens {
            values.extend_from_slice(self.lookup(token));
        }

        EmbeddedSequence {
            len: tokens.len().max(1),
            dim: self.dim,
            values,
        }
    }
}

/// Remove ASCII punctuation characters
pub fn strip_punctuation(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}

/// Review text with punctuation stripped and whitespace collapsed, case kept
pub fn sequence_text(review: &Review) -> String {
    strip_punctuation(&review.text())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokens the recurrent path sees: punctuation stripped and lowercased
pub fn sequence_tokens(review: &Review) -> Vec<String> {
    sequence_text(review)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Row-major `[len, dim]` embedding sequence
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedSequence {
    len: usize,
    dim: usize,
    values: Vec<f32>,
}

impl EmbeddedSequence {
    /// Number of time steps
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn step(&self, index: usize) -> Option<&[f32]> {
        (index < self.len).then(|| &self.values[index * self.dim..(index + 1) * self.dim])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EmbeddingTable {
        let mut vectors = HashMap::new();
        vectors.insert("good".to_string(), vec![1.0, 0.0, 0.0]);
        vectors.insert("food".to_string(), vec![0.0, 1.0, 0.0]);
        vectors.insert(UNK_KEY.to_string(), vec![0.0, 0.0, 1.0]);
        EmbeddingTable::new(3, vectors).unwrap()
    }

    fn review(text: &str) -> Review {
        Review::from_stars(text, 3).unwrap()
    }

    #[test]
    fn test_strip_punctuation() {
        assert_eq!(strip_punctuation("Great!! (really) good-ish..."), "Great really goodish");
        assert_eq!(strip_punctuation("naïve café"), "naïve café");
    }

    #[test]
    fn test_sequence_tokens() {
        let tokens = sequence_tokens(&review("GOOD food , very good!"));
        assert_eq!(tokens, vec!["good", "food", "very", "good"]);
    }

    #[test]
    fn test_sequence_text_keeps_case() {
        assert_eq!(sequence_text(&review("GOOD food , very good!")), "GOOD food very good");
        assert_eq!(sequence_text(&review("?!")), "");
    }

    #[test]
    fn test_lookup_is_case_insensitive_with_unk_fallback() {
        let table = table();
        assert_eq!(table.lookup("Good"), &[1.0, 0.0, 0.0]);
        assert_eq!(table.lookup("pizza"), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_embed_sequence() {
        let seq = table().embed(&review("Good food, bad service."));

        assert_eq!(seq.len(), 4);
        assert_eq!(seq.dim(), 3);
        assert_eq!(seq.values().len(), 12);
        assert_eq!(seq.step(0), Some(&[1.0, 0.0, 0.0][..]));
        assert_eq!(seq.step(1), Some(&[0.0, 1.0, 0.0][..]));
        assert_eq!(seq.step(2), Some(&[0.0, 0.0, 1.0][..]));
        assert_eq!(seq.step(4), None);
    }

    #[test]
    fn test_punctuation_only_review_embeds_as_unk() {
        let seq = table().embed(&review("!!! ..."));
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.values(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_new_requires_unk() {
        let mut vectors = HashMap::new();
        vectors.insert("good".to_string(), vec![1.0]);
        assert!(matches!(
            EmbeddingTable::new(1, vectors),
            Err(StarsError::Embedding(_))
        ));
    }

    #[test]
    fn test_new_rejects_ragged_vectors() {
        let mut vectors = HashMap::new();
        vectors.insert(UNK_KEY.to_string(), vec![1.0, 2.0]);
        vectors.insert("good".to_string(), vec![1.0]);
        assert!(EmbeddingTable::new(2, vectors).is_err());
    }

    #[test]
    fn test_from_glove_adds_unk() {
        let text = "The 0.1 0.2\ngood 0.3 0.4\n\n";
        let table = EmbeddingTable::from_glove(text.as_bytes()).unwrap();

        assert_eq!(table.dim(), 2);
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup("the"), &[0.1, 0.2]);
        assert_eq!(table.lookup(UNK_KEY), &[0.0, 0.0]);
    }

    #[test]
    fn test_from_glove_rejects_bad_rows() {
        assert!(EmbeddingTable::from_glove("a 0.1 0.2\nb 0.3\n".as_bytes()).is_err());
        assert!(EmbeddingTable::from_glove("a 0.1 x\n".as_bytes()).is_err());
        assert!(EmbeddingTable::from_glove("".as_bytes()).is_err());
    }

    #[test]
    fn test_binary_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("word_embedding.bin");

        table().save(&path).unwrap();
        let loaded = EmbeddingTable::load(&path).unwrap();

        assert_eq!(loaded.dim(), 3);
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.lookup("FOOD"), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_load_json_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emb.json");
        std::fs::write(&path, r#"{"unk": [0.5, 0.5], "tasty": [1.0, -1.0]}"#).unwrap();

        let loaded = EmbeddingTable::load(&path).unwrap();
        assert_eq!(loaded.dim(), 2);
        assert_eq!(loaded.lookup("Tasty"), &[1.0, -1.0]);
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = EmbeddingTable::load(dir.path().join("word_embedding.bin"));
        assert!(matches!(result, Err(StarsError::Embedding(_))));
    }

    #[test]
    fn test_json_table_without_unk_reports_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emb.json");
        std::fs::write(&path, r#"{"tasty": [1.0, -1.0]}"#).unwrap();

        match EmbeddingTable::load(&path) {
            Err(StarsError::Embedding(msg)) => {
                assert!(msg.contains("no \"unk\" entry"), "unexpected error: {}", msg)
            }
            other => panic!("expected an embedding error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_pickled_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("word_embedding.pkl");

        let mut vectors: HashMap<String, Vec<f64>> = HashMap::new();
        vectors.insert("unk".to_string(), vec![0.0, 0.25]);
        vectors.insert("crispy".to_string(), vec![0.5, -0.5]);
        let bytes = serde_pickle::to_vec(&vectors, serde_pickle::SerOptions::new()).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let loaded = EmbeddingTable::load(&path).unwrap();
        assert_eq!(loaded.dim(), 2);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.lookup("Crispy"), &[0.5, -0.5]);
        assert_eq!(loaded.lookup("soggy"), &[0.0, 0.25]);
    }

    #[test]
    fn test_corrupt_pickle_is_embedding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("word_embedding.pkl");
        std::fs::write(&path, b"not a pickle").unwrap();

        assert!(matches!(
            EmbeddingTable::load(&path),
            Err(StarsError::Embedding(_))
        ));
    }
}
