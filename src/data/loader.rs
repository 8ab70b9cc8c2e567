//! JSON review loading

use std::path::Path;

use serde::Deserialize;

use crate::{Result, Review, StarsError, NUM_CLASSES};

/// One entry of the input JSON array
#[derive(Debug, Deserialize)]
struct RawReview {
    text: String,
    /// Integer or float rating; fractional parts are truncated
    stars: f64,
}

impl RawReview {
    fn into_review(self) -> Result<Review> {
        let stars = self.stars.trunc();
        if !(0.0..=u8::MAX as f64).contains(&stars) {
            return Err(StarsError::Data(format!(
                "stars must be between 1 and {}, got {}",
                NUM_CLASSES, self.stars
            )));
        }
        Review::from_stars(&self.text, stars as u8)
    }
}

/// Load a JSON array of `{"text": ..., "stars": 1-5}` objects
pub fn load_reviews(path: impl AsRef<Path>) -> Result<Vec<Review>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        StarsError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;

    let raw: Vec<RawReview> = serde_json::from_str(&content)?;
    raw.into_iter()
        .map(RawReview::into_review)
        .collect()
}

/// Load the training and validation splits
pub fn load_data(
    train_path: impl AsRef<Path>,
    val_path: impl AsRef<Path>,
) -> Result<(Vec<Review>, Vec<Review>)> {
    let train = load_reviews(train_path)?;
    let val = load_reviews(val_path)?;
    log::info!(
        "Loaded {} training and {} validation reviews",
        train.len(),
        val.len()
    );
    Ok((train, val))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_json(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_reviews() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            &dir,
            "train.json",
            r#"[{"text": "Loved it!  Would return", "stars": 5},
                {"text": "meh", "stars": 1, "useful": 3}]"#,
        );

        let reviews = load_reviews(&path).unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].tokens, vec!["Loved", "it!", "Would", "return"]);
        assert_eq!(reviews[0].label, 4);
        assert_eq!(reviews[1].label, 0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_reviews(dir.path().join("absent.json"));
        assert!(matches!(result, Err(StarsError::Io(_))));
    }

    #[test]
    fn test_missing_field_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(&dir, "bad.json", r#"[{"text": "no rating"}]"#);
        assert!(matches!(load_reviews(&path), Err(StarsError::Json(_))));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(&dir, "bad.json", r#"[{"text": "x", "stars": 3"#);
        assert!(matches!(load_reviews(&path), Err(StarsError::Json(_))));
    }

    #[test]
    fn test_out_of_range_stars() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(&dir, "bad.json", r#"[{"text": "x", "stars": 7}]"#);
        assert!(matches!(load_reviews(&path), Err(StarsError::Data(_))));
    }

    #[test]
    fn test_float_stars_are_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            &dir,
            "float.json",
            r#"[{"text": "great food", "stars": 5.0},
                {"text": "so-so", "stars": 2.7}]"#,
        );

        let reviews = load_reviews(&path).unwrap();
        assert_eq!(reviews[0].label, 4);
        assert_eq!(reviews[1].label, 1);
    }

    #[test]
    fn test_out_of_range_float_stars() {
        let dir = tempfile::tempdir().unwrap();
        for stars in ["0.5", "6.0", "-3", "1e9"] {
            let content = format!(r#"[{{"text": "x", "stars": {}}}]"#, stars);
            let path = write_json(&dir, "bad.json", &content);
            assert!(
                matches!(load_reviews(&path), Err(StarsError::Data(_))),
                "stars {} accepted",
                stars
            );
        }
    }

    #[test]
    fn test_load_data_both_splits() {
        let dir = tempfile::tempdir().unwrap();
        let train = write_json(&dir, "train.json", r#"[{"text": "a b", "stars": 2}]"#);
        let val = write_json(
            &dir,
            "val.json",
            r#"[{"text": "c", "stars": 3}, {"text": "d", "stars": 4}]"#,
        );

        let (train, val) = load_data(&train, &val).unwrap();
        assert_eq!(train.len(), 1);
        assert_eq!(val.len(), 2);
        assert_eq!(val[1].label, 3);
    }
}
