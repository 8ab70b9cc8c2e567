//! Results and error-sample files written at the end of a run
//!
//! Output directories are expected to exist already; any write failure is
//! returned to the caller.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::training::{ErrorSamples, TrainingHistory, TrainingOutcome};
use crate::{ModelKind, OutputConfig, Result};

/// Command-line settings echoed at the top of a results file
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub hidden_dim: usize,
    pub train_data: String,
    pub val_data: String,
    pub test_data: Option<String>,
}

/// Writes the two report files for one model kind
pub struct Reporter {
    kind: ModelKind,
    results_path: PathBuf,
    error_samples_path: PathBuf,
}

impl Reporter {
    pub fn new(kind: ModelKind, output: &OutputConfig) -> Self {
        Reporter {
            kind,
            results_path: output.results_path(kind),
            error_samples_path: output.error_samples_path(kind),
        }
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    pub fn error_samples_path(&self) -> &Path {
        &self.error_samples_path
    }

    /// Write both files for a finished run
    pub fn write<M>(&self, summary: &RunSummary, outcome: &TrainingOutcome<M>) -> Result<()> {
        write_file(&self.error_samples_path, |out| match self.kind {
            ModelKind::Ffnn => write_ffnn_errors(out, &outcome.train_errors, &outcome.val_errors),
            ModelKind::Rnn => write_rnn_errors(out, &outcome.val_errors),
        })?;
        log::info!("Error samples written to {}", self.error_samples_path.display());

        write_file(&self.results_path, |out| match self.kind {
            ModelKind::Ffnn => write_ffnn_results(out, summary, &outcome.history),
            ModelKind::Rnn => {
                let final_train = outcome
                    .early_stopping
                    .map(|stopper| stopper.last_train_accuracy())
                    .or_else(|| outcome.history.train_accuracies.last().copied())
                    .unwrap_or(0.0);
                write_rnn_results(out, summary, &outcome.history, final_train)
            }
        })?;
        log::info!("Results written to {}", self.results_path.display());

        Ok(())
    }
}

fn write_file(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        std::io::Error::new(e.kind(), format!("cannot create {}: {}", path.display(), e))
    })?;
    let mut out = BufWriter::new(file);
    body(&mut out)?;
    out.flush()?;
    Ok(())
}

fn write_header(out: &mut impl Write, summary: &RunSummary, epochs: usize) -> std::io::Result<()> {
    writeln!(out, "Training Results:")?;
    writeln!(out, "Number of epochs: {}", epochs)?;
    writeln!(out, "Hidden dimension: {}", summary.hidden_dim)?;
    writeln!(out, "Training data: {}", summary.train_data)?;
    writeln!(out, "Validation data: {}", summary.val_data)?;
    if let Some(test_data) = &summary.test_data {
        writeln!(out, "Test data: {}", test_data)?;
    }
    Ok(())
}

/// Feed-forward error file: training misses, then validation misses
pub fn write_ffnn_errors(
    out: &mut impl Write,
    train_errors: &ErrorSamples,
    val_errors: &ErrorSamples,
) -> std::io::Result<()> {
    writeln!(out, "Training Errors:")?;
    for sample in train_errors.iter() {
        write!(
            out,
            "Text: {}\nGold: {}, Pred: {}\n\n",
            sample.text, sample.gold, sample.predicted
        )?;
    }

    writeln!(out, "\nValidation Errors:")?;
    for sample in val_errors.iter() {
        write!(
            out,
            "Text: {}\nGold: {}, Pred: {}\n\n",
            sample.text, sample.gold, sample.predicted
        )?;
    }
    Ok(())
}

/// Recurrent error file: every validation miss across all epochs
pub fn write_rnn_errors(out: &mut impl Write, val_errors: &ErrorSamples) -> std::io::Result<()> {
    for sample in val_errors.iter() {
        write!(
            out,
            "Input: {}\nGold Label: {}\nPredicted Label: {}\n\n",
            sample.text, sample.gold, sample.predicted
        )?;
    }
    Ok(())
}

pub fn write_ffnn_results(
    out: &mut impl Write,
    summary: &RunSummary,
    history: &TrainingHistory,
) -> std::io::Result<()> {
    write_header(out, summary, history.epochs())?;

    writeln!(out, "\nPer-epoch Results:")?;
    for epoch in 0..history.epochs() {
        writeln!(out, "\nEpoch {}:", epoch + 1)?;
        writeln!(out, "Training accuracy: {}", history.train_accuracies[epoch])?;
        writeln!(out, "Training time: {}", history.train_times[epoch])?;
        writeln!(out, "Validation accuracy: {}", history.val_accuracies[epoch])?;
        writeln!(out, "Validation time: {}", history.val_times[epoch])?;
    }
    Ok(())
}

/// Recurrent results, ending with the best validation and final training accuracy
pub fn write_rnn_results(
    out: &mut impl Write,
    summary: &RunSummary,
    history: &TrainingHistory,
    final_train_accuracy: f64,
) -> std::io::Result<()> {
    write_header(out, summary, history.epochs())?;

    writeln!(out, "\nEpoch-wise Results:")?;
    for epoch in 0..history.epochs() {
        writeln!(out, "\nEpoch {}:", epoch + 1)?;
        writeln!(out, "  Training accuracy: {:.4}", history.train_accuracies[epoch])?;
        writeln!(out, "  Training loss: {:.4}", history.train_losses[epoch])?;
        writeln!(out, "  Training time: {:.2}s", history.train_times[epoch])?;
        writeln!(out, "  Validation accuracy: {:.4}", history.val_accuracies[epoch])?;
        writeln!(out, "  Validation time: {:.2}s", history.val_times[epoch])?;
    }

    writeln!(out, "\nBest Results:")?;
    writeln!(
        out,
        "Highest validation accuracy: {:.4}",
        history.best_val_accuracy().unwrap_or(0.0)
    )?;
    writeln!(out, "Final training accuracy: {:.4}", final_train_accuracy)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{EarlyStopping, Metrics};
    use crate::StarsError;

    fn summary(test_data: Option<&str>) -> RunSummary {
        RunSummary {
            hidden_dim: 32,
            train_data: "training.json".to_string(),
            val_data: "validation.json".to_string(),
            test_data: test_data.map(str::to_string),
        }
    }

    fn metrics(correct: usize, total: usize) -> Metrics {
        let mut metrics = Metrics::new();
        for i in 0..total {
            metrics.record(if i < correct { 0 } else { 1 }, 0);
        }
        metrics
    }

    fn history(epochs: &[((usize, usize), (usize, usize))]) -> TrainingHistory {
        let mut history = TrainingHistory::new();
        for &((tc, tt), (vc, vt)) in epochs {
            history.record_epoch(&metrics(tc, tt), &metrics(vc, vt));
        }
        history
    }

    fn render(body: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        body(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_ffnn_error_file_layout() {
        let mut train = ErrorSamples::unbounded();
        train.push("too salty", 1, 3);
        let mut val = ErrorSamples::unbounded();
        val.push("loved it", 4, 2);

        let text = render(|out| write_ffnn_errors(out, &train, &val));
        assert_eq!(
            text,
            "Training Errors:\nText: too salty\nGold: 1, Pred: 3\n\n\
             \nValidation Errors:\nText: loved it\nGold: 4, Pred: 2\n\n"
        );
    }

    #[test]
    fn test_rnn_error_file_layout() {
        let mut val = ErrorSamples::unbounded();
        val.push("cold fries", 0, 2);

        let text = render(|out| write_rnn_errors(out, &val));
        assert_eq!(text, "Input: cold fries\nGold Label: 0\nPredicted Label: 2\n\n");
    }

    #[test]
    fn test_ffnn_results_layout() {
        let history = history(&[((3, 4), (1, 2))]);
        let text = render(|out| write_ffnn_results(out, &summary(None), &history));

        assert!(text.starts_with(
            "Training Results:\nNumber of epochs: 1\nHidden dimension: 32\n\
             Training data: training.json\nValidation data: validation.json\n\
             \nPer-epoch Results:\n\nEpoch 1:\nTraining accuracy: 0.75\n"
        ));
        assert!(text.contains("Validation accuracy: 0.5\n"));
        assert!(!text.contains("Test data"));
    }

    #[test]
    fn test_rnn_results_best_section() {
        let history = history(&[((7, 10), (13, 20)), ((15, 20), (17, 25)), ((4, 5), (3, 5))]);
        let text = render(|out| write_rnn_results(out, &summary(Some("test.json")), &history, 0.75));

        assert!(text.contains("Number of epochs: 3\n"));
        assert!(text.contains("Test data: test.json\n"));
        assert!(text.contains("\nEpoch-wise Results:\n\nEpoch 1:\n  Training accuracy: 0.7000\n"));
        assert!(text.ends_with(
            "\nBest Results:\nHighest validation accuracy: 0.6800\nFinal training accuracy: 0.7500\n"
        ));
    }

    #[test]
    fn test_reporter_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            error_samples_dir: dir.path().to_string_lossy().into_owned(),
            results_dir: dir.path().to_string_lossy().into_owned(),
            error_sample_limit: 10,
        };
        let mut val_errors = ErrorSamples::unbounded();
        val_errors.push("meh", 2, 4);
        let outcome = TrainingOutcome {
            model: (),
            history: history(&[((1, 2), (1, 2))]),
            train_errors: ErrorSamples::bounded(0),
            val_errors,
            early_stopping: Some(EarlyStopping::new()),
        };

        let reporter = Reporter::new(ModelKind::Rnn, &output);
        reporter.write(&summary(None), &outcome).unwrap();

        let errors = std::fs::read_to_string(reporter.error_samples_path()).unwrap();
        assert!(errors.starts_with("Input: meh\n"));
        let results = std::fs::read_to_string(reporter.results_path()).unwrap();
        assert!(results.contains("Highest validation accuracy: 0.5000\n"));
    }

    #[test]
    fn test_missing_output_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let output = OutputConfig {
            error_samples_dir: missing.to_string_lossy().into_owned(),
            results_dir: missing.to_string_lossy().into_owned(),
            error_sample_limit: 10,
        };
        let outcome = TrainingOutcome {
            model: (),
            history: TrainingHistory::new(),
            train_errors: ErrorSamples::unbounded(),
            val_errors: ErrorSamples::unbounded(),
            early_stopping: None,
        };

        let result = Reporter::new(ModelKind::Ffnn, &output).write(&summary(None), &outcome);
        assert!(matches!(result, Err(StarsError::Io(_))));
    }
}
