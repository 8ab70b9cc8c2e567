//! Star-rating classifier CLI
//!
//! Trains a feed-forward or recurrent review classifier and writes its
//! per-epoch results and misclassified reviews.

use clap::{Args, Parser, Subcommand};
use stars::{Config, Result};

#[derive(Parser)]
#[command(name = "stars")]
#[command(about = "Predict review star ratings with FFNN and RNN classifiers", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments shared by both training commands
#[derive(Args)]
struct RunArgs {
    /// Hidden layer width
    #[arg(long = "hidden_dim")]
    hidden_dim: usize,
    /// Path to the training reviews (JSON)
    #[arg(long = "train_data")]
    train_data: String,
    /// Path to the validation reviews (JSON)
    #[arg(long = "val_data")]
    val_data: String,
    /// Path to test reviews, echoed in the results file
    #[arg(long = "test_data")]
    test_data: Option<String>,
    /// Accepted for compatibility; training always runs
    #[arg(long = "do_train")]
    do_train: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the bag-of-words feed-forward model
    Ffnn {
        #[command(flatten)]
        run: RunArgs,
        /// Number of epochs to train
        #[arg(short, long)]
        epochs: usize,
    },
    /// Train the word-embedding recurrent model until early stopping
    Rnn {
        #[command(flatten)]
        run: RunArgs,
        /// Accepted for compatibility; early stopping decides the epoch count
        #[arg(short, long)]
        epochs: Option<usize>,
        /// Embedding table path (overrides rnn.embedding_path)
        #[arg(long)]
        embeddings: Option<String>,
    },
    /// Convert a GloVe text file into a binary embedding table
    ConvertEmbeddings {
        /// GloVe text file
        #[arg(long)]
        input: String,
        /// Output table path
        #[arg(long)]
        output: String,
    },
    /// Write a default config and create the output directories
    Init,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config, falling back to defaults when the file is absent
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Ffnn { run, epochs } => commands::train_ffnn(&config, &run, epochs),
        Commands::Rnn {
            run,
            epochs,
            embeddings,
        } => {
            if epochs.is_some() {
                log::debug!("--epochs is ignored for the RNN; early stopping ends training");
            }
            commands::train_rnn(&config, &run, embeddings)
        }
        Commands::ConvertEmbeddings { input, output } => {
            commands::convert_embeddings(&input, &output)
        }
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use stars::data::{
        build_vocabulary, load_data, sequence_text, EmbeddingTable, ReviewDataset, Vocabulary,
    };
    use stars::model::{FFNNConfig, RNNConfig};
    use stars::report::{Reporter, RunSummary};
    use stars::training::{FFNNTrainer, RNNTrainer};
    use stars::{ModelKind, StarsError};

    type MyBackend = NdArray<f32>;
    type MyAutodiffBackend = Autodiff<MyBackend>;

    fn summary(run: &RunArgs) -> RunSummary {
        if run.do_train {
            log::debug!("--do_train set");
        }
        RunSummary {
            hidden_dim: run.hidden_dim,
            train_data: run.train_data.clone(),
            val_data: run.val_data.clone(),
            test_data: run.test_data.clone(),
        }
    }

    pub fn train_ffnn(config: &Config, run: &RunArgs, epochs: usize) -> Result<()> {
        println!("========== Loading data ==========");
        let (train_reviews, val_reviews) = load_data(&run.train_data, &run.val_data)?;

        println!("========== Vectorizing data ==========");
        let vocab = Vocabulary::build_index(build_vocabulary(&train_reviews));
        log::info!("Vocabulary size: {} (including unknown)", vocab.len());
        let train = ReviewDataset::from_reviews(&train_reviews, |r| vocab.vectorize(r));
        let val = ReviewDataset::from_reviews(&val_reviews, |r| vocab.vectorize(r));

        let device = Default::default();
        let trainer = FFNNTrainer::<MyAutodiffBackend>::new(
            device,
            FFNNConfig {
                input_dim: vocab.len(),
                hidden_dim: run.hidden_dim,
            },
            &config.ffnn,
            config.training.minibatch_size,
            config.output.error_sample_limit,
        );

        println!("========== Training for {} epochs ==========", epochs);
        let outcome = trainer.train(train, val, epochs)?;

        let reporter = Reporter::new(ModelKind::Ffnn, &config.output);
        println!(
            "========== Writing results to {} ==========",
            reporter.results_path().display()
        );
        reporter.write(&summary(run), &outcome)?;

        if let Some(best) = outcome.history.best_val_accuracy() {
            println!("Best validation accuracy: {:.4}", best);
        }
        Ok(())
    }

    pub fn train_rnn(config: &Config, run: &RunArgs, embeddings: Option<String>) -> Result<()> {
        println!("========== Loading data ==========");
        let (train_reviews, val_reviews) = load_data(&run.train_data, &run.val_data)?;

        let embedding_path = embeddings.unwrap_or_else(|| config.rnn.embedding_path.clone());
        log::info!("Loading word embeddings from {}", embedding_path);
        let table = EmbeddingTable::load(&embedding_path)?;
        if table.dim() != config.rnn.embedding_dim {
            return Err(StarsError::Embedding(format!(
                "{} holds {}-dimensional vectors but rnn.embedding_dim is {}",
                embedding_path,
                table.dim(),
                config.rnn.embedding_dim
            )));
        }

        println!("========== Vectorizing data ==========");
        let train =
            ReviewDataset::from_reviews_with_text(&train_reviews, sequence_text, |r| table.embed(r));
        let val =
            ReviewDataset::from_reviews_with_text(&val_reviews, sequence_text, |r| table.embed(r));

        let device = Default::default();
        let trainer = RNNTrainer::<MyAutodiffBackend>::new(
            device,
            RNNConfig {
                input_dim: table.dim(),
                hidden_size: run.hidden_dim,
            },
            &config.rnn,
            config.training.minibatch_size,
        );

        println!("========== Training until validation accuracy stops improving ==========");
        let outcome = trainer.train(train, val)?;

        let reporter = Reporter::new(ModelKind::Rnn, &config.output);
        println!(
            "========== Writing results to {} ==========",
            reporter.results_path().display()
        );
        reporter.write(&summary(run), &outcome)?;

        println!("Trained for {} epochs", outcome.history.epochs());
        Ok(())
    }

    pub fn convert_embeddings(input: &str, output: &str) -> Result<()> {
        println!("Reading GloVe vectors from {}...", input);
        let file = std::fs::File::open(input).map_err(|e| {
            StarsError::Embedding(format!("cannot open {}: {}", input, e))
        })?;
        let table = EmbeddingTable::from_glove(std::io::BufReader::new(file))?;
        table.save(output)?;
        println!(
            "Wrote {} vectors of dimension {} to {}",
            table.len(),
            table.dim(),
            output
        );
        Ok(())
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created config at {}", config_path);

        std::fs::create_dir_all(&config.output.error_samples_dir)?;
        std::fs::create_dir_all(&config.output.results_dir)?;
        println!(
            "Created {}/ and {}/ directories",
            config.output.error_samples_dir, config.output.results_dir
        );

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!(
            "  2. Run 'stars convert-embeddings --input glove.txt --output {}'",
            config.rnn.embedding_path
        );
        println!("  3. Run 'stars ffnn --hidden_dim 32 --epochs 10 --train_data training.json --val_data validation.json'");
        println!("  4. Run 'stars rnn --hidden_dim 32 --train_data training.json --val_data validation.json'");

        Ok(())
    }
}
