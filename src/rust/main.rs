use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use spamsieve::{
    run_pipeline, ArtifactError, ArtifactStore, Label, PipelineConfig, SpamDetector, TextEncoding,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train on a labelled corpus, print the evaluation and save the artifacts
    Train(TrainArgs),
    /// Classify one or more messages with saved artifacts
    Predict(PredictArgs),
    /// Show the evaluation report saved with the artifacts
    Report(ReportArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Headerless `label,text` CSV file
    #[arg(long)]
    data: Option<PathBuf>,
    /// Encoding of the corpus (latin1 or utf8)
    #[arg(long)]
    encoding: Option<TextEncoding>,
    /// Directory the artifacts are written to
    #[arg(long)]
    artifacts: Option<PathBuf>,
    /// Seed for the train/test split
    #[arg(long)]
    seed: Option<u64>,
    /// Fraction of records held out for evaluation
    #[arg(long)]
    test_size: Option<f64>,
    /// Maximum vocabulary size
    #[arg(long)]
    max_features: Option<usize>,
    /// Additive smoothing for naive Bayes
    #[arg(long)]
    alpha: Option<f64>,
}

#[derive(Args)]
struct PredictArgs {
    /// Directory holding the trained artifacts
    #[arg(long)]
    artifacts: Option<PathBuf>,
    /// Print predictions as JSON lines
    #[arg(long)]
    json: bool,
    /// Messages to classify
    #[arg(required = true)]
    texts: Vec<String>,
}

#[derive(Args)]
struct ReportArgs {
    /// Directory holding the trained artifacts
    #[arg(long)]
    artifacts: Option<PathBuf>,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    spamsieve::init_logger();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Train(args) => train(args),
        Command::Predict(args) => predict(args),
        Command::Report(args) => report(args),
    }
}

fn train(args: TrainArgs) -> Result<()> {
    let mut config = PipelineConfig::from_env().context("Invalid environment configuration")?;
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(encoding) = args.encoding {
        config.encoding = encoding;
    }
    if let Some(dir) = args.artifacts {
        config.artifacts_dir = dir;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(test_size) = args.test_size {
        config.test_size = test_size;
    }
    if let Some(max_features) = args.max_features {
        config.max_features = max_features;
    }
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }

    let start_time = Instant::now();
    let report = run_pipeline(&config)
        .with_context(|| format!("Training on {:?} failed", config.data_path))?;
    info!("Training took {:.2?}", start_time.elapsed());

    println!("{}", report);
    println!();
    println!("Model and vectorizer saved to {:?}", config.artifacts_dir);
    Ok(())
}

fn artifacts_dir(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(ArtifactStore::get_default_dir)
}

fn not_trained(dir: &Path, err: ArtifactError) -> anyhow::Error {
    match err {
        ArtifactError::NotFound(path) => anyhow!(
            "Model or vectorizer not found ({:?} is missing). Run `spamsieve_bin train` first to create the artifacts in {:?}.",
            path,
            dir
        ),
        other => anyhow::Error::new(other).context(format!("Failed to load artifacts from {:?}", dir)),
    }
}

fn predict(args: PredictArgs) -> Result<()> {
    let dir = artifacts_dir(args.artifacts);
    let detector = SpamDetector::shared(&dir).map_err(|e| not_trained(&dir, e))?;

    for text in &args.texts {
        let prediction = detector
            .classify(text)
            .with_context(|| format!("Could not classify {:?}", text))?;
        if args.json {
            println!(
                "{}",
                serde_json::json!({
                    "text": text,
                    "label": prediction.label,
                    "code": prediction.label.code(),
                    "spam_probability": prediction.spam_probability,
                })
            );
        } else {
            let verdict = match prediction.label {
                Label::Spam => "SPAM",
                Label::Ham => "HAM",
            };
            println!(
                "{:<4} (spam probability {:>5.1}%)  {}",
                verdict,
                prediction.spam_probability * 100.0,
                text
            );
        }
    }
    Ok(())
}

fn report(args: ReportArgs) -> Result<()> {
    let dir = artifacts_dir(args.artifacts);
    let report = ArtifactStore::new(&dir)
        .load_current_report()
        .with_context(|| format!("Failed to read the evaluation report in {:?}", dir))?
        .ok_or_else(|| {
            anyhow!(
                "No evaluation report for the artifacts in {:?}. Run `spamsieve_bin train` first.",
                dir
            )
        })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
        println!();
        println!(
            "Trained on {} messages, evaluated on {}, vocabulary of {} terms",
            report.train_size, report.test_size, report.vocabulary_size
        );
    }
    Ok(())
}
