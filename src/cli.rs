//! CLI definition and dispatch.
//!
//! Progress, summaries and errors go to stderr. The per-symbol accuracy rows
//! of `train` are the command's result and go to stdout, one tab-separated
//! `symbol, accuracy, [per-day accuracies]` line per symbol.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{ColumnMap, CsvAdapter};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::gru_predictor::{
    DEFAULT_DROPOUT, DEFAULT_HIDDEN_SIZE, DEFAULT_SEED, GruModel, GruPredictor,
};
use crate::adapters::logistic_predictor::LogisticPredictor;
use crate::domain::accuracy::{AccuracyReport, SymbolAccuracy};
use crate::domain::config_validation::validate_config;
use crate::domain::error::MovecastError;
use crate::domain::sequence_builder::{
    DEFAULT_PREDICTION_HORIZON, DEFAULT_SEQUENCE_LENGTH, DEFAULT_TRAIN_FRACTION, Dataset,
    SequenceConfig,
};
use crate::domain::session::Controller;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::predictor_port::{CancellationToken, EpochLog, Predictor, TrainingOptions};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "movecast", about = "Next-days stock movement predictor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a price CSV and build train/test sequences
    Prepare {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Build sequences, train the model and report per-symbol accuracy
    Train {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        epochs: Option<usize>,
        /// Overrides `[model] kind`
        #[arg(long, value_enum)]
        model: Option<ModelKind>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// GRU encoder with a dense sigmoid head
    Gru,
    /// Logistic regression over the flattened window
    Logistic,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Prepare { input, config } => run_prepare(&input, config.as_deref()),
        Command::Train {
            input,
            config,
            output,
            epochs,
            model,
        } => run_train(&input, config.as_deref(), output.as_deref(), epochs, model),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Load and validate the config at `path`, or an empty config when absent.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, ExitCode> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| report_error(&e))?;
    validate_config(&adapter).map_err(|e| report_error(&e))?;
    Ok(adapter)
}

fn report_error(err: &MovecastError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn build_sequence_config(config: &dyn ConfigPort) -> SequenceConfig {
    SequenceConfig {
        sequence_length: config.get_int(
            "sequence",
            "sequence_length",
            DEFAULT_SEQUENCE_LENGTH as i64,
        ) as usize,
        prediction_horizon: config.get_int(
            "sequence",
            "prediction_horizon",
            DEFAULT_PREDICTION_HORIZON as i64,
        ) as usize,
        train_fraction: config.get_double("sequence", "train_fraction", DEFAULT_TRAIN_FRACTION),
    }
}

pub fn build_training_options(config: &dyn ConfigPort) -> TrainingOptions {
    let defaults = TrainingOptions::default();
    TrainingOptions {
        epochs: config.get_int("training", "epochs", defaults.epochs as i64) as usize,
        batch_size: config.get_int("training", "batch_size", defaults.batch_size as i64) as usize,
        learning_rate: config.get_double("training", "learning_rate", defaults.learning_rate),
    }
}

/// `[model] kind`, defaulting to the GRU.
pub fn model_kind(config: &dyn ConfigPort) -> ModelKind {
    match config.get_string("model", "kind") {
        Some(kind) if kind.trim().eq_ignore_ascii_case("logistic") => ModelKind::Logistic,
        _ => ModelKind::Gru,
    }
}

pub fn build_gru_predictor(config: &dyn ConfigPort) -> GruPredictor {
    GruPredictor::new(
        config.get_int("model", "hidden_size", DEFAULT_HIDDEN_SIZE as i64) as usize,
        config.get_double("model", "dropout", DEFAULT_DROPOUT),
        config
            .get_string("model", "seed")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_SEED),
    )
}

fn run_prepare(input: &Path, config_path: Option<&Path>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_port = CsvAdapter::new(input.to_path_buf(), ColumnMap::from_config(&config));

    eprintln!("Reading prices from {}", input.display());
    let rows = match data_port.load_rows() {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };
    let mut controller: Controller<GruModel> = Controller::new();
    match controller.load(&rows, &build_sequence_config(&config)) {
        Ok(session) => {
            print_dataset_summary(rows.len(), session.dataset());
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

fn run_train(
    input: &Path,
    config_path: Option<&Path>,
    output_path: Option<&Path>,
    epochs_override: Option<usize>,
    model_override: Option<ModelKind>,
) -> ExitCode {
    // Stage 1: Load config
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let mut options = build_training_options(&config);
    if let Some(epochs) = epochs_override {
        if epochs == 0 {
            eprintln!("error: --epochs must be at least 1");
            return ExitCode::from(2);
        }
        options.epochs = epochs;
    }

    // Stage 2: Resolve data source and report destination
    eprintln!("Reading prices from {}", input.display());
    let data_port = CsvAdapter::new(input.to_path_buf(), ColumnMap::from_config(&config));
    let output = output_path
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output_path").map(PathBuf::from));
    let reporter = CsvReportAdapter::new(config.get_bool("report", "include_offsets", true));

    // Stages 3-6: Pipeline
    let sequence_config = build_sequence_config(&config);
    let report_to = output.as_deref().map(|p| (&reporter as &dyn ReportPort, p));
    let result = match model_override.unwrap_or_else(|| model_kind(&config)) {
        ModelKind::Gru => {
            let predictor = build_gru_predictor(&config);
            eprintln!(
                "Model: GRU, {} hidden units, dropout {}, seed {}",
                predictor.hidden_size, predictor.dropout, predictor.seed
            );
            run_pipeline(&data_port, &predictor, &sequence_config, &options, report_to)
        }
        ModelKind::Logistic => {
            eprintln!("Model: logistic baseline");
            run_pipeline(
                &data_port,
                &LogisticPredictor::new(),
                &sequence_config,
                &options,
                report_to,
            )
        }
    };
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

/// Load rows, build sequences, train, evaluate, and optionally write a report.
pub fn run_pipeline<P: Predictor>(
    data_port: &dyn DataPort,
    predictor: &P,
    sequence_config: &SequenceConfig,
    options: &TrainingOptions,
    report_to: Option<(&dyn ReportPort, &Path)>,
) -> Result<AccuracyReport, MovecastError> {
    // Stage 3: Parse rows
    let rows = data_port.load_rows()?;

    // Stage 4: Build sequences
    let mut controller: Controller<P::Model> = Controller::new();
    let session = controller.load(&rows, sequence_config)?;
    print_dataset_summary(rows.len(), session.dataset());

    // Stage 5: Train and evaluate
    eprintln!(
        "\nTraining: {} epochs, batch size {}, learning rate {}",
        options.epochs, options.batch_size, options.learning_rate
    );
    let report = session
        .train(
            predictor,
            options,
            &mut print_epoch,
            &CancellationToken::new(),
        )?
        .clone();
    print_accuracy(&report);

    // Stage 6: Write report
    if let Some((reporter, path)) = report_to {
        reporter.write(&report, &path.to_string_lossy())?;
        eprintln!("\nReport written to: {}", path.display());
    }
    controller.dispose();
    Ok(report)
}

fn print_epoch(log: &EpochLog) {
    match (log.val_loss, log.val_accuracy) {
        (Some(val_loss), Some(val_accuracy)) => eprintln!(
            "  epoch {:>3}: loss {:.4}  acc {:.1}%  val_loss {:.4}  val_acc {:.1}%",
            log.epoch,
            log.loss,
            log.accuracy * 100.0,
            val_loss,
            val_accuracy * 100.0
        ),
        _ => eprintln!(
            "  epoch {:>3}: loss {:.4}  acc {:.1}%",
            log.epoch,
            log.loss,
            log.accuracy * 100.0
        ),
    }
}

fn print_dataset_summary(row_count: usize, dataset: &Dataset) {
    eprintln!("\n=== Dataset ===");
    eprintln!("Rows:             {}", row_count);
    eprintln!("Symbols:          {}", dataset.symbols.join(", "));
    eprintln!(
        "Train windows:    {}  x{:?} y{:?}",
        dataset.train_len(),
        dataset.x_train.shape(),
        dataset.y_train.shape()
    );
    eprintln!(
        "Test windows:     {}  x{:?} y{:?}",
        dataset.test_len(),
        dataset.x_test.shape(),
        dataset.y_test.shape()
    );
    if let (Some(first), Some(last)) = (dataset.train_windows.first(), dataset.test_windows.last())
    {
        eprintln!("Span:             {} to {}", first.first_input, last.last_target);
    }
}

fn print_accuracy(report: &AccuracyReport) {
    if report.is_empty() {
        eprintln!("\nNo test windows to evaluate");
        return;
    }
    eprintln!("\n=== Test Accuracy ({} windows) ===", report.samples);
    for entry in &report.symbols {
        println!("{}", format_accuracy_row(entry));
    }
    eprintln!("Overall:          {:.1}%", report.overall * 100.0);
}

/// One stdout result line: `symbol<TAB>accuracy%<TAB>[day_1% day_2% ...]`.
pub fn format_accuracy_row(entry: &SymbolAccuracy) -> String {
    let days: Vec<String> = entry
        .by_offset
        .iter()
        .map(|a| format!("{:.0}%", a * 100.0))
        .collect();
    format!(
        "{}\t{:.1}%\t[{}]",
        entry.symbol,
        entry.accuracy * 100.0,
        days.join(" ")
    )
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(Some(config_path)) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let columns = ColumnMap::from_config(&config);
    let sequence = build_sequence_config(&config);
    let training = build_training_options(&config);

    eprintln!("\nColumns:");
    eprintln!(
        "  date={} symbol={} open={} close={}",
        columns.date, columns.symbol, columns.open, columns.close
    );
    eprintln!("\nSequence:");
    eprintln!("  sequence_length:    {}", sequence.sequence_length);
    eprintln!("  prediction_horizon: {}", sequence.prediction_horizon);
    eprintln!("  train_fraction:     {}", sequence.train_fraction);
    eprintln!("\nTraining:");
    eprintln!("  epochs:             {}", training.epochs);
    eprintln!("  batch_size:         {}", training.batch_size);
    eprintln!("  learning_rate:      {}", training.learning_rate);
    eprintln!("\nModel:");
    match model_kind(&config) {
        ModelKind::Gru => {
            let gru = build_gru_predictor(&config);
            eprintln!("  kind:               gru");
            eprintln!("  hidden_size:        {}", gru.hidden_size);
            eprintln!("  dropout:            {}", gru.dropout);
            eprintln!("  seed:               {}", gru.seed);
        }
        ModelKind::Logistic => eprintln!("  kind:               logistic"),
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
