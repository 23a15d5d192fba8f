//! CLI integration tests.
//!
//! Tests cover:
//! - Argument parsing for every subcommand
//! - Config parsing (build_sequence_config, build_training_options)
//! - Config loading and validation with real INI files on disk
//! - `train` end to end with CSV and INI files in a temp directory

mod common;

use clap::Parser;
use common::*;
use movecast::adapters::file_config_adapter::FileConfigAdapter;
use movecast::cli::{self, Cli, Command, ModelKind};
use movecast::domain::accuracy::SymbolAccuracy;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[columns]
date = Day
symbol = Ticker
open = Open
close = Adj Close

[sequence]
sequence_length = 10
prediction_horizon = 2
train_fraction = 0.75

[training]
epochs = 8
batch_size = 4
learning_rate = 0.25

[model]
hidden_size = 8
dropout = 0.1
seed = 11

[report]
include_offsets = false
"#;

mod argument_parsing {
    use super::*;

    #[test]
    fn train_with_all_flags() {
        let cli = Cli::try_parse_from([
            "movecast", "train", "-i", "prices.csv", "-c", "run.ini", "-o", "out.csv",
            "--epochs", "5", "--model", "logistic",
        ])
        .unwrap();
        match cli.command {
            Command::Train {
                input,
                config,
                output,
                epochs,
                model,
            } => {
                assert_eq!(input, PathBuf::from("prices.csv"));
                assert_eq!(config, Some(PathBuf::from("run.ini")));
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert_eq!(epochs, Some(5));
                assert_eq!(model, Some(ModelKind::Logistic));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn prepare_requires_input() {
        assert!(Cli::try_parse_from(["movecast", "prepare"]).is_err());
        let cli = Cli::try_parse_from(["movecast", "prepare", "--input", "p.csv"]).unwrap();
        assert!(matches!(cli.command, Command::Prepare { config: None, .. }));
    }

    #[test]
    fn unknown_model_is_rejected() {
        let result =
            Cli::try_parse_from(["movecast", "train", "-i", "p.csv", "--model", "transformer"]);
        assert!(result.is_err());
    }

    #[test]
    fn validate_requires_config() {
        assert!(Cli::try_parse_from(["movecast", "validate"]).is_err());
        assert!(Cli::try_parse_from(["movecast", "validate", "-c", "x.ini"]).is_ok());
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn build_sequence_config_from_ini() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_sequence_config(&adapter);
        assert_eq!(config.sequence_length, 10);
        assert_eq!(config.prediction_horizon, 2);
        assert!((config.train_fraction - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn build_sequence_config_uses_defaults() {
        let config = cli::build_sequence_config(&FileConfigAdapter::empty());
        assert_eq!(config.sequence_length, 12);
        assert_eq!(config.prediction_horizon, 3);
        assert!((config.train_fraction - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn build_training_options_from_ini() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let options = cli::build_training_options(&adapter);
        assert_eq!(options.epochs, 8);
        assert_eq!(options.batch_size, 4);
        assert!((options.learning_rate - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn model_settings_from_ini() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert_eq!(cli::model_kind(&adapter), ModelKind::Gru);
        let gru = cli::build_gru_predictor(&adapter);
        assert_eq!(gru.hidden_size, 8);
        assert!((gru.dropout - 0.1).abs() < f64::EPSILON);
        assert_eq!(gru.seed, 11);

        let adapter = FileConfigAdapter::from_string("[model]\nkind = logistic\n").unwrap();
        assert_eq!(cli::model_kind(&adapter), ModelKind::Logistic);
    }

    #[test]
    fn model_defaults_to_gru() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(cli::model_kind(&adapter), ModelKind::Gru);
        let gru = cli::build_gru_predictor(&adapter);
        assert_eq!(gru.hidden_size, 32);
        assert_eq!(gru.seed, 42);
    }

    #[test]
    fn load_config_without_path_is_empty() {
        let adapter = cli::load_config(None).unwrap();
        assert_eq!(cli::build_training_options(&adapter).epochs, 20);
    }

    #[test]
    fn load_config_reads_valid_file() {
        let file = write_temp_ini(VALID_INI);
        assert!(cli::load_config(Some(file.path())).is_ok());
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let file = write_temp_ini("[sequence]\ntrain_fraction = 1.5\n");
        assert!(cli::load_config(Some(file.path())).is_err());
    }

    #[test]
    fn load_config_missing_file_fails() {
        let missing = PathBuf::from("/nonexistent/movecast.ini");
        assert!(cli::load_config(Some(missing.as_path())).is_err());
    }
}

mod end_to_end {
    use super::*;

    #[test]
    fn train_writes_report_with_configured_columns() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("prices.csv");
        let report_path = dir.path().join("accuracy.csv");

        let mut text = String::from("Day,Ticker,Open,Adj Close,Volume\n");
        for r in generate_rows("AAPL", "2024-01-01", 40, 10.0, 1.0) {
            text.push_str(&format!("{},{},{},{},100\n", r.date, r.symbol, r.open, r.close));
        }
        fs::write(&csv_path, text).unwrap();
        let ini = write_temp_ini(VALID_INI);

        let cli = Cli::try_parse_from([
            "movecast".into(),
            "train".into(),
            "--input".into(),
            csv_path.clone().into_os_string(),
            "--config".into(),
            ini.path().as_os_str().to_owned(),
            "--output".into(),
            report_path.clone().into_os_string(),
            "--model".into(),
            "logistic".into(),
        ])
        .unwrap();
        cli::run(cli);

        let content = fs::read_to_string(&report_path).unwrap();
        assert_eq!(content, "symbol,accuracy\nAAPL,1.0000\n");
    }

    #[test]
    fn train_with_recurrent_model_writes_report() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("prices.csv");
        let report_path = dir.path().join("accuracy.csv");
        let rows = generate_rows("MSFT", "2024-01-01", 40, 90.0, -1.0);
        fs::write(&csv_path, to_csv(&rows)).unwrap();

        let cli = Cli::try_parse_from([
            "movecast".into(),
            "train".into(),
            "--input".into(),
            csv_path.into_os_string(),
            "--output".into(),
            report_path.clone().into_os_string(),
            "--epochs".into(),
            "5".into(),
        ])
        .unwrap();
        cli::run(cli);

        let content = fs::read_to_string(&report_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "symbol,accuracy,day_1,day_2,day_3");
        assert!(lines[1].starts_with("MSFT,"));
    }

    #[test]
    fn prepare_with_missing_input_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "movecast".into(),
            "prepare".into(),
            "--input".into(),
            dir.path().join("absent.csv").into_os_string(),
        ])
        .unwrap();
        cli::run(cli);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

mod output {
    use super::*;

    #[test]
    fn accuracy_row_is_tab_separated() {
        let entry = SymbolAccuracy {
            symbol: "AAPL".to_string(),
            accuracy: 0.875,
            by_offset: vec![1.0, 0.75, 0.9],
        };
        assert_eq!(cli::format_accuracy_row(&entry), "AAPL\t87.5%\t[100% 75% 90%]");
    }
}
