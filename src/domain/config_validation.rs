//! Configuration validation.
//!
//! Runs before any data is loaded so a bad config fails fast.

use crate::domain::error::MovecastError;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), MovecastError> {
    validate_sequence_config(config)?;
    validate_training_config(config)?;
    validate_model_config(config)?;
    Ok(())
}

pub fn validate_sequence_config(config: &dyn ConfigPort) -> Result<(), MovecastError> {
    validate_positive_int(config, "sequence", "sequence_length")?;
    validate_positive_int(config, "sequence", "prediction_horizon")?;
    validate_train_fraction(config)?;
    Ok(())
}

pub fn validate_training_config(config: &dyn ConfigPort) -> Result<(), MovecastError> {
    validate_positive_int(config, "training", "epochs")?;
    validate_positive_int(config, "training", "batch_size")?;
    validate_learning_rate(config)?;
    Ok(())
}

pub fn validate_model_config(config: &dyn ConfigPort) -> Result<(), MovecastError> {
    if let Some(kind) = config.get_string("model", "kind") {
        let kind = kind.trim().to_ascii_lowercase();
        if kind != "gru" && kind != "logistic" {
            return Err(MovecastError::ConfigInvalid {
                section: "model".to_string(),
                key: "kind".to_string(),
                reason: format!("unknown model kind '{kind}', expected gru or logistic"),
            });
        }
    }
    validate_positive_int(config, "model", "hidden_size")?;
    validate_dropout(config)?;
    if let Some(raw) = config.get_string("model", "seed") {
        if raw.trim().parse::<u64>().is_err() {
            return Err(MovecastError::ConfigInvalid {
                section: "model".to_string(),
                key: "seed".to_string(),
                reason: "seed must be a non-negative integer".to_string(),
            });
        }
    }
    Ok(())
}

/// Absent keys pass; present keys must parse as an integer of at least 1.
fn validate_positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), MovecastError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= 1 => Ok(()),
        _ => Err(MovecastError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be an integer of at least 1"),
        }),
    }
}

fn validate_train_fraction(config: &dyn ConfigPort) -> Result<(), MovecastError> {
    if !config.has_key("sequence", "train_fraction") {
        return Ok(());
    }
    let value = config.get_double("sequence", "train_fraction", f64::NAN);
    if !(value > 0.0 && value < 1.0) {
        return Err(MovecastError::ConfigInvalid {
            section: "sequence".to_string(),
            key: "train_fraction".to_string(),
            reason: "train_fraction must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_learning_rate(config: &dyn ConfigPort) -> Result<(), MovecastError> {
    if !config.has_key("training", "learning_rate") {
        return Ok(());
    }
    let value = config.get_double("training", "learning_rate", f64::NAN);
    if !(value.is_finite() && value > 0.0) {
        return Err(MovecastError::ConfigInvalid {
            section: "training".to_string(),
            key: "learning_rate".to_string(),
            reason: "learning_rate must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_dropout(config: &dyn ConfigPort) -> Result<(), MovecastError> {
    if !config.has_key("model", "dropout") {
        return Ok(());
    }
    let value = config.get_double("model", "dropout", f64::NAN);
    if !(0.0..1.0).contains(&value) {
        return Err(MovecastError::ConfigInvalid {
            section: "model".to_string(),
            key: "dropout".to_string(),
            reason: "dropout must be at least 0 and below 1".to_string(),
        });
    }
    Ok(())
}
