//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod dense_head;
pub mod file_config_adapter;
pub mod gru_predictor;
pub mod logistic_predictor;
