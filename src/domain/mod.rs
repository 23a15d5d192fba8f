//! Core domain types and logic.

pub mod accuracy;
pub mod config_validation;
pub mod error;
pub mod layout;
pub mod normalization;
pub mod panel;
pub mod price_row;
pub mod sequence_builder;
pub mod session;
