//! Accuracy report output port.

use crate::domain::accuracy::AccuracyReport;
use crate::domain::error::MovecastError;

/// Port for writing accuracy reports.
pub trait ReportPort {
    fn write(&self, report: &AccuracyReport, output_path: &str) -> Result<(), MovecastError>;
}
