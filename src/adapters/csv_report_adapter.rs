//! CSV accuracy report writer.

use crate::domain::accuracy::AccuracyReport;
use crate::domain::error::MovecastError;
use crate::ports::report_port::ReportPort;

/// Writes one row per symbol: `symbol,accuracy[,day_1,...,day_H]`.
#[derive(Debug, Clone, Copy)]
pub struct CsvReportAdapter {
    include_offsets: bool,
}

impl CsvReportAdapter {
    pub fn new(include_offsets: bool) -> Self {
        Self { include_offsets }
    }

    fn to_io(e: csv::Error) -> MovecastError {
        MovecastError::Io(std::io::Error::other(e))
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &AccuracyReport, output_path: &str) -> Result<(), MovecastError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(Self::to_io)?;

        let horizon = report
            .symbols
            .first()
            .map(|s| s.by_offset.len())
            .unwrap_or_default();
        let mut header = vec!["symbol".to_string(), "accuracy".to_string()];
        if self.include_offsets {
            header.extend((1..=horizon).map(|d| format!("day_{d}")));
        }
        wtr.write_record(&header).map_err(Self::to_io)?;

        for entry in &report.symbols {
            let mut record = vec![entry.symbol.clone(), format!("{:.4}", entry.accuracy)];
            if self.include_offsets {
                record.extend(entry.by_offset.iter().map(|a| format!("{a:.4}")));
            }
            wtr.write_record(&record).map_err(Self::to_io)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
