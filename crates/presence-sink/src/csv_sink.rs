use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use presence_core::error::AppError;
use presence_core::models::AggregatedRecord;
use presence_core::traits::ResultSink;

pub const DEFAULT_CSV_PATH: &str = "results.csv";

const HEADERS: [&str; 18] = [
    "URL",
    "Company Name",
    "Has App",
    "Google Play Link",
    "Google Play Downloads",
    "Google Play Last Updated",
    "Google Play Developer Email",
    "Google Play Developer Name",
    "App Store Link",
    "App Store Last Updated",
    "App Store Developer Name",
    "LinkedIn Company Size",
    "LinkedIn Exact Employee Count",
    "LinkedIn Industry",
    "LinkedIn Headquarters",
    "LinkedIn Company Type",
    "LinkedIn Founded Year",
    "LinkedIn Specialties",
];

/// Appends every batch to one CSV file.
///
/// The header row is written only when the file does not exist yet or is
/// empty, so repeated runs accumulate into the same table.
///
/// Writes are blocking `std::fs` I/O on the caller's thread. One append is a
/// single batch of a few rows, so the scheduler calls it inline between
/// batches rather than handing it to `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn needs_header(&self) -> bool {
        fs::metadata(&self.path).map_or(true, |m| m.len() == 0)
    }
}

impl ResultSink for CsvSink {
    fn append(&mut self, records: &[AggregatedRecord]) -> Result<(), AppError> {
        if records.is_empty() {
            return Ok(());
        }

        let write_header = self.needs_header();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| sink_error(&self.path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer
                .write_record(HEADERS)
                .map_err(|e| sink_error(&self.path, e))?;
        }
        for record in records {
            writer
                .write_record(row(record))
                .map_err(|e| sink_error(&self.path, e))?;
        }
        writer.flush().map_err(|e| sink_error(&self.path, e))?;

        tracing::info!(
            path = %self.path.display(),
            records = records.len(),
            "Results appended to CSV"
        );
        Ok(())
    }
}

fn sink_error(path: &Path, e: impl std::fmt::Display) -> AppError {
    AppError::SinkError(format!("{}: {e}", path.display()))
}

fn cell(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

/// One CSV row; absent values become empty cells.
fn row(record: &AggregatedRecord) -> [String; 18] {
    let play = record.google_play_data.as_ref();
    let apple = record.app_store_data.as_ref();
    let linkedin = record.fallback_data.as_ref();

    [
        record.url.to_string(),
        cell(record.company.as_ref()),
        record.app_present.to_string(),
        cell(play.map(|l| &l.link)),
        cell(play.and_then(|l| l.downloads.as_ref())),
        cell(play.and_then(|l| l.last_updated.as_ref())),
        cell(play.and_then(|l| l.developer_email.as_ref())),
        cell(play.and_then(|l| l.developer_name.as_ref())),
        cell(apple.map(|l| &l.link)),
        cell(apple.and_then(|l| l.last_updated.as_ref())),
        cell(apple.and_then(|l| l.developer_name.as_ref())),
        cell(linkedin.and_then(|c| c.linkedin_company_size.as_ref())),
        cell(linkedin.and_then(|c| c.linkedin_exact_employee_count.as_ref())),
        cell(linkedin.and_then(|c| c.linkedin_industry.as_ref())),
        cell(linkedin.and_then(|c| c.linkedin_headquarters.as_ref())),
        cell(linkedin.and_then(|c| c.linkedin_company_type.as_ref())),
        linkedin
            .and_then(|c| c.linkedin_founded_year)
            .map(|y| y.to_string())
            .unwrap_or_default(),
        linkedin
            .map(|c| c.linkedin_specialties.join(", "))
            .unwrap_or_default(),
    ]
}
