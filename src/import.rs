//! Bulk question import from a CSV or spreadsheet file.
//!
//! The backend answers the upload with a single summary, so the progress value
//! published while waiting is cosmetic: it creeps toward 90% on a timer, jumps
//! to 100% when the answer arrives, holds briefly and the dialog closes.

use std::path::Path;

use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::api::ApiClient;
use crate::config::ImportSettings;
use crate::listing::{refresh, QuestionList};
use crate::models::ImportReport;
use crate::telemetry::IMPORTED_ROWS;
use crate::toast::Toasts;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];
const PROGRESS_CEILING: u8 = 90;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Please select exactly one file to upload")]
    FileCount(usize),
    #[error("Please upload a CSV or Excel file (.csv, .xlsx, .xls)")]
    Extension(String),
}

#[derive(Debug, Clone)]
pub struct ImportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Dialog state as seen by whoever renders the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct ImportProgress {
    pub open: bool,
    pub percent: u8,
}

impl ImportProgress {
    fn advance(&mut self, step: u8) {
        if self.open && self.percent < PROGRESS_CEILING {
            self.percent = self.percent.saturating_add(step).min(PROGRESS_CEILING);
        }
    }
}

pub fn check_extension(file_name: &str) -> Result<(), ImportError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(ImportError::Extension(file_name.to_owned()))
    }
}

/// Exactly one file with an accepted extension.
pub fn select_file(mut files: Vec<ImportFile>) -> Result<ImportFile, ImportError> {
    if files.len() != 1 {
        return Err(ImportError::FileCount(files.len()));
    }
    let file = files.remove(0);
    check_extension(&file.file_name)?;
    Ok(file)
}

fn summary_message(report: &ImportReport) -> String {
    let s = &report.summary;
    let mut message = format!("Imported {} of {} questions", s.successful, s.total);
    if s.failed > 0 || s.skipped > 0 {
        message.push_str(&format!(" ({} failed, {} skipped)", s.failed, s.skipped));
    }
    message
}

fn log_rows(report: &ImportReport) {
    let s = &report.summary;
    IMPORTED_ROWS.with_label_values(&["successful"]).inc_by(s.successful);
    IMPORTED_ROWS.with_label_values(&["failed"]).inc_by(s.failed);
    IMPORTED_ROWS.with_label_values(&["skipped"]).inc_by(s.skipped);
    for row in &report.failed {
        tracing::warn!(row = ?row.row, reason = row.reason.as_deref().unwrap_or("unknown"), "Import row failed");
    }
    for row in &report.skipped {
        tracing::warn!(row = ?row.row, reason = row.reason.as_deref().unwrap_or("unknown"), "Import row skipped");
    }
}

/// Uploads `files` and reports the outcome. Reloads the question list only
/// when at least one row was created.
pub async fn import_questions(
    api: &ApiClient,
    list: &Mutex<QuestionList>,
    files: Vec<ImportFile>,
    settings: &ImportSettings,
    progress: &watch::Sender<ImportProgress>,
    toasts: &mut Toasts,
) -> Option<ImportReport> {
    let file = match select_file(files) {
        Ok(file) => file,
        Err(err) => {
            toasts.error(err.to_string());
            return None;
        }
    };
    tracing::info!(file = %file.file_name, size = file.bytes.len(), "Uploading questions file");
    progress.send_replace(ImportProgress {
        open: true,
        percent: 0,
    });

    let upload = api.upload_questions_file(&file.file_name, file.bytes);
    tokio::pin!(upload);
    let mut ticker = tokio::time::interval(settings.tick());
    ticker.tick().await;
    let result = loop {
        tokio::select! {
            result = &mut upload => break result,
            _ = ticker.tick() => progress.send_modify(|p| p.advance(settings.step)),
        }
    };

    match result {
        Ok(report) => {
            progress.send_replace(ImportProgress {
                open: true,
                percent: 100,
            });
            tokio::time::sleep(settings.hold()).await;
            progress.send_replace(ImportProgress::default());
            log_rows(&report);
            if report.summary.successful > 0 {
                toasts.success(summary_message(&report));
                refresh(api, list, toasts).await;
            } else {
                toasts.error(format!(
                    "No questions were imported ({} failed, {} skipped)",
                    report.summary.failed, report.summary.skipped
                ));
            }
            Some(report)
        }
        Err(err) => {
            progress.send_replace(ImportProgress::default());
            toasts.error(err.message_or("Failed to upload questions. Please try again."));
            None
        }
    }
}
