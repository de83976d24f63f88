use chrono::{Local, NaiveDate};

use crate::api::ApiClient;
use crate::session::Session;
use crate::toast::Toasts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("questions-export-{}.csv", date.format("%Y-%m-%d"))
}

/// Downloads every question as CSV, named after today's local date.
pub async fn export_questions(
    api: &ApiClient,
    session: Option<&Session>,
    toasts: &mut Toasts,
) -> Option<ExportedFile> {
    let Some(operator) = session else {
        toasts.error("User not logged in");
        return None;
    };
    match api.export_questions().await {
        Ok(bytes) => {
            let file = ExportedFile {
                file_name: export_file_name(Local::now().date_naive()),
                bytes,
            };
            tracing::info!(operator = %operator.id, file = %file.file_name, size = file.bytes.len(), "Exported questions");
            toasts.success("Questions exported successfully!");
            Some(file)
        }
        Err(err) => {
            toasts.error(err.message_or("Failed to export questions. Please try again."));
            None
        }
    }
}
