use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::{ApiClient, ApiError, FormPart, Payload};
use crate::models::{ApprovalResponse, DateRangeResponse, ImportReport, Question};

// create/update answer with the question itself or with `{question}` around it
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionEnvelope {
    Wrapped { question: Question },
    Bare(Question),
}

impl From<QuestionEnvelope> for Question {
    fn from(envelope: QuestionEnvelope) -> Self {
        match envelope {
            QuestionEnvelope::Wrapped { question } => question,
            QuestionEnvelope::Bare(question) => question,
        }
    }
}

impl ApiClient {
    pub async fn list_questions(&self) -> Result<Vec<Question>, ApiError> {
        self.send_json("questions.list", self.request(Method::GET, "/questions"))
            .await
    }

    pub async fn get_question(&self, id: &str) -> Result<Question, ApiError> {
        let envelope: QuestionEnvelope = self
            .send_json("questions.get", self.request(Method::GET, &format!("/questions/{id}")))
            .await?;
        Ok(envelope.into())
    }

    pub async fn create_question(&self, payload: Payload) -> Result<Question, ApiError> {
        let envelope: QuestionEnvelope = self
            .send_payload("questions.create", self.request(Method::POST, "/questions"), payload)
            .await?;
        Ok(envelope.into())
    }

    pub async fn update_question(&self, id: &str, payload: Payload) -> Result<Question, ApiError> {
        let envelope: QuestionEnvelope = self
            .send_payload(
                "questions.update",
                self.request(Method::PUT, &format!("/questions/{id}")),
                payload,
            )
            .await?;
        Ok(envelope.into())
    }

    pub async fn delete_question(&self, id: &str) -> Result<(), ApiError> {
        self.send_discarding(
            "questions.delete",
            self.request(Method::DELETE, &format!("/questions/{id}")),
        )
        .await
    }

    pub async fn questions_by_tag(&self, tag: &str) -> Result<Vec<Question>, ApiError> {
        let request = self.request_segments(Method::GET, &["questions", "tag", tag])?;
        self.send_json("questions.by_tag", request).await
    }

    pub async fn questions_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Question>, ApiError> {
        let request = self.request(Method::GET, "/questions/filter-by-date").query(&[
            ("fromDate", from.format("%Y-%m-%d").to_string()),
            ("toDate", to.format("%Y-%m-%d").to_string()),
        ]);
        let response: DateRangeResponse = self.send_json("questions.by_date", request).await?;
        Ok(response.into_questions())
    }

    /// `approved_by` must be `Some` when approving; `None` is sent as JSON null.
    pub async fn set_approval(
        &self,
        id: &str,
        is_approved: bool,
        approved_by: Option<&str>,
    ) -> Result<Question, ApiError> {
        let request = self
            .request(Method::PATCH, &format!("/questions/{id}/approval"))
            .json(&json!({ "isApproved": is_approved, "approvedBy": approved_by }));
        let response: ApprovalResponse = self.send_json("questions.approval", request).await?;
        Ok(response.question)
    }

    pub async fn upload_questions_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ImportReport, ApiError> {
        let payload = Payload::Multipart(vec![FormPart::file("file", file_name, None, bytes)]);
        self.send_payload(
            "questions.import",
            self.request(Method::POST, "/questions/upload-csv-questions"),
            payload,
        )
        .await
    }

    pub async fn export_questions(&self) -> Result<Vec<u8>, ApiError> {
        let response = self
            .send("questions.export", self.request(Method::GET, "/questions/export"))
            .await?;
        Ok(response.bytes().await?.to_vec())
    }
}
