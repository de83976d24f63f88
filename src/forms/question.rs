use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use super::{FormError, ImageUpload, ValidationErrors};
use crate::api::{ApiClient, FormPart, Payload};
use crate::listing::{refresh, QuestionList};
use crate::models::{option_label, Media, Question};
use crate::toast::Toasts;

pub const MIN_OPTIONS: usize = 2;
const BLANK_OPTIONS: usize = 4;

/// Text plus an image that is either already stored (`existing`) or freshly
/// picked (`upload`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaDraft {
    pub text: String,
    pub existing: Option<String>,
    pub upload: Option<ImageUpload>,
}

impl MediaDraft {
    fn from_media(media: &Media) -> Self {
        MediaDraft {
            text: media.text.clone(),
            existing: media.image.clone().filter(|i| !i.is_empty()),
            upload: None,
        }
    }

    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || self.existing.is_some() || self.upload.is_some()
    }

    pub fn preview(&self) -> Option<String> {
        self.upload
            .as_ref()
            .map(ImageUpload::preview_url)
            .or_else(|| self.existing.clone())
    }

    fn to_media(&self) -> Media {
        Media {
            text: self.text.trim().to_owned(),
            image: self.existing.clone(),
        }
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(self.to_media()).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub title: MediaDraft,
    pub options: Vec<MediaDraft>,
    pub correct_answer: usize,
    pub explanation: MediaDraft,
    /// Category ids.
    pub categories: Vec<String>,
    pub difficulty: u8,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        QuestionDraft::new()
    }
}

impl QuestionDraft {
    pub fn new() -> Self {
        QuestionDraft {
            title: MediaDraft::default(),
            options: vec![MediaDraft::default(); BLANK_OPTIONS],
            correct_answer: 0,
            explanation: MediaDraft::default(),
            categories: Vec::new(),
            difficulty: 3,
        }
    }

    pub fn from_question(question: &Question) -> Self {
        QuestionDraft {
            title: MediaDraft::from_media(&question.title),
            options: question.options.iter().map(MediaDraft::from_media).collect(),
            correct_answer: question.correct_answer,
            explanation: question
                .explanation
                .as_ref()
                .map(MediaDraft::from_media)
                .unwrap_or_default(),
            categories: question.category_ids(),
            difficulty: question.difficulty,
        }
    }

    pub fn add_option(&mut self) {
        self.options.push(MediaDraft::default());
    }

    /// Never drops below two options. The correct answer falls back to A when
    /// it no longer points at an option.
    pub fn remove_option(&mut self, index: usize) -> bool {
        if self.options.len() <= MIN_OPTIONS || index >= self.options.len() {
            return false;
        }
        self.options.remove(index);
        if self.correct_answer >= self.options.len() {
            self.correct_answer = 0;
        }
        true
    }

    pub fn has_uploads(&self) -> bool {
        self.title.upload.is_some()
            || self.explanation.upload.is_some()
            || self.options.iter().any(|o| o.upload.is_some())
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if !self.title.has_content() {
            errors.push("Question title must have text or image");
        }
        if self.options.len() < MIN_OPTIONS {
            errors.push("At least two options are required");
        }
        for (index, option) in self.options.iter().enumerate() {
            if !option.has_content() {
                errors.push(format!("Option {} must have text or image", option_label(index)));
            }
        }
        if self.correct_answer >= self.options.len() {
            errors.push("Correct answer must be one of the options");
        }
        if self.categories.is_empty() {
            errors.push("Select at least one category");
        }
        if !(1..=5).contains(&self.difficulty) {
            errors.push("Difficulty must be between 1 and 5");
        }
        errors.into_result()
    }

    fn explanation_json(&self) -> Option<Value> {
        self.explanation
            .has_content()
            .then(|| self.explanation.to_json())
    }

    pub fn create_payload(&self) -> Payload {
        if self.has_uploads() {
            return self.multipart();
        }
        let mut body = json!({
            "title": self.title.to_json(),
            "options": self.options.iter().map(MediaDraft::to_json).collect::<Vec<_>>(),
            "correctAnswer": self.correct_answer,
            "categories": self.categories,
            "difficulty": self.difficulty,
        });
        if let Some(explanation) = self.explanation_json() {
            body["explanation"] = explanation;
        }
        Payload::Json(body)
    }

    /// Only the fields that differ from `original`; a freshly picked image
    /// forces the full multipart form instead.
    pub fn update_payload(&self, original: &Question) -> Payload {
        if self.has_uploads() {
            return self.multipart();
        }
        // compare against the stored question seen through the same projection,
        // so blank images and stray whitespace do not count as edits
        let base = QuestionDraft::from_question(original);
        let mut diff = Map::new();
        let title = self.title.to_media();
        if title != base.title.to_media() {
            diff.insert("title".into(), json!(title));
        }
        let options: Vec<Media> = self.options.iter().map(MediaDraft::to_media).collect();
        if options != base.options.iter().map(MediaDraft::to_media).collect::<Vec<_>>() {
            diff.insert("options".into(), json!(options));
        }
        if self.correct_answer != base.correct_answer {
            diff.insert("correctAnswer".into(), json!(self.correct_answer));
        }
        let explanation = self.explanation.has_content().then(|| self.explanation.to_media());
        if explanation != base.explanation.has_content().then(|| base.explanation.to_media()) {
            diff.insert("explanation".into(), json!(explanation));
        }
        if self.categories != base.categories {
            diff.insert("categories".into(), json!(self.categories));
        }
        if self.difficulty != base.difficulty {
            diff.insert("difficulty".into(), json!(self.difficulty));
        }
        Payload::Json(Value::Object(diff))
    }

    fn multipart(&self) -> Payload {
        let mut parts = vec![FormPart::text("titleText", self.title.text.trim())];
        if let Some(upload) = &self.title.upload {
            parts.push(upload.to_part("titleImage"));
        }
        for (index, option) in self.options.iter().enumerate() {
            parts.push(FormPart::text(format!("optionText{index}"), option.text.trim()));
            if let Some(upload) = &option.upload {
                parts.push(upload.to_part(format!("optionImage{index}")));
            }
        }
        parts.push(FormPart::text("explanationText", self.explanation.text.trim()));
        if let Some(upload) = &self.explanation.upload {
            parts.push(upload.to_part("explanationImage"));
        }
        parts.push(FormPart::text("correctAnswer", self.correct_answer.to_string()));
        parts.push(FormPart::text("categories", json!(self.categories).to_string()));
        parts.push(FormPart::text("difficulty", self.difficulty.to_string()));
        Payload::Multipart(parts)
    }
}

fn reject(toasts: &mut Toasts, errors: ValidationErrors) -> FormError {
    for message in errors.messages() {
        toasts.error(message.clone());
    }
    FormError::Invalid(errors)
}

/// Creates the question and reloads the list so the new row shows up with
/// its categories resolved.
pub async fn submit_create(
    api: &ApiClient,
    list: &Mutex<QuestionList>,
    draft: &QuestionDraft,
    toasts: &mut Toasts,
) -> Result<Question, FormError> {
    draft.validate().map_err(|errors| reject(toasts, errors))?;
    match api.create_question(draft.create_payload()).await {
        Ok(question) => {
            tracing::info!(question_id = %question.id, "Question created");
            toasts.success("Question created successfully!");
            refresh(api, list, toasts).await;
            Ok(question)
        }
        Err(err) => {
            toasts.error(err.message_or("Failed to create question. Please try again."));
            Err(err.into())
        }
    }
}

pub async fn submit_update(
    api: &ApiClient,
    list: &Mutex<QuestionList>,
    original: &Question,
    draft: &QuestionDraft,
    toasts: &mut Toasts,
) -> Result<Question, FormError> {
    draft.validate().map_err(|errors| reject(toasts, errors))?;
    match api
        .update_question(&original.id, draft.update_payload(original))
        .await
    {
        Ok(question) => {
            tracing::info!(question_id = %question.id, "Question updated");
            list.lock().await.replace_one(question.clone());
            toasts.success("Question updated successfully!");
            Ok(question)
        }
        Err(err) => {
            toasts.error(err.message_or("Failed to update question. Please try again."));
            Err(err.into())
        }
    }
}
