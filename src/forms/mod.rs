//! Create/edit drafts for questions, categories and users.
//!
//! A draft holds exactly what the form shows. It validates locally before any
//! request is built; a failed validation never reaches the backend.

pub mod category;
pub mod question;
pub mod user;

use base64::{engine::general_purpose, Engine as _};

use crate::api::{ApiError, FormPart};

/// An image picked in a form, held in memory until submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// `data:` URL used to preview the image before it is uploaded.
    pub fn preview_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type.as_deref().unwrap_or("application/octet-stream"),
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn to_part(&self, field: impl Into<String>) -> FormPart {
        FormPart::file(
            field,
            self.file_name.clone(),
            self.content_type.clone(),
            self.bytes.clone(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error(transparent)]
    Backend(#[from] ApiError),
}

impl FormError {
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            FormError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}
