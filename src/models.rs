use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;

/// Text with an optional image reference. Used for titles, options and explanations.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Media {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Media {
    pub fn text(text: impl Into<String>) -> Self {
        Media {
            text: text.into(),
            image: None,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|i| !i.is_empty())
    }
}

/// Questions reference categories either by id or with the category embedded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(String),
    Embedded {
        #[serde(rename = "_id")]
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl CategoryRef {
    pub fn id(&self) -> &str {
        match self {
            CategoryRef::Id(id) => id,
            CategoryRef::Embedded { id, .. } => id,
        }
    }
}

/// Reference to a user, as found in `createdBy` and `approvedBy`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum PersonRef {
    Id(String),
    Embedded {
        #[serde(rename = "_id")]
        id: String,
        #[serde(default)]
        username: Option<String>,
    },
}

impl PersonRef {
    pub fn id(&self) -> &str {
        match self {
            PersonRef::Id(id) => id,
            PersonRef::Embedded { id, .. } => id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            PersonRef::Embedded {
                username: Some(name),
                ..
            } => name,
            other => other.id(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Media,
    #[serde(default)]
    pub options: Vec<Media>,
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: Option<Media>,
    #[serde(default = "default_difficulty")]
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub difficulty: u8,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub approved_by: Option<PersonRef>,
    #[serde(default)]
    pub created_by: Option<PersonRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_difficulty() -> u8 {
    3
}

impl Question {
    pub fn correct_label(&self) -> char {
        option_label(self.correct_answer)
    }

    pub fn category_ids(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.id().to_owned()).collect()
    }
}

/// Options are labelled A, B, C... in every form and table.
pub fn option_label(index: usize) -> char {
    char::from_u32('A' as u32 + index as u32).unwrap_or('?')
}

pub fn difficulty_label(difficulty: u8) -> &'static str {
    match difficulty {
        1 => "Very Easy",
        2 => "Easy",
        3 => "Medium",
        4 => "Hard",
        5 => "Very Hard",
        _ => "Unknown",
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("Unknown role {other}")),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug)]
pub struct LoginResponse {
    pub user: User,
}

#[derive(Deserialize, Debug)]
pub struct ApprovalResponse {
    pub question: Question,
}

/// `filter-by-date` answers either with a wrapper object or with a bare list.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum DateRangeResponse {
    Wrapped {
        questions: Vec<Question>,
        #[serde(default)]
        count: Option<usize>,
    },
    Bare(Vec<Question>),
}

impl DateRangeResponse {
    pub fn into_questions(self) -> Vec<Question> {
        match self {
            DateRangeResponse::Wrapped { questions, .. } => questions,
            DateRangeResponse::Bare(questions) => questions,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct ImportCounts {
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub total: u64,
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub successful: u64,
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub failed: u64,
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub skipped: u64,
}

/// One itemized row of an import report.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RowOutcome {
    #[serde(default)]
    pub row: Option<u64>,
    #[serde(default, alias = "error")]
    pub reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(from = "RawImportReport")]
pub struct ImportReport {
    pub summary: ImportCounts,
    pub failed: Vec<RowOutcome>,
    pub skipped: Vec<RowOutcome>,
}

// Counters sit either under `summary` or at the top level; when at the top level
// `failed`/`skipped` are numbers rather than row lists.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawImportReport {
    Nested {
        summary: ImportCounts,
        #[serde(default)]
        failed: Vec<RowOutcome>,
        #[serde(default)]
        skipped: Vec<RowOutcome>,
    },
    Flat(ImportCounts),
}

impl From<RawImportReport> for ImportReport {
    fn from(raw: RawImportReport) -> Self {
        match raw {
            RawImportReport::Nested {
                summary,
                failed,
                skipped,
            } => ImportReport {
                summary,
                failed,
                skipped,
            },
            RawImportReport::Flat(summary) => ImportReport {
                summary,
                ..Default::default()
            },
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct HealthStatus {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_accepts_both_category_shapes() {
        let q: Question = serde_json::from_value(json!({
            "_id": "q1",
            "title": {"text": "2 + 2?"},
            "options": [{"text": "3"}, {"text": "4", "image": "http://img/4.png"}],
            "correctAnswer": "1",
            "difficulty": 2,
            "categories": ["c1", {"_id": "c2", "name": "Math"}],
            "isApproved": true,
            "approvedBy": {"_id": "u1", "username": "granny"},
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(q.correct_answer, 1);
        assert_eq!(q.correct_label(), 'B');
        assert_eq!(q.category_ids(), vec!["c1", "c2"]);
        assert!(q.options[1].has_image());
        assert_eq!(q.approved_by.unwrap().display_name(), "granny");
    }

    #[test]
    fn import_report_nested_and_flat() {
        let nested: ImportReport = serde_json::from_value(json!({
            "summary": {"total": 10, "successful": 7, "failed": 2, "skipped": 1},
            "failed": [{"row": 3, "error": "missing title"}, {"row": 8, "error": "bad answer"}],
            "skipped": [{"row": 5, "reason": "duplicate"}]
        }))
        .unwrap();
        assert_eq!(nested.summary.successful, 7);
        assert_eq!(nested.failed[0].reason.as_deref(), Some("missing title"));
        assert_eq!(nested.skipped.len(), 1);

        let flat: ImportReport = serde_json::from_value(
            json!({"total": "5", "successful": 0, "failed": 5, "skipped": 0}),
        )
        .unwrap();
        assert_eq!(flat.summary.total, 5);
        assert_eq!(flat.summary.failed, 5);
        assert!(flat.failed.is_empty());
    }

    #[test]
    fn date_range_response_shapes() {
        let wrapped: DateRangeResponse =
            serde_json::from_value(json!({"questions": [{"_id": "a"}], "count": 1})).unwrap();
        assert_eq!(wrapped.into_questions().len(), 1);
        let bare: DateRangeResponse = serde_json::from_value(json!([{"_id": "a"}, {"_id": "b"}])).unwrap();
        assert_eq!(bare.into_questions().len(), 2);
    }
}
