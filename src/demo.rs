//! Offline "manage questions" mode: a small question list kept entirely in
//! the local store, never sent to the backend.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::forms::ValidationErrors;
use crate::session::{LocalStore, StoreError};

const QUESTIONS_KEY: &str = "questions";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DemoDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl DemoDifficulty {
    pub const ALL: [DemoDifficulty; 3] = [DemoDifficulty::Easy, DemoDifficulty::Medium, DemoDifficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            DemoDifficulty::Easy => "easy",
            DemoDifficulty::Medium => "medium",
            DemoDifficulty::Hard => "hard",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DemoDifficulty::Easy => "Easy",
            DemoDifficulty::Medium => "Medium",
            DemoDifficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for DemoDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemoDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DemoDifficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("Unknown difficulty {s}"))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DemoQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub difficulty: DemoDifficulty,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoDraft {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub difficulty: DemoDifficulty,
    pub category: String,
}

impl Default for DemoDraft {
    fn default() -> Self {
        DemoDraft {
            question: String::new(),
            options: vec![String::new(); 4],
            correct_answer: 0,
            difficulty: DemoDifficulty::Medium,
            category: String::new(),
        }
    }
}

impl DemoDraft {
    /// Stops at the first problem, like the form's alert did.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.question.trim().is_empty() {
            errors.push("Please enter a question");
        } else if self.options.iter().any(|o| o.trim().is_empty()) {
            errors.push("Please fill in all options");
        } else if self.category.trim().is_empty() {
            errors.push("Please select a category");
        }
        errors.into_result()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default)]
pub struct DemoFilter {
    pub search: String,
    pub difficulty: Option<DemoDifficulty>,
}

impl DemoFilter {
    pub fn matches(&self, question: &DemoQuestion) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = question.question.to_lowercase().contains(&needle)
            || question.category.to_lowercase().contains(&needle);
        let matches_difficulty = self.difficulty.map_or(true, |d| d == question.difficulty);
        matches_search && matches_difficulty
    }
}

pub fn load(store: &LocalStore) -> Vec<DemoQuestion> {
    match store.get_json::<Vec<DemoQuestion>>(QUESTIONS_KEY) {
        Ok(questions) => questions.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring unreadable demo questions");
            Vec::new()
        }
    }
}

pub fn filtered(store: &LocalStore, filter: &DemoFilter) -> Vec<DemoQuestion> {
    load(store).into_iter().filter(|q| filter.matches(q)).collect()
}

pub fn add(store: &LocalStore, draft: &DemoDraft) -> Result<DemoQuestion, DemoError> {
    draft.validate()?;
    let mut questions = load(store);
    // millisecond timestamps, bumped past the newest id so quick adds stay unique
    let id = questions
        .iter()
        .map(|q| q.id + 1)
        .max()
        .unwrap_or(0)
        .max(Utc::now().timestamp_millis());
    let question = DemoQuestion {
        id,
        question: draft.question.trim().to_owned(),
        options: draft.options.iter().map(|o| o.trim().to_owned()).collect(),
        correct_answer: if draft.correct_answer < draft.options.len() {
            draft.correct_answer
        } else {
            0
        },
        difficulty: draft.difficulty,
        category: draft.category.trim().to_owned(),
    };
    questions.push(question.clone());
    store.set_json(QUESTIONS_KEY, &questions)?;
    tracing::debug!(id, "Stored demo question");
    Ok(question)
}

pub fn delete(store: &LocalStore, id: i64) -> Result<bool, StoreError> {
    let mut questions = load(store);
    let before = questions.len();
    questions.retain(|q| q.id != id);
    if questions.len() == before {
        return Ok(false);
    }
    store.set_json(QUESTIONS_KEY, &questions)?;
    Ok(true)
}
