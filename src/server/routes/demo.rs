use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use axum_typed_multipart::{TryFromMultipart, TypedMultipart};
use serde::Deserialize;

use crate::demo::{self, DemoDifficulty, DemoDraft, DemoError, DemoFilter, DemoQuestion};
use crate::models::option_label;
use crate::server::app::AppState;
use crate::server::deserializers::empty_string_as_none;
use crate::toast::Toasts;

use super::{flash_redirect, Chrome, Operator, PageResult};

#[derive(Deserialize)]
struct DemoQuery {
    #[serde(default)]
    search: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    difficulty: Option<DemoDifficulty>,
}

#[derive(TryFromMultipart)]
#[try_from_multipart(rename_all = "camelCase")]
struct DemoForm {
    question: String,
    option: Vec<String>,
    correct_answer: Option<usize>,
    difficulty: Option<String>,
    category: String,
}

struct DemoRow {
    question: DemoQuestion,
    correct: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "demo/list.html")]
struct DemoPage {
    chrome: Chrome,
    rows: Vec<DemoRow>,
    search: String,
    difficulty: String,
    difficulties: [DemoDifficulty; 3],
    draft: DemoDraft,
    draft_difficulty: String,
    error: Option<String>,
}

fn render(
    state: &AppState,
    chrome: Chrome,
    filter: DemoFilter,
    draft: DemoDraft,
    error: Option<String>,
) -> DemoPage {
    let rows = demo::filtered(&state.store, &filter)
        .into_iter()
        .map(|question| DemoRow {
            correct: question
                .options
                .get(question.correct_answer)
                .map(|text| format!("{}. {text}", option_label(question.correct_answer)))
                .unwrap_or_default(),
            question,
        })
        .collect();
    DemoPage {
        chrome,
        rows,
        search: filter.search,
        difficulty: filter.difficulty.map(|d| d.to_string()).unwrap_or_default(),
        difficulties: DemoDifficulty::ALL,
        draft_difficulty: draft.difficulty.to_string(),
        draft,
        error,
    }
}

async fn demo_page(
    State(state): State<AppState>,
    Operator(operator): Operator,
    Query(query): Query<DemoQuery>,
) -> DemoPage {
    let chrome = Chrome::new(&state, operator, "demo").await;
    let filter = DemoFilter {
        search: query.search,
        difficulty: query.difficulty,
    };
    render(&state, chrome, filter, DemoDraft::default(), None)
}

async fn add_question(
    State(state): State<AppState>,
    Operator(operator): Operator,
    TypedMultipart(form): TypedMultipart<DemoForm>,
) -> Response {
    let draft = DemoDraft {
        question: form.question,
        options: form.option,
        correct_answer: form.correct_answer.unwrap_or(0),
        difficulty: form
            .difficulty
            .and_then(|d| d.parse().ok())
            .unwrap_or_default(),
        category: form.category,
    };
    let mut toasts = Toasts::default();
    match demo::add(&state.store, &draft) {
        Ok(_) => {
            toasts.success("Question added successfully!");
            flash_redirect(&state, toasts, "/demo").await.into_response()
        }
        Err(err) => {
            let error = match err {
                DemoError::Invalid(errors) => Some(errors.to_string()),
                DemoError::Store(err) => {
                    tracing::error!(error = %err, "Cannot store demo question");
                    toasts.error("Failed to save question. Please try again.");
                    None
                }
            };
            state.flash(toasts).await;
            let chrome = Chrome::new(&state, operator, "demo").await;
            render(&state, chrome, DemoFilter::default(), draft, error).into_response()
        }
    }
}

async fn delete_question(
    State(state): State<AppState>,
    Operator(_): Operator,
    Path(id): Path<i64>,
) -> PageResult<Response> {
    let mut toasts = Toasts::default();
    if demo::delete(&state.store, id)? {
        toasts.success("Question deleted successfully!");
    }
    Ok(flash_redirect(&state, toasts, "/demo").await.into_response())
}

pub fn demo_router(state: AppState) -> Router {
    Router::new()
        .route("/demo", get(demo_page))
        .route("/demo/new", post(add_question))
        .route("/demo/{id}/delete", post(delete_question))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::super::test_support::{get as get_page, post_form, post_multipart, state};
    use crate::demo;
    use crate::testing::user_session;

    fn fields<'a>(question: &'a str, category: &'a str, difficulty: &'a str) -> Vec<(&'a str, Option<&'a str>, &'a str)> {
        vec![
            ("question", None, question),
            ("option", None, "Paris"),
            ("option", None, "Rome"),
            ("option", None, "Berlin"),
            ("option", None, "Madrid"),
            ("correctAnswer", None, "0"),
            ("difficulty", None, difficulty),
            ("category", None, category),
        ]
    }

    #[tokio::test]
    async fn add_filter_and_delete_offline_questions() {
        let state = state("http://127.0.0.1:9", Some(user_session()), true);

        let (status, location, _) =
            post_multipart(&state, "/demo/new", &fields("Capital of France?", "Geography", "easy")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/demo"));
        post_multipart(&state, "/demo/new", &fields("Year of the moon landing?", "History", "hard")).await;

        let (_, _, body) = get_page(&state, "/demo").await;
        assert!(body.contains("Capital of France?"));
        assert!(body.contains("A. Paris"));

        let (_, _, body) = get_page(&state, "/demo?search=history&difficulty=").await;
        assert!(body.contains("Year of the moon landing?"));
        assert!(!body.contains("Capital of France?"));

        let (_, _, body) = get_page(&state, "/demo?search=&difficulty=easy").await;
        assert!(body.contains("Capital of France?"));
        assert!(!body.contains("Year of the moon landing?"));

        let id = demo::load(&state.store)[0].id;
        let (_, location, _) = post_form(&state, &format!("/demo/{id}/delete"), "").await;
        assert_eq!(location.as_deref(), Some("/demo"));
        assert_eq!(demo::load(&state.store).len(), 1);
    }

    #[tokio::test]
    async fn missing_category_keeps_the_draft() {
        let state = state("http://127.0.0.1:9", Some(user_session()), true);
        let (status, _, body) = post_multipart(&state, "/demo/new", &fields("Capital of France?", "", "medium")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Please select a category"));
        assert!(body.contains("value=\"Capital of France?\""));
        assert!(demo::load(&state.store).is_empty());
    }
}
