use askama::Template;
use askama_web::WebTemplate;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::api::ApiError;
use crate::approval::toggle_approval;
use crate::export::export_questions;
use crate::forms::question::{submit_create, submit_update, MediaDraft, QuestionDraft, MIN_OPTIONS};
use crate::forms::FormError;
use crate::import::{import_questions, ImportFile, ImportProgress};
use crate::listing::{
    apply_date_filter, clear_date_filter, delete_question, refresh, Filters, ListView, Selector,
};
use crate::models::{difficulty_label, option_label, Category, Question};
use crate::server::app::AppState;
use crate::server::deserializers::{deserialize_selector, empty_string_as_none};
use crate::toast::Toasts;

use super::{back_to, flash_redirect, read_upload, Chrome, Operator, PageResult};

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    search: String,
    #[serde(default, deserialize_with = "deserialize_selector")]
    category: Selector<String>,
    #[serde(default, deserialize_with = "deserialize_selector")]
    difficulty: Selector<u8>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    page: Option<usize>,
}

#[derive(Deserialize)]
struct RowAction {
    return_to: Option<String>,
}

#[derive(Deserialize)]
struct DateFilterForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    from_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    to_date: Option<NaiveDate>,
}

#[derive(TryFromMultipart)]
struct ImportForm {
    #[form_data(limit = "25MiB")]
    file: Vec<FieldData<NamedTempFile>>,
}

#[derive(TryFromMultipart)]
#[try_from_multipart(rename_all = "camelCase")]
struct QuestionForm {
    title_text: String,
    #[form_data(limit = "10MiB")]
    title_image: Option<FieldData<NamedTempFile>>,
    title_existing: Option<String>,
    option_text: Vec<String>,
    #[form_data(limit = "10MiB")]
    option_image: Vec<FieldData<NamedTempFile>>,
    option_existing: Vec<String>,
    explanation_text: Option<String>,
    #[form_data(limit = "10MiB")]
    explanation_image: Option<FieldData<NamedTempFile>>,
    explanation_existing: Option<String>,
    correct_answer: Option<usize>,
    categories: Vec<String>,
    difficulty: u8,
    action: Option<String>,
}

struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

struct PageView {
    number: Option<usize>,
    current: bool,
    href: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "questions/list.html")]
struct QuestionsPage {
    chrome: Chrome,
    view: ListView,
    search: String,
    categories: Vec<SelectOption>,
    difficulties: Vec<SelectOption>,
    pages: Vec<PageView>,
    previous_href: String,
    next_href: String,
    return_to: String,
    empty_message: &'static str,
}

struct OptionField {
    index: usize,
    label: char,
    text: String,
    preview: Option<String>,
    existing: String,
    correct: bool,
}

struct CategoryChoice {
    id: String,
    name: String,
    checked: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "questions/form.html")]
struct QuestionFormPage {
    chrome: Chrome,
    heading: &'static str,
    action: String,
    title_text: String,
    title_preview: Option<String>,
    title_existing: String,
    options: Vec<OptionField>,
    can_remove: bool,
    explanation_text: String,
    explanation_preview: Option<String>,
    explanation_existing: String,
    categories: Vec<CategoryChoice>,
    difficulties: Vec<SelectOption>,
    errors: Vec<String>,
}

/// Link back to the list with the given filters and page.
fn list_href(filters: &Filters, page: usize) -> String {
    let Ok(mut url) = Url::parse("http://console/questions") else {
        return "/questions".to_owned();
    };
    url.query_pairs_mut()
        .append_pair("search", &filters.search)
        .append_pair("category", &filters.category.as_param())
        .append_pair("difficulty", &filters.difficulty.as_param())
        .append_pair("page", &page.to_string());
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}

fn difficulty_options(selected: &str) -> Vec<SelectOption> {
    (1..=5u8)
        .map(|level| SelectOption {
            value: level.to_string(),
            label: format!("{level} · {}", difficulty_label(level)),
            selected: selected == level.to_string(),
        })
        .collect()
}

async fn ensure_loaded(state: &AppState, toasts: &mut Toasts) {
    if !state.questions.lock().await.is_loaded() {
        refresh(&state.api, &state.questions, toasts).await;
    }
}

async fn questions_page(
    State(state): State<AppState>,
    Operator(operator): Operator,
    Query(query): Query<ListQuery>,
) -> QuestionsPage {
    let mut toasts = Toasts::default();
    ensure_loaded(&state, &mut toasts).await;
    state.flash(toasts).await;
    let chrome = Chrome::new(&state, operator, "questions").await;

    let mut list = state.questions.lock().await;
    list.set_filters(Filters {
        search: query.search,
        category: query.category,
        difficulty: query.difficulty,
    });
    if let Some(page) = query.page {
        list.go_to_page(page);
    }
    let view = list.view();
    let filters = list.filters().clone();
    let category_param = filters.category.as_param();
    let categories = list
        .category_choices()
        .into_iter()
        .map(|name| SelectOption {
            selected: name == category_param,
            label: name.clone(),
            value: name,
        })
        .collect();
    drop(list);

    let pages = view
        .window
        .iter()
        .map(|link| PageView {
            number: link.number,
            current: link.current,
            href: link.number.map(|n| list_href(&filters, n)).unwrap_or_default(),
        })
        .collect();
    let empty_message = if view.total == 0 {
        "No questions yet. Add your first question."
    } else {
        "No questions match your filters."
    };
    QuestionsPage {
        chrome,
        search: filters.search.clone(),
        categories,
        difficulties: difficulty_options(&filters.difficulty.as_param()),
        pages,
        previous_href: list_href(&filters, view.page.saturating_sub(1).max(1)),
        next_href: list_href(&filters, (view.page + 1).min(view.total_pages.max(1))),
        return_to: list_href(&filters, view.page),
        empty_message,
        view,
    }
}

async fn toggle(
    State(state): State<AppState>,
    Operator(operator): Operator,
    Path(id): Path<String>,
    Form(action): Form<RowAction>,
) -> Response {
    let mut toasts = Toasts::default();
    toggle_approval(&state.api, &state.questions, Some(&operator), &id, &mut toasts).await;
    let to = back_to(action.return_to.as_deref(), "/questions");
    flash_redirect(&state, toasts, &to).await.into_response()
}

async fn delete(
    State(state): State<AppState>,
    Operator(_): Operator,
    Path(id): Path<String>,
    Form(action): Form<RowAction>,
) -> Response {
    let mut toasts = Toasts::default();
    delete_question(&state.api, &state.questions, &id, &mut toasts).await;
    let to = back_to(action.return_to.as_deref(), "/questions");
    flash_redirect(&state, toasts, &to).await.into_response()
}

async fn date_filter(
    State(state): State<AppState>,
    Operator(_): Operator,
    Form(form): Form<DateFilterForm>,
) -> Response {
    let mut toasts = Toasts::default();
    apply_date_filter(&state.api, &state.questions, form.from_date, form.to_date, &mut toasts).await;
    flash_redirect(&state, toasts, "/questions").await.into_response()
}

async fn date_filter_clear(State(state): State<AppState>, Operator(_): Operator) -> Response {
    let mut toasts = Toasts::default();
    clear_date_filter(&state.api, &state.questions, &mut toasts).await;
    flash_redirect(&state, toasts, "/questions").await.into_response()
}

async fn import(
    State(state): State<AppState>,
    Operator(_): Operator,
    TypedMultipart(form): TypedMultipart<ImportForm>,
) -> PageResult<Response> {
    let mut files = Vec::new();
    for field in form.file {
        let file_name = field.metadata.file_name.clone().unwrap_or_default();
        if file_name.is_empty() {
            continue;
        }
        let bytes = tokio::fs::read(field.contents.path()).await?;
        files.push(ImportFile { file_name, bytes });
    }
    let mut toasts = Toasts::default();
    import_questions(
        &state.api,
        &state.questions,
        files,
        &state.settings.import,
        &state.import_progress,
        &mut toasts,
    )
    .await;
    Ok(flash_redirect(&state, toasts, "/questions").await.into_response())
}

async fn import_progress(State(state): State<AppState>) -> Json<ImportProgress> {
    Json(*state.import_progress.borrow())
}

async fn export(State(state): State<AppState>, Operator(operator): Operator) -> PageResult<Response> {
    let mut toasts = Toasts::default();
    let Some(file) = export_questions(&state.api, Some(&operator), &mut toasts).await else {
        return Ok(flash_redirect(&state, toasts, "/questions").await.into_response());
    };
    state.flash(toasts).await;
    Ok(Response::builder()
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        )
        .body(Body::from(file.bytes))?)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn draft_from_form(form: QuestionForm) -> Result<(QuestionDraft, Option<String>), std::io::Error> {
    let mut option_images = form.option_image.into_iter();
    let mut option_existing = form.option_existing.into_iter();
    let mut options = Vec::with_capacity(form.option_text.len());
    for text in form.option_text {
        let upload = match option_images.next() {
            Some(field) => read_upload(field).await?,
            None => None,
        };
        options.push(MediaDraft {
            text,
            existing: non_empty(option_existing.next()),
            upload,
        });
    }
    let title_upload = match form.title_image {
        Some(field) => read_upload(field).await?,
        None => None,
    };
    let explanation_upload = match form.explanation_image {
        Some(field) => read_upload(field).await?,
        None => None,
    };
    let draft = QuestionDraft {
        title: MediaDraft {
            text: form.title_text,
            existing: non_empty(form.title_existing),
            upload: title_upload,
        },
        options,
        correct_answer: form.correct_answer.unwrap_or(0),
        explanation: MediaDraft {
            text: form.explanation_text.unwrap_or_default(),
            existing: non_empty(form.explanation_existing),
            upload: explanation_upload,
        },
        categories: form.categories,
        difficulty: form.difficulty,
    };
    Ok((draft, form.action))
}

/// Applies an add/remove option button. Returns false for the plain save button.
fn apply_option_action(draft: &mut QuestionDraft, action: Option<&str>) -> bool {
    match action {
        Some("add-option") => {
            draft.add_option();
            true
        }
        Some(action) => match action.strip_prefix("remove-option-").and_then(|i| i.parse().ok()) {
            Some(index) => {
                draft.remove_option(index);
                true
            }
            None => false,
        },
        None => false,
    }
}

async fn form_categories(state: &AppState, toasts: &mut Toasts) -> Vec<Category> {
    let cached = state.questions.lock().await.categories().to_vec();
    if !cached.is_empty() {
        return cached;
    }
    match state.api.list_categories().await {
        Ok(categories) => {
            state.questions.lock().await.set_categories(categories.clone());
            categories
        }
        Err(err) => {
            toasts.error(err.message_or("Failed to load categories"));
            Vec::new()
        }
    }
}

async fn form_page(
    state: &AppState,
    operator: crate::session::Session,
    heading: &'static str,
    action: String,
    draft: &QuestionDraft,
    errors: Vec<String>,
) -> QuestionFormPage {
    let mut toasts = Toasts::default();
    let categories = form_categories(state, &mut toasts).await;
    state.flash(toasts).await;
    QuestionFormPage {
        chrome: Chrome::new(state, operator, "questions").await,
        heading,
        action,
        title_text: draft.title.text.clone(),
        title_preview: draft.title.preview(),
        title_existing: draft.title.existing.clone().unwrap_or_default(),
        options: draft
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| OptionField {
                index,
                label: option_label(index),
                text: option.text.clone(),
                preview: option.preview(),
                existing: option.existing.clone().unwrap_or_default(),
                correct: index == draft.correct_answer,
            })
            .collect(),
        can_remove: draft.options.len() > MIN_OPTIONS,
        explanation_text: draft.explanation.text.clone(),
        explanation_preview: draft.explanation.preview(),
        explanation_existing: draft.explanation.existing.clone().unwrap_or_default(),
        categories: categories
            .into_iter()
            .map(|c| CategoryChoice {
                checked: draft.categories.contains(&c.id),
                id: c.id,
                name: c.name,
            })
            .collect(),
        difficulties: difficulty_options(&draft.difficulty.to_string()),
        errors,
    }
}

fn validation_messages(err: &FormError) -> Vec<String> {
    err.validation()
        .map(|errors| errors.messages().to_vec())
        .unwrap_or_default()
}

async fn new_question_form(State(state): State<AppState>, Operator(operator): Operator) -> QuestionFormPage {
    form_page(&state, operator, "Add question", "/questions/new".into(), &QuestionDraft::new(), Vec::new()).await
}

async fn create(
    State(state): State<AppState>,
    Operator(operator): Operator,
    TypedMultipart(form): TypedMultipart<QuestionForm>,
) -> PageResult<Response> {
    let (mut draft, action) = draft_from_form(form).await?;
    let action_url = "/questions/new".to_owned();
    if apply_option_action(&mut draft, action.as_deref()) {
        return Ok(form_page(&state, operator, "Add question", action_url, &draft, Vec::new())
            .await
            .into_response());
    }
    let mut toasts = Toasts::default();
    match submit_create(&state.api, &state.questions, &draft, &mut toasts).await {
        Ok(_) => Ok(flash_redirect(&state, toasts, "/questions").await.into_response()),
        Err(err) => {
            let errors = validation_messages(&err);
            if errors.is_empty() {
                state.flash(toasts).await;
            }
            Ok(form_page(&state, operator, "Add question", action_url, &draft, errors)
                .await
                .into_response())
        }
    }
}

async fn find_question(state: &AppState, id: &str) -> Result<Question, ApiError> {
    if let Some(question) = state.questions.lock().await.find(id).cloned() {
        return Ok(question);
    }
    state.api.get_question(id).await
}

async fn edit_question_form(
    State(state): State<AppState>,
    Operator(operator): Operator,
    Path(id): Path<String>,
) -> PageResult<QuestionFormPage> {
    let question = find_question(&state, &id).await?;
    let draft = QuestionDraft::from_question(&question);
    Ok(form_page(&state, operator, "Edit question", format!("/questions/{id}/edit"), &draft, Vec::new()).await)
}

async fn update(
    State(state): State<AppState>,
    Operator(operator): Operator,
    Path(id): Path<String>,
    TypedMultipart(form): TypedMultipart<QuestionForm>,
) -> PageResult<Response> {
    let original = find_question(&state, &id).await?;
    let (mut draft, action) = draft_from_form(form).await?;
    let action_url = format!("/questions/{id}/edit");
    if apply_option_action(&mut draft, action.as_deref()) {
        return Ok(form_page(&state, operator, "Edit question", action_url, &draft, Vec::new())
            .await
            .into_response());
    }
    let mut toasts = Toasts::default();
    match submit_update(&state.api, &state.questions, &original, &draft, &mut toasts).await {
        Ok(_) => Ok(flash_redirect(&state, toasts, "/questions").await.into_response()),
        Err(err) => {
            let errors = validation_messages(&err);
            if errors.is_empty() {
                state.flash(toasts).await;
            }
            Ok(form_page(&state, operator, "Edit question", action_url, &draft, errors)
                .await
                .into_response())
        }
    }
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(questions_page))
        .route("/questions/new", get(new_question_form).post(create))
        .route("/questions/{id}/edit", get(edit_question_form).post(update))
        .route("/questions/{id}/delete", post(delete))
        .route("/questions/{id}/approval", post(toggle))
        .route("/questions/date-filter", post(date_filter))
        .route("/questions/date-filter/clear", post(date_filter_clear))
        .route("/questions/import", post(import))
        .route("/questions/import/progress", get(import_progress))
        .route("/questions/export", get(export))
        .with_state(state)
}
