use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use secrecy::SecretString;
use serde::Deserialize;

use crate::health::GateState;
use crate::listing::refresh;
use crate::models::difficulty_label;
use crate::server::app::AppState;
use crate::session::{self, LoginError};
use crate::toast::{Toast, Toasts};

use super::{flash_redirect, Chrome, Operator, PageResult};

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    email: String,
    password: SecretString,
}

#[derive(Template, WebTemplate)]
#[template(path = "loading.html")]
struct LoadingPage {
    message: &'static str,
    failed: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
struct LoginPage {
    email: String,
    error: Option<String>,
    toasts: Vec<Toast>,
}

struct DifficultyCount {
    label: &'static str,
    count: usize,
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
struct DashboardPage {
    chrome: Chrome,
    total: usize,
    approved: usize,
    pending: usize,
    categories: usize,
    by_difficulty: Vec<DifficultyCount>,
}

async fn index(State(state): State<AppState>) -> Response {
    let gate = *state.gate.borrow();
    if !gate.is_ready() {
        return LoadingPage {
            message: gate.message,
            failed: gate.state == GateState::Failed,
        }
        .into_response();
    }
    if state.store.session().is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    LoginPage {
        email: String::new(),
        error: None,
        toasts: state.toasts.lock().await.drain(),
    }
    .into_response()
}

async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match session::login(&state.api, &state.store, &form.email, &form.password).await {
        Ok(operator) => {
            let mut toasts = Toasts::default();
            toasts.success(format!("Welcome back, {}!", operator.username));
            flash_redirect(&state, toasts, "/dashboard").await.into_response()
        }
        Err(err) => {
            if let LoginError::Store(inner) = &err {
                tracing::error!(error = %inner, "Cannot persist session");
            } else {
                tracing::warn!(email = %form.email, error = %err, "Login failed");
            }
            LoginPage {
                email: form.email,
                error: Some(err.to_string()),
                toasts: Vec::new(),
            }
            .into_response()
        }
    }
}

async fn logout(State(state): State<AppState>) -> PageResult<Redirect> {
    session::logout(&state.store)?;
    *state.questions.lock().await = crate::listing::QuestionList::new(state.settings.page_size);
    Ok(Redirect::to("/"))
}

async fn dashboard(State(state): State<AppState>, Operator(operator): Operator) -> DashboardPage {
    let mut toasts = Toasts::default();
    if !state.questions.lock().await.is_loaded() {
        refresh(&state.api, &state.questions, &mut toasts).await;
    }
    state.flash(toasts).await;
    let chrome = Chrome::new(&state, operator, "dashboard").await;

    let list = state.questions.lock().await;
    let questions = list.questions();
    let approved = questions.iter().filter(|q| q.is_approved).count();
    let by_difficulty = (1..=5)
        .map(|level| DifficultyCount {
            label: difficulty_label(level),
            count: questions.iter().filter(|q| q.difficulty == level).count(),
        })
        .collect();
    DashboardPage {
        chrome,
        total: questions.len(),
        approved,
        pending: questions.len() - approved,
        categories: list.categories().len(),
        by_difficulty,
    }
}

pub fn auth_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(login))
        .route("/logout", get(logout).post(logout))
        .route("/dashboard", get(dashboard))
        .with_state(state)
}
