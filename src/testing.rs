//! Helpers shared by unit tests: a throwaway backend served by axum on an
//! ephemeral port, plus a few canned records.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::api::ApiClient;
use crate::models::{Question, Role};
use crate::session::Session;

pub struct FakeBackend {
    addr: SocketAddr,
}

impl FakeBackend {
    pub async fn start(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        FakeBackend { addr }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.url(), Duration::from_secs(5)).unwrap()
    }
}

/// Client pointed at a port nothing listens on.
pub fn unreachable_client() -> ApiClient {
    ApiClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap()
}

pub fn question_json(id: &str, title: &str, categories: Value, difficulty: u8) -> Value {
    json!({
        "_id": id,
        "title": {"text": title},
        "options": [{"text": "one"}, {"text": "two"}, {"text": "three"}, {"text": "four"}],
        "correctAnswer": 0,
        "difficulty": difficulty,
        "categories": categories,
        "isApproved": false,
        "approvedBy": null
    })
}

pub fn question(id: &str, title: &str, categories: Value, difficulty: u8) -> Question {
    serde_json::from_value(question_json(id, title, categories, difficulty)).unwrap()
}

pub fn admin_session() -> Session {
    Session {
        id: "admin-1".into(),
        username: "granny".into(),
        email: "admin@quizgranny.com".into(),
        role: Role::Admin,
    }
}

pub fn user_session() -> Session {
    Session {
        id: "user-7".into(),
        username: "helper".into(),
        email: "helper@quizgranny.com".into(),
        role: Role::User,
    }
}
