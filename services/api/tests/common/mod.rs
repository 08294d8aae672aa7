#![allow(dead_code)]

use api_lib::web::{build_router, state::AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderValue, Request, StatusCode},
    Router,
};
use classroom_core::{InMemoryStore, Role, User};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt; // not axum::ServiceExt

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = Arc::new(AppState::from_store(store.clone()));
        let router = build_router(state, HeaderValue::from_static("http://localhost:5173"));
        Self { store, router }
    }

    /// Creates a user and issues a bearer token named after the username.
    pub async fn user(&self, username: &str, role: Role) -> User {
        let user = self.store.add_user(username, username, role).await;
        self.store.issue_token(&token_for(username), user.id).await;
        user
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        as_user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(username) = as_user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(username)));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }
}

pub fn token_for(username: &str) -> String {
    format!("token-{username}")
}
