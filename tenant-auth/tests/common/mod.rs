//! Test helpers for tenant-auth integration tests.
//!
//! Drives the full router in-process against the in-memory credential store
//! and the recording mailer.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tenant_auth::{
    build_router,
    config::AuthConfig,
    models::{CompanyRole, NewUser, User},
    services::{CredentialStore, InMemoryStore, MockEmailService},
    AppState,
};
use tower::util::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub mailer: MockEmailService,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_config(AuthConfig::default())
    }

    pub fn with_config(mut config: AuthConfig) -> Self {
        config.log_level = "error".to_string();
        let store = Arc::new(InMemoryStore::new());
        let mailer = MockEmailService::new();
        let state = AppState::new(config, store.clone(), Arc::new(mailer.clone()), None);

        Self {
            router: build_router(state.clone()),
            state,
            store,
            mailer,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn create_user(&self, email: &str, selected_company_id: Option<i32>) -> User {
        self.store
            .create_user(NewUser {
                email: email.to_string(),
                name: email.split('@').next().unwrap_or(email).to_string(),
                selected_company_id,
            })
            .await
            .unwrap()
    }

    /// Full OTP round trip for `email`; returns the bearer token.
    pub async fn login(&self, email: &str) -> String {
        let res = self
            .post("/auth/otp", None, serde_json::json!({ "email": email }))
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let code = self
            .mailer
            .last_code_for(email)
            .unwrap_or_else(|| self.state.config.otp.test_code.clone());
        let res = self
            .post(
                "/auth/login",
                None,
                serde_json::json!({ "email": email, "code": code }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        json_body(res).await["token"].as_str().unwrap().to_string()
    }

    /// Create a user, log them in and have them create a company.
    /// Returns `(token, user_id, company_id)`.
    pub async fn owner_with_company(&self, email: &str, company: &str) -> (String, i32, i32) {
        let user = self.create_user(email, None).await;
        let token = self.login(email).await;
        let res = self
            .post(
                "/companies",
                Some(&token),
                serde_json::json!({ "name": company }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let company_id = json_body(res).await["id"].as_i64().unwrap() as i32;
        (token, user.id, company_id)
    }

    pub async fn add_member(&self, company_id: i32, user_id: i32, role: CompanyRole) {
        self.store
            .add_user_to_company(company_id, user_id, role)
            .await
            .unwrap();
    }
}

pub async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
