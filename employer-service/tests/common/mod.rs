//! Shared harness for employer-service integration tests.
//!
//! Everything runs in memory: accounts and jobs live in an `InMemoryStore`,
//! deliveries are captured by the mock providers and time is a `MockClock`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use employer_service::{
    build_router,
    config::{JwtConfig, RateLimitConfig, SecurityConfig},
    dtos::account::{SignupRequest, VerifyEmailRequest, VerifyMobileRequest},
    models::Account,
    services::{
        providers::{MockEmailProvider, MockMobileVerifier},
        AccountStore, InMemoryStore, MockClock,
    },
    AppState, Dependencies,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub email: Arc<MockEmailProvider>,
    pub mobile: Arc<MockMobileVerifier>,
    pub clock: Arc<MockClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_rate_limit(RateLimitConfig {
            signup_attempts: 1000,
            signup_window_seconds: 60,
            verify_attempts: 1000,
            verify_window_seconds: 60,
        })
    }

    pub fn with_rate_limit(rate_limit: RateLimitConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let email = Arc::new(MockEmailProvider::new(true));
        let mobile = Arc::new(MockMobileVerifier::new(true));
        let clock = Arc::new(MockClock::default());

        let state = AppState::new(
            Dependencies {
                accounts: store.clone(),
                jobs: store.clone(),
                email: email.clone(),
                mobile: mobile.clone(),
                clock: clock.clone(),
            },
            &JwtConfig {
                secret: TEST_SECRET.to_string(),
                expiry_minutes: 60,
            },
            &SecurityConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            &rate_limit,
        );

        Self {
            state,
            store,
            email,
            mobile,
            clock,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn account(&self, id: &str) -> Account {
        self.store
            .find_account_by_id(id)
            .await
            .unwrap()
            .expect("account should exist")
    }

    /// Register through the service layer and return the new account.
    pub async fn register(&self, email: &str, phone: &str) -> Account {
        self.state
            .accounts
            .register(signup_request(email, phone))
            .await
            .expect("registration should succeed")
    }

    pub async fn verify_email(&self, email: &str) -> String {
        let otp = self.email.last_code_for(email).expect("email code sent");
        self.state
            .accounts
            .submit_email_code(VerifyEmailRequest {
                email: email.to_string(),
                otp,
            })
            .await
            .expect("email verification should succeed")
    }

    pub async fn verify_mobile(&self, phone: &str) -> String {
        let otp = self.mobile.code_for(phone).expect("mobile code sent");
        self.state
            .accounts
            .submit_mobile_code(VerifyMobileRequest {
                phone_no: phone.to_string(),
                otp,
            })
            .await
            .expect("mobile verification should succeed")
    }

    /// Register and confirm both channels. Returns the account and the
    /// latest session token.
    pub async fn fully_verified(&self, email: &str, phone: &str) -> (Account, String) {
        let account = self.register(email, phone).await;
        self.verify_email(email).await;
        let token = self.verify_mobile(phone).await;
        (self.account(&account.id).await, token)
    }

    pub async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}

pub fn signup_request(email: &str, phone: &str) -> SignupRequest {
    SignupRequest {
        name: "Asha Rao".to_string(),
        phone_no: phone.to_string(),
        company_name: "Acme Labs".to_string(),
        company_email: email.to_string(),
        employee_size: 50,
    }
}

pub fn signup_body(email: &str, phone: &str) -> Value {
    serde_json::json!({
        "name": "Asha Rao",
        "phoneNo": phone,
        "companyName": "Acme Labs",
        "companyEmail": email,
        "employeeSize": 50
    })
}
