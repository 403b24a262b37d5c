//! Shared setup for itemgate integration tests
//!
//! Builds the full router (schema gate, identity middleware, Problem
//! rendering) over an [`InMemoryItemStore`] and a key set loaded from
//! `tests/fixtures/jwks.json`. Tokens are signed with the matching fixture
//! key.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use itemgate_server::{
    api::{self, AppState},
    auth::{Claims, JwksCache, TokenVerifier},
    config::Config,
    contract::ApiContract,
    db::InMemoryItemStore,
};
use jsonwebtoken::{encode, jwk::JwkSet, Algorithm, EncodingKey, Header};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const ISSUER: &str = "https://issuer.test/oauth/v4/tenant";
pub const KID: &str = "test-key";
pub const SIGNING_KEY: &str = include_str!("../fixtures/signing_key.pem");
pub const FOREIGN_KEY: &str = include_str!("../fixtures/foreign_key.pem");
pub const JWKS: &str = include_str!("../fixtures/jwks.json");

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryItemStore>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.token.issuer_url = ISSUER.to_string();
    config
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config())
}

pub fn setup_test_app_with(config: Config) -> TestApp {
    let key_set: JwkSet = serde_json::from_str(JWKS).expect("fixture JWKS parses");
    let keys = Arc::new(JwksCache::from_static(key_set));
    let store = Arc::new(InMemoryItemStore::new());

    let state = AppState {
        items: store.clone(),
        verifier: Arc::new(TokenVerifier::new(keys, ISSUER)),
        contract: Arc::new(ApiContract::embedded().expect("embedded contract loads")),
    };

    TestApp {
        router: api::create_router(state, &config),
        store,
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// A caller with a fresh UUID subject
pub struct Caller {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl Caller {
    pub fn new(email: &str) -> Self {
        let id = Uuid::new_v4();
        let token = sign(&claims(&id.to_string(), email), SIGNING_KEY);
        Self {
            id,
            email: email.to_string(),
            token,
        }
    }
}

pub fn claims(sub: &str, email: &str) -> Claims {
    let now = chrono::Utc::now().timestamp() as u64;
    Claims {
        sub: sub.to_string(),
        email: email.to_string(),
        iss: ISSUER.to_string(),
        exp: now + 600,
        iat: Some(now),
    }
}

pub fn sign(claims: &Claims, pem: &str) -> String {
    sign_value(claims, pem)
}

/// Sign arbitrary claims, for tokens carrying fields [`Claims`] does not model
pub fn sign_value<T: serde::Serialize>(claims: &T, pem: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key parses");
    encode(&header, claims, &key).expect("token signs")
}

// ============================================================================
// Requests
// ============================================================================

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, caller: &Caller) -> TestResponse {
        self.send(request(Method::GET, uri, Some(&caller.token), None)).await
    }

    pub async fn post(&self, uri: &str, caller: &Caller, body: Value) -> TestResponse {
        self.send(request(Method::POST, uri, Some(&caller.token), Some(&body))).await
    }

    pub async fn put(&self, uri: &str, caller: &Caller, body: Value) -> TestResponse {
        self.send(request(Method::PUT, uri, Some(&caller.token), Some(&body))).await
    }

    pub async fn delete(&self, uri: &str, caller: &Caller) -> TestResponse {
        self.send(request(Method::DELETE, uri, Some(&caller.token), None)).await
    }
}

/// Fields of every violation in a Problem body, in order
pub fn violation_fields(body: &Value) -> Vec<String> {
    body["violations"]
        .as_array()
        .map(|violations| {
            violations
                .iter()
                .filter_map(|v| v["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
