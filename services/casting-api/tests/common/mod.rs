#![allow(dead_code)]

use axum::body::Body;
use casting_api::app::{AppState, build_router};
use casting_api::store::CastingStore;
use casting_api::store::memory::InMemoryStore;
use casting_authz::test_support::{
    StaticKeyProvider, TEST_AUDIENCE, TEST_DOMAIN, TEST_KID, claims_with_permissions, mint_token,
    test_jwks,
};
use casting_authz::{AuthConfig, Authorizer, KeyProvider, TokenVerifier};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type App = axum::routing::RouterIntoService<Body, ()>;

pub struct TestApp {
    pub app: App,
    pub store: Arc<InMemoryStore>,
    pub key_fetches: Arc<AtomicUsize>,
}

impl TestApp {
    pub fn key_fetch_count(&self) -> usize {
        self.key_fetches.load(Ordering::SeqCst)
    }
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn app_with(config: AuthConfig, provider: Arc<dyn KeyProvider>) -> (App, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let state = AppState {
        store: store.clone() as Arc<dyn CastingStore>,
        authorizer: Authorizer::new(TokenVerifier::new(config, provider)),
    };
    (build_router(state).into_service(), store)
}

/// Router over an empty in-memory store that trusts the test signing key.
pub fn test_app() -> TestApp {
    let provider = StaticKeyProvider::new(test_jwks());
    let key_fetches = provider.call_counter();
    let (app, store) = app_with(
        AuthConfig::new(TEST_DOMAIN, TEST_AUDIENCE),
        Arc::new(provider),
    );
    TestApp {
        app,
        store,
        key_fetches,
    }
}

/// A signed token granting exactly `permissions`.
pub fn token_with(permissions: &[&str]) -> String {
    mint_token(&claims_with_permissions(permissions), Some(TEST_KID))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub const ALL_PERMISSIONS: [&str; 8] = [
    "get:movies",
    "post:movies",
    "patch:movies",
    "delete:movies",
    "get:actors",
    "post:actors",
    "patch:actors",
    "delete:actors",
];

/// Token holding every permission the API knows about.
pub fn admin_token() -> String {
    token_with(&ALL_PERMISSIONS)
}
