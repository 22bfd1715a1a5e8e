//! Common test utilities for the client integration tests

#![allow(dead_code, clippy::expect_used)]

use chrono::{TimeDelta, Utc};
use propdesk_client::{ApiClient, MemorySessionStore, SessionManager};
use propdesk_core::{AdminRole, AdminUser, ApiConfig, Session};
use std::sync::Arc;
use uuid::Uuid;
use wiremock::MockServer;

pub mod fixtures;

pub use fixtures::*;

/// Mock API server plus a client pointed at it
pub struct TestApi {
    pub server: MockServer,
    pub client: ApiClient,
}

impl TestApi {
    /// Client with no session
    pub async fn anonymous() -> Self {
        Self::with_store(MemorySessionStore::new()).await
    }

    /// Client signed in with a token valid for another fifteen minutes
    pub async fn signed_in(access_token: &str) -> Self {
        Self::with_session(session(access_token, TimeDelta::minutes(15))).await
    }

    /// Client restored from `session`
    pub async fn with_session(session: Session) -> Self {
        Self::with_store(MemorySessionStore::with_session(session)).await
    }

    async fn with_store(store: MemorySessionStore) -> Self {
        let server = MockServer::start().await;
        let manager = Arc::new(SessionManager::new(store));
        manager.restore();

        let client = ApiClient::new(&ApiConfig::with_base_url(server.uri()), manager)
            .expect("client should build against the mock server");

        Self { server, client }
    }
}

/// Administrator used across the tests
pub fn admin() -> AdminUser {
    AdminUser {
        id: Uuid::from_u128(7),
        email: "moderator@propdesk.test".to_string(),
        name: "Mia Moderator".to_string(),
        role: AdminRole::Moderator,
    }
}

/// Session whose access token expires `valid_for` from now
pub fn session(access_token: &str, valid_for: TimeDelta) -> Session {
    Session {
        access_token: access_token.to_string(),
        refresh_token: "refresh-1".to_string(),
        expires_at: Utc::now() + valid_for,
        user: admin(),
    }
}
