//! Token attachment, refresh and session expiry

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use chrono::TimeDelta;
use common::*;
use pretty_assertions::assert_eq;
use propdesk_client::{ApiClient, MemorySessionStore, SessionManager};
use propdesk_core::{ApiConfig, Error, Listing, ListingQuery, ListingStatus, RejectForm};
use rstest::rstest;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, ResponseTemplate,
};

async fn mount_listings_for(api: &TestApi, token: &str) {
    Mock::given(method("GET"))
        .and(path("/admin/listings"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(vec![listing_json("pending")], 1, 1)),
        )
        .mount(&api.server)
        .await;
}

async fn mount_rejected_token(api: &TestApi, token: &str) {
    Mock::given(method("GET"))
        .and(path("/admin/listings"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(401))
        .mount(&api.server)
        .await;
}

#[tokio::test]
async fn test_no_session_fails_without_a_request() {
    let api = TestApi::anonymous().await;

    let err = api.client.list_listings(&ListingQuery::new()).await.unwrap_err();

    assert!(matches!(err, Error::Unauthenticated));
    assert!(api.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthorized_response_refreshes_and_retries_once() {
    let api = TestApi::signed_in("old").await;
    mount_rejected_token(&api, "old").await;
    mount_listings_for(&api, "new").await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refresh_token": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("new", false)))
        .expect(1)
        .mount(&api.server)
        .await;

    let page = api.client.list_listings(&ListingQuery::new()).await.unwrap();

    assert_eq!(page.data.len(), 1);
    let session = api.client.session().current().unwrap();
    assert_eq!(session.access_token, "new");
    assert_eq!(session.refresh_token, "new-refresh");
    assert_eq!(session.user, admin());
}

#[tokio::test]
async fn test_second_unauthorized_response_expires_session() {
    let api = TestApi::signed_in("old").await;
    mount_rejected_token(&api, "old").await;
    mount_rejected_token(&api, "new").await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("new", false)))
        .expect(1)
        .mount(&api.server)
        .await;

    let err = api.client.list_listings(&ListingQuery::new()).await.unwrap_err();

    assert!(matches!(err, Error::SessionExpired));
    assert!(!api.client.session().is_authenticated());
}

#[rstest]
#[case::bad_request(400)]
#[case::unauthorized(401)]
#[case::forbidden(403)]
#[tokio::test]
async fn test_refused_refresh_expires_session(#[case] status: u16) {
    let api = TestApi::signed_in("old").await;
    mount_rejected_token(&api, "old").await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"message": "revoked"})))
        .expect(1)
        .mount(&api.server)
        .await;

    let err = api.client.list_listings(&ListingQuery::new()).await.unwrap_err();

    assert!(matches!(err, Error::SessionExpired));
    assert!(!api.client.session().is_authenticated());
}

#[tokio::test]
async fn test_refresh_server_error_keeps_session() {
    let api = TestApi::signed_in("old").await;
    mount_rejected_token(&api, "old").await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&api.server)
        .await;

    let err = api.client.list_listings(&ListingQuery::new()).await.unwrap_err();

    assert!(matches!(err, Error::Api { status: 503, .. }));
    assert_eq!(api.client.session().access_token().as_deref(), Some("old"));
}

#[tokio::test]
async fn test_unreachable_refresh_keeps_session() {
    let closed_port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let manager = Arc::new(SessionManager::new(MemorySessionStore::with_session(session(
        "old",
        TimeDelta::seconds(5),
    ))));
    manager.restore();
    let client = ApiClient::new(
        &ApiConfig::with_base_url(format!("http://127.0.0.1:{closed_port}")),
        manager,
    )
    .unwrap();

    let err = client.list_listings(&ListingQuery::new()).await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "{err:?}");
    let session = client.session().current().unwrap();
    assert_eq!(session.access_token, "old");
    assert_eq!(session.refresh_token, "refresh-1");
}

#[tokio::test]
async fn test_retry_resends_method_and_body() {
    let api = TestApi::signed_in("old").await;
    let listing: Listing = serde_json::from_value(listing_json("pending")).unwrap();
    let reject_path = format!("/admin/listings/{LISTING_ID}/reject");
    let reason = json!({"reason": "Photos do not match the address"});

    Mock::given(method("POST"))
        .and(path(reject_path.as_str()))
        .and(header("authorization", "Bearer old"))
        .and(body_json(reason.clone()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("POST"))
        .and(path(reject_path.as_str()))
        .and(header("authorization", "Bearer new"))
        .and(body_json(reason))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_json("rejected")))
        .expect(1)
        .mount(&api.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("new", false)))
        .expect(1)
        .mount(&api.server)
        .await;

    let form = RejectForm::new("  Photos do not match the address ");
    let updated = api.client.reject_listing(&listing, &form).await.unwrap();

    assert_eq!(updated.status, ListingStatus::Rejected);
}

#[tokio::test]
async fn test_refresh_does_not_revive_a_cleared_session() {
    let api = TestApi::with_session(session("old", TimeDelta::seconds(5))).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(tokens_json("new", false))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&api.server)
        .await;

    let query = ListingQuery::new();
    let (result, ()) = tokio::join!(api.client.list_listings(&query), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        api.client.session().clear();
    });

    assert!(matches!(result, Err(Error::SessionExpired)));
    assert!(!api.client.session().is_authenticated());
    let requests = api.server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() == "/auth/refresh"));
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_refresh_once() {
    let api = TestApi::signed_in("old").await;
    mount_rejected_token(&api, "old").await;
    mount_listings_for(&api, "new").await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(tokens_json("new", false))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&api.server)
        .await;

    let query = ListingQuery::new();
    let (first, second, third) = tokio::join!(
        api.client.list_listings(&query),
        api.client.list_listings(&query),
        api.client.list_listings(&query),
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert!(third.is_ok());
    assert_eq!(api.client.session().access_token().as_deref(), Some("new"));
}

#[tokio::test]
async fn test_expiring_token_is_refreshed_before_sending() {
    let api = TestApi::with_session(session("old", TimeDelta::seconds(5))).await;
    mount_listings_for(&api, "new").await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("new", false)))
        .expect(1)
        .mount(&api.server)
        .await;

    api.client.list_listings(&ListingQuery::new()).await.unwrap();

    let requests = api.server.received_requests().await.unwrap();
    let listing_calls: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path() == "/admin/listings")
        .collect();
    assert_eq!(listing_calls.len(), 1);
    assert_eq!(
        listing_calls[0]
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap(),
        "Bearer new"
    );
}
