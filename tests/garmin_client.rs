// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Garmin Connect client against a mocked SSO and API server.

use portfolio_server::services::garmin::{Endpoints, GarminClient, GarminError};
use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACTIVITIES_PATH: &str = "/activitylist-service/activities/search/activities";

fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints {
        sso_base: format!("{}/sso", server.uri()),
        api_base: server.uri(),
        consumer_url: format!("{}/oauth_consumer.json", server.uri()),
    }
}

async fn mount_login(server: &MockServer, signin_title: &str) {
    Mock::given(method("GET"))
        .and(path("/sso/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sso/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<form><input type="hidden" name="_csrf" value="csrf-token-1"></form>"#,
        ))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sso/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><head><title>{signin_title}</title></head><script>var u = "https://sso.garmin.com/sso/embed?ticket=ST-0001-abc";</script></html>"#
        )))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth_consumer.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "consumer_key": "ck",
            "consumer_secret": "cs"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth-service/oauth/preauthorized"))
        .and(query_param("ticket", "ST-0001-abc"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("oauth_token=ot&oauth_token_secret=os"),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth-service/oauth/exchange/user/2.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "bearer-1",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_then_page_until_failure() {
    let server = MockServer::start().await;
    mount_login(&server, "Success").await;

    Mock::given(method("GET"))
        .and(path(ACTIVITIES_PATH))
        .and(query_param("start", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"activityId": 1}, {"activityId": 2}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ACTIVITIES_PATH))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    // Never reached once the second page fails.
    Mock::given(method("GET"))
        .and(path(ACTIVITIES_PATH))
        .and(query_param("start", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"activityId": 5}])))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = GarminClient::with_endpoints(endpoints(&server)).unwrap();
    client.login("me@example.com", "secret").await.unwrap();
    assert!(client.is_authenticated());

    let activities = client.fetch_pages(2, 5).await;
    let ids: Vec<_> = activities.iter().map(|a| a["activityId"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn test_login_rejects_mfa() {
    let server = MockServer::start().await;
    mount_login(&server, "Enter MFA code for login").await;

    let mut client = GarminClient::with_endpoints(endpoints(&server)).unwrap();
    let err = client.login("me@example.com", "secret").await.unwrap_err();

    assert!(matches!(err, GarminError::Auth(_)));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_unauthenticated_fetch_returns_nothing() {
    let server = MockServer::start().await;
    let client = GarminClient::with_endpoints(endpoints(&server)).unwrap();

    assert!(client.fetch_pages(1000, 5).await.is_empty());
}
