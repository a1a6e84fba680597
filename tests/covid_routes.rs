// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! County visualizer routes against a mocked case CSV.

use axum::http::StatusCode;
use portfolio_server::config::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

const CSV: &str = "\
UID,iso2,iso3,code3,FIPS,Admin2,Province_State,Country_Region,Lat,Long_,Combined_Key,1/22/20,1/23/20,1/24/20
84006085,US,USA,840,6085.0,Santa Clara,California,US,37.23,-121.69,\"Santa Clara, California, US\",0,2,7
84006081,US,USA,840,6081.0,San Mateo,California,US,37.42,-122.32,\"San Mateo, California, US\",1,1,4
84041051,US,USA,840,41051.0,Multnomah,Oregon,US,45.54,-122.41,\"Multnomah, Oregon, US\",0,0,3
";

async fn app_with_csv(server: &MockServer) -> axum::Router {
    Mock::given(method("GET"))
        .and(path("/confirmed_US.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV))
        .mount(server)
        .await;

    let config = Config {
        covid_csv_url: format!("{}/confirmed_US.csv", server.uri()),
        ..Config::default()
    };
    common::create_test_app_with(config).0
}

#[tokio::test]
async fn test_home_lists_states_and_locations() {
    let server = MockServer::start().await;
    let app = app_with_csv(&server).await;

    let response = common::get(app, "/covid-by-county/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = common::body_text(response).await;
    assert!(html.contains(r#"<option value="California">California</option>"#));
    assert!(html.contains(r#"<option value="Oregon">Oregon</option>"#));
    assert!(html.contains("Santa Clara, California, US"));
    assert!(!html.contains("Plotly.newPlot"));
}

#[tokio::test]
async fn test_graph_embeds_daily_new_cases() {
    let server = MockServer::start().await;
    let app = app_with_csv(&server).await;

    let response = common::get(app, "/covid-by-county/graph?county=Santa%20Clara&state=California").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = common::body_text(response).await;
    assert!(html.contains("Plotly.newPlot('chart'"));
    assert!(html.contains(r#""y":[null,2,5]"#));
    assert!(html.contains(r#""name":"Santa Clara, California, US""#));
}

#[tokio::test]
async fn test_graph_unknown_pair_has_no_series() {
    let server = MockServer::start().await;
    let app = app_with_csv(&server).await;

    let response = common::get(app, "/covid-by-county/graph?county=Santa%20Clara&state=Oregon").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = common::body_text(response).await;
    assert!(html.contains(r#"var graph = {"data":[]"#));
}

#[tokio::test]
async fn test_graph_requires_both_parameters() {
    let server = MockServer::start().await;
    let app = app_with_csv(&server).await;

    let response = common::get(app, "/covid-by-county/graph?county=Santa%20Clara").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = Config {
        covid_csv_url: format!("{}/confirmed_US.csv", server.uri()),
        ..Config::default()
    };
    let (app, _) = common::create_test_app_with(config);

    let response = common::get(app, "/covid-by-county").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
