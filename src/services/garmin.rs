// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Garmin Connect client: SSO login and paged activity listing.

use crate::models::Record;
use crate::services::oauth1::{parse_token_response, Consumer, Signer, TokenCredentials};
use regex::Regex;
use reqwest::header::{AUTHORIZATION, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// User agent for SSO and Connect API requests.
const API_USER_AGENT: &str = "GCM-iOS-5.7.2.1";

/// User agent for the OAuth token endpoints.
const MOBILE_USER_AGENT: &str = "com.garmin.android.apps.connectmobile";

/// Public consumer credentials used by Garmin's mobile clients.
const OAUTH_CONSUMER_URL: &str = "https://thegarth.s3.amazonaws.com/oauth_consumer.json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Activities per page; the listing endpoint caps `limit` at this value.
pub const PAGE_SIZE: usize = 1000;

/// Pages fetched per run.
pub const MAX_PAGES: usize = 5;

static CSRF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="_csrf"\s+value="([^"]+)""#).expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>([^<]+)</title>").expect("valid regex"));
static TICKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"embed\?ticket=([^"]+)""#).expect("valid regex"));

#[derive(Debug, thiserror::Error)]
pub enum GarminError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Rate limited by Garmin Connect")]
    RateLimited,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GarminError {
    fn invalid(msg: impl Into<String>) -> Self {
        GarminError::InvalidResponse(msg.into())
    }
}

/// Bearer token returned by the OAuth2 exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl OAuth2Token {
    fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Endpoint roots, overridable for tests.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// e.g. `https://sso.garmin.com/sso`
    pub sso_base: String,
    /// e.g. `https://connectapi.garmin.com`
    pub api_base: String,
    pub consumer_url: String,
}

impl Endpoints {
    pub fn for_domain(domain: &str) -> Self {
        Self {
            sso_base: format!("https://sso.{domain}/sso"),
            api_base: format!("https://connectapi.{domain}"),
            consumer_url: OAUTH_CONSUMER_URL.to_string(),
        }
    }
}

/// Garmin Connect session. Starts unauthenticated; [`GarminClient::login`]
/// attaches a bearer token.
pub struct GarminClient {
    /// Cookie-carrying client for the SSO pages
    sso_http: Client,
    /// Cookie-free client for OAuth and API calls
    api_http: Client,
    endpoints: Endpoints,
    token: Option<OAuth2Token>,
}

impl GarminClient {
    pub fn new(domain: &str) -> Result<Self, GarminError> {
        Self::with_endpoints(Endpoints::for_domain(domain))
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Result<Self, GarminError> {
        let sso_http = Client::builder()
            .cookie_provider(Arc::new(reqwest::cookie::Jar::default()))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let api_http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            sso_http,
            api_http,
            endpoints,
            token: None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Run the SSO login flow and keep the resulting bearer token.
    #[tracing::instrument(skip_all)]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), GarminError> {
        let (csrf, referer) = self.fetch_csrf_token().await?;
        let ticket = self.submit_credentials(email, password, &csrf, &referer).await?;
        tracing::debug!("SSO ticket obtained");

        let consumer = self.fetch_consumer().await?;
        let oauth1 = self.exchange_ticket(&consumer, &ticket).await?;
        let oauth2 = self.exchange_oauth1(consumer, oauth1).await?;

        tracing::info!(expires_in = oauth2.expires_in, "Garmin Connect login successful");
        self.token = Some(oauth2);
        Ok(())
    }

    fn signin_params(&self) -> Vec<(&'static str, String)> {
        let embed = format!("{}/embed", self.endpoints.sso_base);
        vec![
            ("id", "gauth-widget".to_string()),
            ("embedWidget", "true".to_string()),
            ("gauthHost", embed.clone()),
            ("service", embed.clone()),
            ("source", embed.clone()),
            ("redirectAfterAccountLoginUrl", embed.clone()),
            ("redirectAfterAccountCreationUrl", embed),
        ]
    }

    async fn fetch_csrf_token(&self) -> Result<(String, String), GarminError> {
        let sso = &self.endpoints.sso_base;

        // Sets the session cookies.
        self.sso_http
            .get(format!("{sso}/embed"))
            .query(&[
                ("id", "gauth-widget"),
                ("embedWidget", "true"),
                ("gauthHost", sso.as_str()),
            ])
            .header(USER_AGENT, API_USER_AGENT)
            .send()
            .await?
            .text()
            .await?;

        let response = self
            .sso_http
            .get(format!("{sso}/signin"))
            .query(&self.signin_params())
            .header(USER_AGENT, API_USER_AGENT)
            .send()
            .await?;
        let referer = response.url().to_string();
        let html = response.text().await?;

        Ok((extract_csrf_token(&html)?, referer))
    }

    async fn submit_credentials(
        &self,
        email: &str,
        password: &str,
        csrf: &str,
        referer: &str,
    ) -> Result<String, GarminError> {
        let response = self
            .sso_http
            .post(format!("{}/signin", self.endpoints.sso_base))
            .query(&self.signin_params())
            .header(USER_AGENT, API_USER_AGENT)
            .header(REFERER, referer)
            .form(&[
                ("username", email),
                ("password", password),
                ("embed", "true"),
                ("_csrf", csrf),
            ])
            .send()
            .await?;
        let html = response.text().await?;

        let title = extract_title(&html)?;
        if title.contains("MFA") {
            return Err(GarminError::Auth(
                "account requires multi-factor authentication".to_string(),
            ));
        }
        if title != "Success" {
            return Err(GarminError::Auth(format!("unexpected login page: {title}")));
        }

        extract_ticket(&html)
    }

    async fn fetch_consumer(&self) -> Result<Consumer, GarminError> {
        self.api_http
            .get(&self.endpoints.consumer_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| GarminError::invalid(format!("OAuth consumer: {e}")))
    }

    async fn exchange_ticket(
        &self,
        consumer: &Consumer,
        ticket: &str,
    ) -> Result<TokenCredentials, GarminError> {
        let url = format!(
            "{}/oauth-service/oauth/preauthorized?ticket={}&login-url={}/embed&accepts-mfa-tokens=true",
            self.endpoints.api_base, ticket, self.endpoints.sso_base
        );
        let auth = Signer::new(consumer.clone())
            .authorization("GET", &url, &[])
            .map_err(|e| GarminError::invalid(format!("token URL: {e}")))?;

        let response = self
            .api_http
            .get(&url)
            .header(USER_AGENT, MOBILE_USER_AGENT)
            .header(AUTHORIZATION, auth)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GarminError::Auth(format!(
                "OAuth1 token request returned {}",
                response.status()
            )));
        }

        let params = parse_token_response(&response.text().await?);
        let token = params
            .get("oauth_token")
            .ok_or_else(|| GarminError::invalid("missing oauth_token"))?;
        let secret = params
            .get("oauth_token_secret")
            .ok_or_else(|| GarminError::invalid("missing oauth_token_secret"))?;

        Ok(TokenCredentials {
            token: token.clone(),
            secret: secret.clone(),
        })
    }

    async fn exchange_oauth1(
        &self,
        consumer: Consumer,
        oauth1: TokenCredentials,
    ) -> Result<OAuth2Token, GarminError> {
        let url = format!(
            "{}/oauth-service/oauth/exchange/user/2.0",
            self.endpoints.api_base
        );
        let auth = Signer::new(consumer)
            .with_token(oauth1)
            .authorization("POST", &url, &[])
            .map_err(|e| GarminError::invalid(format!("exchange URL: {e}")))?;

        let response = self
            .api_http
            .post(&url)
            .header(USER_AGENT, MOBILE_USER_AGENT)
            .header(AUTHORIZATION, auth)
            .form(&[] as &[(&str, &str)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GarminError::Auth(format!(
                "OAuth2 exchange returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GarminError::invalid(format!("OAuth2 token: {e}")))
    }

    /// One page of the activity list, newest first.
    pub async fn list_activities(
        &self,
        start: usize,
        limit: usize,
    ) -> Result<Vec<Record>, GarminError> {
        let token = self.token.as_ref().ok_or(GarminError::NotAuthenticated)?;
        let url = format!(
            "{}/activitylist-service/activities/search/activities?limit={}&start={}",
            self.endpoints.api_base, limit, start
        );

        let response = self
            .api_http
            .get(&url)
            .header(USER_AGENT, API_USER_AGENT)
            .header(AUTHORIZATION, token.authorization_header())
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(GarminError::NotAuthenticated),
            StatusCode::TOO_MANY_REQUESTS => return Err(GarminError::RateLimited),
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(GarminError::invalid(format!("API error {status}: {body}")));
            }
        }

        response
            .json()
            .await
            .map_err(|e| GarminError::invalid(format!("activity list: {e}")))
    }

    /// Fetch up to `max_pages` sequential pages.
    ///
    /// Stops at the first failing page and returns what was gathered before
    /// it.
    pub async fn fetch_pages(&self, page_size: usize, max_pages: usize) -> Vec<Record> {
        let mut activities = Vec::new();

        for page in 0..max_pages {
            let start = page * page_size;
            tracing::info!(
                start,
                end = (start + page_size).saturating_sub(1),
                "Fetching activities"
            );

            match self.list_activities(start, page_size).await {
                Ok(batch) => {
                    tracing::info!(page = page + 1, count = batch.len(), "Retrieved activities");
                    activities.extend(batch);
                }
                Err(e) => {
                    tracing::warn!(page = page + 1, error = %e, "Activity page failed; stopping");
                    break;
                }
            }
        }

        tracing::info!(total = activities.len(), "Activities retrieved");
        activities
    }
}

fn extract_csrf_token(html: &str) -> Result<String, GarminError> {
    capture(&CSRF_RE, html).ok_or_else(|| GarminError::invalid("could not find CSRF token"))
}

fn extract_title(html: &str) -> Result<String, GarminError> {
    capture(&TITLE_RE, html).ok_or_else(|| GarminError::invalid("could not find page title"))
}

fn extract_ticket(html: &str) -> Result<String, GarminError> {
    capture(&TICKET_RE, html).ok_or_else(|| GarminError::invalid("could not find login ticket"))
}

fn capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_csrf_token() {
        let html = r#"<input type="hidden" name="_csrf" value="abc123">"#;
        assert_eq!(extract_csrf_token(html).unwrap(), "abc123");
        assert!(extract_csrf_token("<html></html>").is_err());
    }

    #[test]
    fn test_extract_title_and_ticket() {
        let html = r#"<title>Success</title><script>var u = "https://sso.garmin.com/sso/embed?ticket=ST-0042-xyz";</script>"#;
        assert_eq!(extract_title(html).unwrap(), "Success");
        assert_eq!(extract_ticket(html).unwrap(), "ST-0042-xyz");
    }

    #[test]
    fn test_endpoints_for_domain() {
        let endpoints = Endpoints::for_domain("garmin.cn");
        assert_eq!(endpoints.sso_base, "https://sso.garmin.cn/sso");
        assert_eq!(endpoints.api_base, "https://connectapi.garmin.cn");
    }

    #[tokio::test]
    async fn test_listing_requires_login() {
        let client = GarminClient::new("garmin.com").unwrap();
        assert!(!client.is_authenticated());
        assert!(matches!(
            client.list_activities(0, 10).await,
            Err(GarminError::NotAuthenticated)
        ));
        assert!(client.fetch_pages(10, 3).await.is_empty());
    }
}
