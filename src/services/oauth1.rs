// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth1 HMAC-SHA1 request signing for the Garmin token exchange.

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use std::collections::BTreeMap;
use url::Url;

/// RFC 5849 unreserved characters stay as-is; everything else is encoded.
const ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Consumer key and secret identifying the client application.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Consumer {
    #[serde(rename = "consumer_key")]
    pub key: String,
    #[serde(rename = "consumer_secret")]
    pub secret: String,
}

/// Token credentials obtained after the ticket exchange.
#[derive(Debug, Clone)]
pub struct TokenCredentials {
    pub token: String,
    pub secret: String,
}

pub struct Signer {
    consumer: Consumer,
    token: Option<TokenCredentials>,
}

impl Signer {
    pub fn new(consumer: Consumer) -> Self {
        Self {
            consumer,
            token: None,
        }
    }

    pub fn with_token(mut self, token: TokenCredentials) -> Self {
        self.token = Some(token);
        self
    }

    /// Build the `Authorization` header value for a request.
    ///
    /// Query parameters in `url` and any form parameters in `extra` are
    /// included in the signature base string.
    pub fn authorization(
        &self,
        method: &str,
        url: &str,
        extra: &[(&str, &str)],
    ) -> Result<String, url::ParseError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let nonce = hex::encode(rand::random::<[u8; 16]>());
        self.authorization_at(method, url, extra, &timestamp, &nonce)
    }

    /// Deterministic variant of [`Signer::authorization`].
    pub fn authorization_at(
        &self,
        method: &str,
        url: &str,
        extra: &[(&str, &str)],
        timestamp: &str,
        nonce: &str,
    ) -> Result<String, url::ParseError> {
        let parsed = Url::parse(url)?;
        let mut base_url = format!(
            "{}://{}",
            parsed.scheme(),
            parsed.host_str().unwrap_or_default()
        );
        if let Some(port) = parsed.port() {
            base_url.push_str(&format!(":{port}"));
        }
        base_url.push_str(parsed.path());

        let mut oauth: BTreeMap<String, String> = BTreeMap::new();
        oauth.insert("oauth_consumer_key".into(), self.consumer.key.clone());
        oauth.insert("oauth_nonce".into(), nonce.to_string());
        oauth.insert("oauth_signature_method".into(), "HMAC-SHA1".into());
        oauth.insert("oauth_timestamp".into(), timestamp.to_string());
        oauth.insert("oauth_version".into(), "1.0".into());
        if let Some(token) = &self.token {
            oauth.insert("oauth_token".into(), token.token.clone());
        }

        let mut params: Vec<(String, String)> = oauth
            .iter()
            .map(|(k, v)| (encode(k), encode(v)))
            .collect();
        params.extend(
            parsed
                .query_pairs()
                .map(|(k, v)| (encode(&k), encode(&v))),
        );
        params.extend(extra.iter().map(|(k, v)| (encode(k), encode(v))));
        params.sort();

        let param_string = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            encode(&base_url),
            encode(&param_string)
        );

        let token_secret = self.token.as_ref().map_or("", |t| t.secret.as_str());
        let key = format!("{}&{}", encode(&self.consumer.secret), encode(token_secret));

        let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(base_string.as_bytes());
        oauth.insert(
            "oauth_signature".into(),
            STANDARD.encode(mac.finalize().into_bytes()),
        );

        let header = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {header}"))
    }
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, ENCODE_SET).to_string()
}

/// Parse a form-encoded token response (`oauth_token=...&oauth_token_secret=...`).
pub fn parse_token_response(body: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(body.trim().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
