// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response helpers shared by the OData feeds.

use crate::config::Config;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

const ODATA_VERSION: &str = "odata-version";
const ODATA_JSON: &str = "application/json; odata.metadata=minimal";

/// Absolute base URL of the service, always ending in `/`.
///
/// A configured public URL wins; otherwise the scheme comes from
/// `X-Forwarded-Proto` (default `http`) and the authority from `Host`.
pub fn base_url(config: &Config, headers: &HeaderMap) -> String {
    if let Some(public) = &config.public_url {
        return if public.ends_with('/') {
            public.clone()
        } else {
            format!("{}/", public)
        };
    }

    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let scheme = header_str("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    let host = header_str(header::HOST.as_str()).unwrap_or_else(|| "localhost".to_string());
    format!("{}://{}/", scheme, host)
}

/// JSON body with the OData content type and version headers.
pub fn odata_json<T: Serialize>(body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(ODATA_JSON)),
                (
                    header::HeaderName::from_static(ODATA_VERSION),
                    HeaderValue::from_static("4.0"),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => crate::error::AppError::Internal(e.into()).into_response(),
    }
}

/// CSDL metadata document.
pub fn metadata_xml(xml: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/xml")),
            (
                header::HeaderName::from_static(ODATA_VERSION),
                HeaderValue::from_static("4.0"),
            ),
        ],
        xml,
    )
        .into_response()
}
