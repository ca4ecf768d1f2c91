// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! reqwest-backed [`Transport`].
//!
//! Applies the configured timeout and user agent, attaches caller-supplied
//! credentials, and maps every failure into the data-access error category.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::{debug, warn};
use tsundoku_config::model::NetworkConfig;
use tsundoku_core::{
    AuthCredentials, DataAccessError, HttpMethod, SystemError, Transport, TransportRequest,
    TsundokuError,
};

/// Longest error body excerpt carried in an `InvalidResponse` message.
const ERROR_BODY_EXCERPT: usize = 256;

/// HTTP transport used for manifest fetches, icon downloads, and searches.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport with an explicit timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TsundokuError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| SystemError::Invariant {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &NetworkConfig) -> Result<Self, TsundokuError> {
        Self::new(config.timeout(), &config.user_agent)
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> TsundokuError {
        if e.is_timeout() {
            warn!(url, timeout = ?self.timeout, "request timed out");
            DataAccessError::Timeout {
                duration: self.timeout,
            }
            .into()
        } else {
            warn!(url, error = %e, "request failed");
            DataAccessError::Network {
                message: e.to_string(),
            }
            .into()
        }
    }
}

fn apply_credentials(
    builder: reqwest::RequestBuilder,
    credentials: &AuthCredentials,
) -> reqwest::RequestBuilder {
    match credentials {
        AuthCredentials::Basic { username, password }
        | AuthCredentials::Session { username, password } => {
            builder.basic_auth(username, Some(password))
        }
        AuthCredentials::ApiKey { key } => builder.header("x-api-key", key),
        AuthCredentials::Bearer { token } => builder.bearer_auth(token),
        AuthCredentials::Cookie { value } => builder.header(reqwest::header::COOKIE, value),
    }
}

fn invalid_header(name: &str) -> TsundokuError {
    DataAccessError::InvalidResponse {
        message: format!("header `{name}` is not a valid HTTP header"),
    }
    .into()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<Vec<u8>, TsundokuError> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
            credentials,
        } = request;

        let mut builder = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        for (name, value) in &headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid_header(name))?;
            let value = HeaderValue::from_str(value).map_err(|_| invalid_header(name.as_str()))?;
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        if let Some(credentials) = &credentials {
            builder = apply_credentials(builder, credentials);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;
        let status = response.status();
        debug!(url = %url, status = %status, "response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
            return Err(DataAccessError::InvalidResponse {
                message: format!("{url} returned {status}: {excerpt}"),
            }
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5), "tsundoku-test/1.0").unwrap()
    }

    #[tokio::test]
    async fn get_returns_body_and_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manifest.json"))
            .and(header("user-agent", "tsundoku-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"name\":\"x\"}"))
            .expect(1)
            .mount(&server)
            .await;

        let body = transport()
            .send(TransportRequest::get(format!("{}/manifest.json", server.uri())))
            .await
            .unwrap();
        assert_eq!(body, b"{\"name\":\"x\"}");
    }

    #[tokio::test]
    async fn post_json_sends_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("content-type", "application/json"))
            .and(header("referer", "https://example.com/"))
            .and(body_json(serde_json::json!({"q": "berserk"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let request = TransportRequest::post_json(
            format!("{}/search", server.uri()),
            &serde_json::json!({"q": "berserk"}),
        )
        .unwrap()
        .with_header("Referer", "https://example.com/");
        transport().send(request).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such manifest"))
            .mount(&server)
            .await;

        let err = transport()
            .send(TransportRequest::get(server.uri()))
            .await
            .unwrap_err();
        match err {
            TsundokuError::DataAccess(DataAccessError::InvalidResponse { message }) => {
                assert!(message.contains("404"));
                assert!(message.contains("no such manifest"));
            }
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_response_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_millis(200), "tsundoku-test/1.0").unwrap();
        let err = transport
            .send(TransportRequest::get(server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TsundokuError::DataAccess(DataAccessError::Timeout { .. })
        ));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn connection_refused_maps_to_network() {
        // Port 9 (discard) on localhost is closed in test environments.
        let err = transport()
            .send(TransportRequest::get("http://127.0.0.1:9/manifest.json"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TsundokuError::DataAccess(DataAccessError::Network { .. })
        ));
    }

    #[tokio::test]
    async fn bearer_credentials_set_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let request = TransportRequest::post_json(server.uri(), &serde_json::json!({}))
            .unwrap()
            .with_credentials(Some(AuthCredentials::Bearer {
                token: "s3cret".into(),
            }));
        transport().send(request).await.unwrap();
    }

    #[tokio::test]
    async fn api_key_and_cookie_credentials_use_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/key"))
            .and(header("x-api-key", "k-123"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cookie"))
            .and(header("cookie", "session=abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport();
        transport
            .send(
                TransportRequest::get(format!("{}/key", server.uri())).with_credentials(Some(
                    AuthCredentials::ApiKey {
                        key: "k-123".into(),
                    },
                )),
            )
            .await
            .unwrap();
        transport
            .send(
                TransportRequest::get(format!("{}/cookie", server.uri())).with_credentials(Some(
                    AuthCredentials::Cookie {
                        value: "session=abc".into(),
                    },
                )),
            )
            .await
            .unwrap();
    }
}
