use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use slog::{Logger, debug};
use thiserror::Error;

use erp_contract_common::StdError;
use erp_contract_common::entities::HttpMethod;
use erp_contract_common::logging::LoggerExtensions;

/// Default bound on the wait for each replayed request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Error raised when replaying a request.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The request could not be built (invalid url or header).
    #[error("invalid request")]
    InvalidRequest(#[source] StdError),

    /// The server did not answer before the request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Could not reach the server.
    #[error("remote server unreachable")]
    RemoteServerUnreachable(#[source] StdError),

    /// The response body could not be read.
    #[error("could not read response body")]
    BodyRead(#[source] StdError),

    /// HTTP client creation error
    #[error("HTTP client creation failed")]
    HttpClientCreation(#[source] StdError),
}

/// A request, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRequest {
    /// HTTP verb
    pub method: HttpMethod,
    /// Complete target url
    pub url: String,
    /// Headers, with the bearer token already substituted
    pub headers: BTreeMap<String, String>,
    /// JSON body, sent only when present
    pub body: Option<Value>,
}

/// What the server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayResponse {
    /// Status code
    pub status: u16,
    /// Value of the `content-type` header, if any
    pub content_type: Option<String>,
    /// Raw body
    pub body: Vec<u8>,
}

impl ReplayResponse {
    /// Check if the content type denotes a JSON body (`application/json` or `*/*+json`)
    pub fn is_json(&self) -> bool {
        self.content_type.as_deref().is_some_and(|content_type| {
            let essence = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            essence == "application/json" || essence.ends_with("+json")
        })
    }
}

/// Send a [ReplayRequest] and return the raw response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplayClient: Send + Sync {
    /// Send the request, waiting at most for the client timeout
    async fn replay(&self, request: &ReplayRequest) -> Result<ReplayResponse, ReplayError>;
}

/// [ReplayClient] backed by `reqwest`.
pub struct ReqwestReplayClient {
    client: Client,
    timeout: Duration,
    logger: Logger,
}

impl ReqwestReplayClient {
    /// Build a client bounding every request with the given timeout
    pub fn new(timeout: Duration, logger: &Logger) -> Result<Self, ReplayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReplayError::HttpClientCreation(anyhow!(e)))?;

        Ok(Self {
            client,
            timeout,
            logger: logger.new_with_component_name::<Self>(),
        })
    }

    fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ReplayError> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ReplayError::InvalidRequest(anyhow!(e).context(format!("header name '{name}'")))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                ReplayError::InvalidRequest(anyhow!(e).context(format!("value of header '{name}'")))
            })?;
            header_map.insert(header_name, header_value);
        }

        Ok(header_map)
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Trace => Method::TRACE,
    }
}

#[async_trait]
impl ReplayClient for ReqwestReplayClient {
    async fn replay(&self, request: &ReplayRequest) -> Result<ReplayResponse, ReplayError> {
        let url = reqwest::Url::parse(&request.url).map_err(|e| {
            ReplayError::InvalidRequest(anyhow!(e).context(format!("url '{}'", request.url)))
        })?;
        let mut request_builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .headers(Self::build_headers(&request.headers)?);

        if let Some(body) = &request.body {
            request_builder = request_builder.json(body);
        }

        debug!(self.logger, ">> Replay request"; "method" => %request.method, "url" => &request.url);
        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ReplayError::Timeout(self.timeout)
            } else {
                ReplayError::RemoteServerUnreachable(anyhow!(e))
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                ReplayError::Timeout(self.timeout)
            } else {
                ReplayError::BodyRead(anyhow!(e))
            }
        })?;
        debug!(self.logger, "<< Replay response"; "status" => status, "body_size" => body.len());

        Ok(ReplayResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;
    use serde_json::json;

    use erp_contract_common::test_utils::TestLogger;

    use super::*;

    fn request(method: HttpMethod, url: String) -> ReplayRequest {
        ReplayRequest {
            method,
            url,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    fn client() -> ReqwestReplayClient {
        ReqwestReplayClient::new(DEFAULT_REQUEST_TIMEOUT, &TestLogger::stdout()).unwrap()
    }

    #[tokio::test]
    async fn replay_get_request() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/health");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"health":"ok"}"#);
        });

        let response = client()
            .replay(&request(HttpMethod::Get, server.url("/health")))
            .await
            .unwrap();

        assert_eq!(
            ReplayResponse {
                status: 200,
                content_type: Some("application/json".to_string()),
                body: br#"{"health":"ok"}"#.to_vec(),
            },
            response
        );
    }

    #[tokio::test]
    async fn replay_post_request_with_headers_and_json_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/setup/trusts")
                .header("authorization", "Bearer secret")
                .header("content-type", "application/json")
                .json_body(json!({"name": "Green Valley"}));
            then.status(201);
        });
        let mut request = request(HttpMethod::Post, server.url("/setup/trusts"));
        request
            .headers
            .insert("Authorization".to_string(), "Bearer secret".to_string());
        request.body = Some(json!({"name": "Green Valley"}));

        let response = client().replay(&request).await.unwrap();

        mock.assert();
        assert_eq!(201, response.status);
    }

    #[tokio::test]
    async fn no_body_is_sent_when_the_case_has_none() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::DELETE)
                .path("/students/1")
                .body("");
            then.status(204);
        });

        let response = client()
            .replay(&request(HttpMethod::Delete, server.url("/students/1")))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(204, response.status);
    }

    #[tokio::test]
    async fn slow_server_yields_a_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/reports");
            then.status(200).delay(Duration::from_millis(500));
        });
        let client =
            ReqwestReplayClient::new(Duration::from_millis(50), &TestLogger::stdout()).unwrap();

        let error = client
            .replay(&request(HttpMethod::Get, server.url("/reports")))
            .await
            .unwrap_err();

        assert!(
            matches!(error, ReplayError::Timeout(_)),
            "unexpected error: {error:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_reported() {
        let error = client()
            .replay(&request(HttpMethod::Get, "http://127.0.0.1:1/health".to_string()))
            .await
            .unwrap_err();

        assert!(
            matches!(error, ReplayError::RemoteServerUnreachable(_)),
            "unexpected error: {error:?}"
        );
    }

    #[tokio::test]
    async fn invalid_header_name_is_an_invalid_request() {
        let mut request = request(HttpMethod::Get, "http://127.0.0.1:1/health".to_string());
        request
            .headers
            .insert("bad header".to_string(), "value".to_string());

        let error = client().replay(&request).await.unwrap_err();

        assert!(matches!(error, ReplayError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn invalid_url_is_an_invalid_request() {
        let error = client()
            .replay(&request(HttpMethod::Get, "not an url/health".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(error, ReplayError::InvalidRequest(_)));
    }

    mod is_json {
        use super::*;

        fn response_with_content_type(content_type: Option<&str>) -> ReplayResponse {
            ReplayResponse {
                status: 200,
                content_type: content_type.map(str::to_string),
                body: vec![],
            }
        }

        #[test]
        fn json_content_types() {
            for content_type in [
                "application/json",
                "application/json; charset=utf-8",
                "Application/JSON",
                "application/problem+json",
            ] {
                assert!(
                    response_with_content_type(Some(content_type)).is_json(),
                    "'{content_type}' should be json"
                );
            }
        }

        #[test]
        fn non_json_content_types() {
            assert!(!response_with_content_type(Some("text/html")).is_json());
            assert!(!response_with_content_type(Some("text/plain; charset=utf-8")).is_json());
            assert!(!response_with_content_type(None).is_json());
        }
    }
}
