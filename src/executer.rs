//! Provides an asynchronous execution framework for sending HTTP requests to Google.
//!
//! This module:
//! - Defines the `Transport` trait, the only place bytes leave the process.
//! - Implements `Transport` over a single long-lived `reqwest::Client` with a request timeout.
//! - Defines the `Executer` trait, which provides a unified interface for making requests.
//! - Implements executers for the userinfo request and the JWKS (certs) request.

use std::{pin::Pin, sync::Arc};

use http::{
    Method, Request, Response, StatusCode,
    header::ACCEPT,
};
use jsonwebtoken::jwk::JwkSet;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error};

use crate::{config::Config, userinfo::UserInfoRequest, verifier::CertsRequest};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sends a fully built request and hands back status, headers and body.
/// Non-2xx statuses are responses, not errors.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, req: Request<()>) -> BoxFuture<'a, Result<Response<String>, ExecuteError>>;
}

/// generic asynchronous execution interface for sending HTTP requests.
/// Key Components:
/// - Req: The request type that the executer will handle.
/// - Response: The expected response type.
/// - Error: The error type that will be returned on failure.
/// - Future: The asynchronous execution result, returning either Response or Error
pub trait Executer<'a, Req>
where
    Req: Send,
{
    type Response;
    type Error: std::error::Error;
    type Future: Future<Output = Result<Self::Response, Self::Error>> + Send + 'a;

    fn execute(&'a self, req: &'a Req) -> Self::Future;
}

/// Defines possible errors that can occur during request execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecuteError {
    #[error("Failed to build HTTP client")]
    Client,
    #[error("Failed to build request")]
    Request,
    #[error("Failed to parse data")]
    Parse,
    #[error("Failed to send request")]
    Send,
    #[error("Request timed out")]
    Timeout,
    #[error("Unexpected status {0}")]
    Status(StatusCode),
    #[error("Failed to parse url")]
    URL,
}

fn classify(e: reqwest::Error) -> ExecuteError {
    // The url may carry an access token in its query string.
    let e = e.without_url();
    if e.is_timeout() {
        error!("Request timed out: {:?}", e);
        ExecuteError::Timeout
    } else if e.is_builder() {
        error!("Failed to build request: {:?}", e);
        ExecuteError::URL
    } else {
        error!("Failed to send request: {:?}", e);
        ExecuteError::Send
    }
}

/// `Transport` backed by one `reqwest::Client`, shared by every call.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds the client with `config.timeout()` applied to every request.
    pub fn new(config: &Config) -> Result<Self, ExecuteError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                error!("Failed to build HTTP client: {:?}", e);
                ExecuteError::Client
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client. Its timeout settings are used as is.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(&'a self, req: Request<()>) -> BoxFuture<'a, Result<Response<String>, ExecuteError>> {
        Box::pin(async move {
            let (parts, _) = req.into_parts();
            let res = self
                .client
                .request(parts.method, parts.uri.to_string())
                .headers(parts.headers)
                .send()
                .await
                .map_err(classify)?;

            let status = res.status();
            let headers = res.headers().clone();
            let body = res.text().await.map_err(|e| {
                let e = e.without_url();
                error!("Failed to read response body: {:?}", e);
                if e.is_timeout() {
                    ExecuteError::Timeout
                } else {
                    ExecuteError::Parse
                }
            })?;

            let mut response = Response::new(body);
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            Ok(response)
        })
    }
}

/// Fetches the signed-in user's profile with an access token.
pub struct UserInfoExe<T> {
    transport: Arc<T>,
}

impl<T> UserInfoExe<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

/// Request Workflow
/// 1. Build a GET request carrying the access token.
/// 2. Send it through the shared transport.
/// 3. Return the raw response for the caller to parse.
impl<'a, T> Executer<'a, UserInfoRequest> for UserInfoExe<T>
where
    T: Transport + 'a,
{
    type Response = Response<String>;
    type Error = ExecuteError;
    type Future = BoxFuture<'a, Result<Self::Response, Self::Error>>;

    fn execute(&'a self, req: &'a UserInfoRequest) -> Self::Future {
        Box::pin(async move {
            let request = req.to_http_request()?;
            debug!("Fetching userinfo from {}", req.endpoint());
            let res = self.transport.send(request).await?;
            debug!("Userinfo responded with {}", res.status());
            Ok(res)
        })
    }
}

/// Fetches Google's current signing keys.
pub struct CertsExe<T> {
    transport: Arc<T>,
}

impl<T> CertsExe<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

/// Request Workflow
/// 1. GET the JWKS endpoint.
/// 2. Reject non-2xx statuses.
/// 3. Parse the body as a JWK set.
impl<'a, T> Executer<'a, CertsRequest> for CertsExe<T>
where
    T: Transport + 'a,
{
    type Response = JwkSet;
    type Error = ExecuteError;
    type Future = BoxFuture<'a, Result<Self::Response, Self::Error>>;

    fn execute(&'a self, req: &'a CertsRequest) -> Self::Future {
        Box::pin(async move {
            let request = Request::builder()
                .method(Method::GET)
                .uri(req.endpoint())
                .header(ACCEPT, "application/json")
                .body(())
                .map_err(|e| {
                    error!("Failed to build certs request: {:?}", e);
                    ExecuteError::Request
                })?;

            debug!("Fetching certs from {}", req.endpoint());
            let res = self.transport.send(request).await?;
            if !res.status().is_success() {
                error!("Certs endpoint responded with {}", res.status());
                return Err(ExecuteError::Status(res.status()));
            }
            let jwks = serde_json::from_str::<JwkSet>(res.body()).map_err(|e| {
                error!("Failed to parse JSON: {:?}", e);
                ExecuteError::Parse
            })?;
            Ok(jwks)
        })
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use http::{
        StatusCode,
        header::{ACCEPT, CONTENT_TYPE},
    };
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    use crate::{
        config::Config,
        test_support::{JWKS, StubTransport},
        userinfo::{AccessToken, UserInfoRequest},
        verifier::CertsRequest,
    };

    use super::{CertsExe, ExecuteError, Executer, ReqwestTransport, Transport, UserInfoExe};

    #[tokio::test]
    async fn test_userinfo_exe_returns_raw_response() {
        let transport = Arc::new(
            StubTransport::new().with_response("https://userinfo.example.com", 200, r#"{"email":"x@y.com"}"#),
        );
        let config = Config::builder()
            .userinfo_endpoint("https://userinfo.example.com/v3")
            .build();
        let req = UserInfoRequest::new(&config, &AccessToken::new("ya29.token"));

        let res = UserInfoExe::new(transport.clone()).execute(&req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body(), r#"{"email":"x@y.com"}"#);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_userinfo_exe_passes_through_error_status() {
        let transport = Arc::new(StubTransport::new().with_response(
            "https://userinfo.example.com",
            401,
            r#"{"error":"invalid_token"}"#,
        ));
        let config = Config::builder()
            .userinfo_endpoint("https://userinfo.example.com")
            .build();
        let req = UserInfoRequest::new(&config, &AccessToken::new("expired"));

        let res = UserInfoExe::new(transport).execute(&req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_userinfo_exe_send_failure() {
        let transport = Arc::new(StubTransport::new());
        let config = Config::builder()
            .userinfo_endpoint("https://userinfo.example.com")
            .build();
        let req = UserInfoRequest::new(&config, &AccessToken::new("token"));

        let res = UserInfoExe::new(transport).execute(&req).await;
        assert_eq!(res.unwrap_err(), ExecuteError::Send);
    }

    #[tokio::test]
    async fn test_certs_exe_parses_jwks() {
        let transport = Arc::new(StubTransport::new().with_response("https://certs.example.com", 200, JWKS));
        let req = CertsRequest::new("https://certs.example.com/v3");

        let jwks = CertsExe::new(transport.clone()).execute(&req).await.unwrap();
        assert!(jwks.find("test-key-1").is_some());

        let recorded = transport.requests();
        assert_eq!(recorded[0].headers[ACCEPT], "application/json");
    }

    #[tokio::test]
    async fn test_certs_exe_rejects_error_status() {
        let transport = Arc::new(StubTransport::new().with_response("https://certs.example.com", 503, ""));
        let req = CertsRequest::new("https://certs.example.com");

        let res = CertsExe::new(transport).execute(&req).await;
        assert_eq!(
            res.unwrap_err(),
            ExecuteError::Status(StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[tokio::test]
    async fn test_certs_exe_rejects_bad_json() {
        let transport = Arc::new(StubTransport::new().with_response("https://certs.example.com", 200, "<html>"));
        let req = CertsRequest::new("https://certs.example.com");

        let res = CertsExe::new(transport).execute(&req).await;
        assert_eq!(res.unwrap_err(), ExecuteError::Parse);
    }

    #[test]
    fn test_reqwest_transport_new() {
        let config = Config::builder().timeout(Duration::from_secs(1)).build();
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    fn local_transport(timeout: Duration) -> ReqwestTransport {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .unwrap();
        ReqwestTransport::from_client(client)
    }

    /// Accepts one connection, reads the request head, writes `reply`, then
    /// holds the socket open for `hold`. Yields the raw request head.
    async fn serve_once(reply: String, hold: Duration) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(hold).await;
            String::from_utf8_lossy(&head).into_owned()
        });
        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_reqwest_transport_over_socket() {
        let body = r#"{"email":"x@y.com"}"#;
        let reply = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (base, server) = serve_once(reply, Duration::ZERO).await;
        let config = Config::builder().userinfo_endpoint(&format!("{}/u", base)).build();
        let req = UserInfoRequest::new(&config, &AccessToken::new("tok"))
            .to_http_request()
            .unwrap();

        let res = local_transport(Duration::from_secs(5)).send(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(res.body(), body);

        let head = server.await.unwrap().to_lowercase();
        assert!(head.starts_with("get /u "));
        assert!(head.contains("authorization: bearer tok"));
        assert!(head.contains("accept: application/json"));
    }

    #[tokio::test]
    async fn test_reqwest_transport_times_out() {
        let (base, server) = serve_once(String::new(), Duration::from_secs(5)).await;
        let config = Config::builder().userinfo_endpoint(&format!("{}/u", base)).build();
        let req = UserInfoRequest::new(&config, &AccessToken::new("tok"))
            .to_http_request()
            .unwrap();

        let res = local_transport(Duration::from_millis(500)).send(req).await;

        assert_eq!(res.unwrap_err(), ExecuteError::Timeout);
        server.abort();
    }

    #[tokio::test]
    async fn test_reqwest_transport_truncated_body() {
        let reply = "HTTP/1.1 200 OK\r\ncontent-length: 100\r\nconnection: close\r\n\r\n{\"short\"".to_string();
        let (base, server) = serve_once(reply, Duration::ZERO).await;
        let config = Config::builder().userinfo_endpoint(&format!("{}/u", base)).build();
        let req = UserInfoRequest::new(&config, &AccessToken::new("tok"))
            .to_http_request()
            .unwrap();

        let res = local_transport(Duration::from_secs(5)).send(req).await;

        assert_eq!(res.unwrap_err(), ExecuteError::Parse);
        server.await.unwrap();
    }
}
