//! Stub transport and RSA fixtures for unit tests.

use std::{
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use http::{HeaderMap, Method, Request, Response, StatusCode};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use crate::executer::{BoxFuture, ExecuteError, Transport};

pub(crate) const SIGNING_KEY: &str = include_str!("../tests/fixtures/signing_key.pem");
pub(crate) const FOREIGN_KEY: &str = include_str!("../tests/fixtures/foreign_key.pem");
/// Publishes the public half of `SIGNING_KEY` under `KID`.
pub(crate) const JWKS: &str = include_str!("../tests/fixtures/jwks.json");
pub(crate) const KID: &str = "test-key-1";

pub(crate) const CLIENT_ID: &str = "1234567890-abc.apps.googleusercontent.com";
pub(crate) const CERTS_URL: &str = "https://certs.example.com/oauth2/v3/certs";
pub(crate) const USERINFO_URL: &str = "https://userinfo.example.com/oauth2/v3/userinfo";

pub(crate) struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
}

/// Answers requests whose uri starts with a registered prefix; fails with
/// `ExecuteError::Send` otherwise.
pub(crate) struct StubTransport {
    responses: Vec<(String, StatusCode, String)>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, prefix: &str, status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.responses.push((prefix.to_string(), status, body.to_string()));
        self
    }

    pub fn requests(&self) -> std::sync::MutexGuard<'_, Vec<RecordedRequest>> {
        self.requests.lock().unwrap()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for StubTransport {
    fn send<'a>(&'a self, req: Request<()>) -> BoxFuture<'a, Result<Response<String>, ExecuteError>> {
        let uri = req.uri().to_string();
        let res = self
            .responses
            .iter()
            .find(|(prefix, _, _)| uri.starts_with(prefix.as_str()))
            .map(|(_, status, body)| {
                let mut res = Response::new(body.clone());
                *res.status_mut() = *status;
                res
            })
            .ok_or(ExecuteError::Send);

        self.requests.lock().unwrap().push(RecordedRequest {
            method: req.method().clone(),
            uri,
            headers: req.headers().clone(),
        });
        Box::pin(async move { res })
    }
}

pub(crate) fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub(crate) fn valid_claims(aud: &str) -> Value {
    json!({
        "iss": "https://accounts.google.com",
        "aud": aud,
        "azp": aud,
        "sub": "110169484474386276334",
        "email": "x@y.com",
        "email_verified": true,
        "name": "X Y",
        "iat": now(),
        "exp": now() + 3600,
    })
}

pub(crate) fn mint_token(claims: &Value, pem: &str) -> String {
    mint_token_with(claims, pem, Some(KID))
}

pub(crate) fn mint_token_with(claims: &Value, pem: &str, kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    jsonwebtoken::encode(&header, claims, &key).unwrap()
}
