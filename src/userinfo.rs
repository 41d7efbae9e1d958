//! Provides the request to Google's userinfo endpoint made with a "Sign in with Google" button access token.
//!
//! This module:
//! - AccessToken: The bearer credential returned by the button flow.
//! - UserInfoRequest: A data structure describing the GET request to the userinfo endpoint.
//! - UserInfo: An optional typed view of the userinfo response body.

use std::fmt;

use http::{
    Method, Request, Response,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;
use url::Url;

use crate::{
    config::{Config, TokenPlacement},
    executer::ExecuteError,
};

/// Represents an OAuth 2.0 access token.
/// This token is used to access Google APIs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken(pub(crate) String);

impl AccessToken {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    /// Retrieves the access token as a string.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// A GET request to the userinfo endpoint.
#[derive(Debug, Clone)]
pub struct UserInfoRequest {
    endpoint: String,
    access_token: AccessToken,
    placement: TokenPlacement,
}

impl UserInfoRequest {
    /// Creates a new request using the endpoint and token placement from Config.
    pub fn new(config: &Config, access_token: &AccessToken) -> Self {
        Self {
            endpoint: config.userinfo_endpoint.to_owned(),
            access_token: access_token.to_owned(),
            placement: config.token_placement,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn placement(&self) -> TokenPlacement {
        self.placement
    }

    /// Builds the `http::Request` sent on the wire.
    pub fn to_http_request(&self) -> Result<Request<()>, ExecuteError> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            error!("Failed to parse url: {:?}", e);
            ExecuteError::URL
        })?;

        let mut builder = Request::builder()
            .method(Method::GET)
            .header(ACCEPT, "application/json");
        match self.placement {
            TokenPlacement::Header => {
                builder = builder.header(AUTHORIZATION, format!("Bearer {}", self.access_token.0));
            }
            TokenPlacement::Query => {
                url.query_pairs_mut()
                    .append_pair("access_token", &self.access_token.0);
            }
        }

        builder.uri(url.as_str()).body(()).map_err(|e| {
            error!("Failed to build userinfo request: {:?}", e);
            ExecuteError::Request
        })
    }
}

/// Represents the profile returned by the userinfo endpoint.
/// Fields depend on the scopes granted to the access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub sub: Option<String>, // User ID (Unique identifier for Google accounts)
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
    pub hd: Option<String>, // Hosted G Suite domain
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserInfo {
    /// Parses a userinfo response body. Non-2xx statuses are errors here.
    pub fn from_response(res: &Response<String>) -> Result<Self, ExecuteError> {
        if !res.status().is_success() {
            error!("Userinfo endpoint responded with {}", res.status());
            return Err(ExecuteError::Status(res.status()));
        }
        serde_json::from_str::<UserInfo>(res.body()).map_err(|e| {
            error!("Failed to parse JSON: {:?}", e);
            ExecuteError::Parse
        })
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use http::{
        Method, Response, StatusCode,
        header::{ACCEPT, AUTHORIZATION},
    };

    use crate::{
        config::{Config, TokenPlacement},
        executer::ExecuteError,
    };

    use super::{AccessToken, UserInfo, UserInfoRequest};

    #[test]
    fn test_access_token_value() {
        let token = AccessToken::new("test_token");
        assert_eq!(token.value(), "test_token");
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("ya29.secret");
        assert!(!format!("{:?}", token).contains("secret"));
    }

    #[test]
    fn test_header_placement() {
        let config = Config::builder()
            .userinfo_endpoint("https://userinfo.example.com/v3")
            .build();
        let req = UserInfoRequest::new(&config, &AccessToken::new("ya29.abc"))
            .to_http_request()
            .unwrap();

        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.uri(), "https://userinfo.example.com/v3");
        assert_eq!(req.headers()[ACCEPT], "application/json");
        assert_eq!(req.headers()[AUTHORIZATION], "Bearer ya29.abc");
    }

    #[test]
    fn test_query_placement_encodes_token() {
        let config = Config::builder()
            .userinfo_endpoint("https://userinfo.example.com/v3")
            .token_placement(TokenPlacement::Query)
            .build();
        let req = UserInfoRequest::new(&config, &AccessToken::new("a b&c"))
            .to_http_request()
            .unwrap();

        assert_eq!(
            req.uri(),
            "https://userinfo.example.com/v3?access_token=a+b%26c"
        );
        assert!(req.headers().get(AUTHORIZATION).is_none());
        assert_eq!(req.headers()[ACCEPT], "application/json");
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = Config::builder().userinfo_endpoint("not a url").build();
        let res = UserInfoRequest::new(&config, &AccessToken::new("t")).to_http_request();
        assert_eq!(res.unwrap_err(), ExecuteError::URL);
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let config = Config::builder().build();
        let res = UserInfoRequest::new(&config, &AccessToken::new("bad\ntoken")).to_http_request();
        assert_eq!(res.unwrap_err(), ExecuteError::Request);
    }

    #[test]
    fn test_userinfo_from_response() {
        let body = r#"{
            "sub": "110169484474386276334",
            "email": "x@y.com",
            "email_verified": true,
            "name": "X Y",
            "picture": "https://picture.example.com",
            "custom": 1
        }"#;
        let res = Response::new(body.to_string());

        let info = UserInfo::from_response(&res).unwrap();
        assert_eq!(info.sub.as_deref(), Some("110169484474386276334"));
        assert_eq!(info.email.as_deref(), Some("x@y.com"));
        assert_eq!(info.email_verified, Some(true));
        assert_eq!(info.extra["custom"], 1);
    }

    #[test]
    fn test_userinfo_from_error_response() {
        let mut res = Response::new(r#"{"error":"invalid_token"}"#.to_string());
        *res.status_mut() = StatusCode::UNAUTHORIZED;

        let info = UserInfo::from_response(&res);
        assert_eq!(info.unwrap_err(), ExecuteError::Status(StatusCode::UNAUTHORIZED));
    }
}
