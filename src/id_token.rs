//! Provides the data structures of a Google One Tap ID token.
//!
//! This module:
//! IDTokenRow: A structure representing an encoded ID token before verification.
//! IDToken: A data structure representing the payload of a verified ID token.
//! GoogleIDToken: The verified header and payload together.
//! OneTapCallback: The form Google posts to the One Tap `login_uri`.

use std::fmt;

use jsonwebtoken::Header;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::nonce::Nonce;

/// Represents an encoded ID token, which must be verified before use.
#[derive(Clone, PartialEq, Deserialize)]
pub struct IDTokenRow(pub(crate) String);

impl IDTokenRow {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for IDTokenRow {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for IDTokenRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IDTokenRow(..)")
    }
}

/// Represents a decoded ID token payload in OpenID Connect.
/// An ID token contains user authentication and profile information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IDToken {
    pub iss: String, // Issuer (e.g., "https://accounts.google.com")
    pub aud: String, // Client ID
    pub sub: String, // User ID (Unique identifier for Google accounts)
    pub azp: Option<String>, // Authorized party (Optional)
    pub email: Option<String>, // User's email address
    pub email_verified: Option<bool>, // Whether the email is verified
    pub given_name: Option<String>, // Given name
    pub family_name: Option<String>, // Family name
    pub name: Option<String>, // Full name
    pub picture: Option<String>, // Profile picture URL
    pub hd: Option<String>, // Hosted domain
    pub iat: u64, // Issued-at timestamp (UNIX time)
    pub exp: u64, // Expiration timestamp (UNIX time)
    pub nbf: Option<u64>,
    pub jti: Option<String>,
    pub nonce: Option<Nonce>, // Nonce set with data-nonce
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A verified ID token.
#[derive(Debug, Clone)]
pub struct GoogleIDToken {
    pub(crate) header: Header,
    pub(crate) payload: IDToken,
}

impl GoogleIDToken {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn payload(&self) -> &IDToken {
        &self.payload
    }

    pub fn into_payload(self) -> IDToken {
        self.payload
    }
}

/// The `application/x-www-form-urlencoded` body Google posts to the One Tap `login_uri`.
#[derive(Debug, Clone, Deserialize)]
pub struct OneTapCallback {
    pub credential: String,
    pub g_csrf_token: Option<String>,
    pub select_by: Option<String>,
}
