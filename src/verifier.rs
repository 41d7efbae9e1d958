//! Verification of Google One Tap ID tokens.
//!
//! `GoogleIDTokenVerifier` is bound to a single audience, the OAuth client ID.
//! A token is accepted only if
//! - its header names `RS256` and a `kid` published in Google's JWKS,
//! - the signature checks out against that key,
//! - `exp` is in the future (allowing for `clock_skew`),
//! - `iss` is `accounts.google.com` or `https://accounts.google.com`,
//! - `aud` equals the client ID.
//!
//! The JWKS is fetched through the shared transport on each verification.
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use tiny_google_signin::{
//!     config::Config,
//!     executer::ReqwestTransport,
//!     id_token::IDTokenRow,
//!     verifier::{GoogleIDTokenVerifier, TokenVerifier},
//! };
//!
//! # async fn run() -> Result<(), tiny_google_signin::error::Error> {
//! let config = Config::builder().client_id("your-client-id").build();
//! let transport = Arc::new(ReqwestTransport::new(&config)?);
//! let verifier = GoogleIDTokenVerifier::new(&config, transport)?;
//!
//! let token = verifier.verify(&IDTokenRow::new("eyJ...")).await?;
//! println!("Signed in: {}", token.payload().sub);
//! # Ok(())
//! # }
//! ```
use std::{sync::Arc, time::Duration};

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use thiserror::Error;
use tracing::{debug, error};

use crate::{
    config::{ClientID, Config, ConfigBuilder},
    config_reader::{ConfigError, ConfigReader, ConfigSource},
    error::Error,
    executer::{BoxFuture, CertsExe, ExecuteError, Executer, Transport},
    id_token::{GoogleIDToken, IDToken, IDTokenRow},
};

pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

const REQUIRED_CLAIMS: [&str; 4] = ["exp", "iss", "aud", "sub"];

/// Reasons an ID token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Failed to decode ID token")]
    Decode,
    #[error("Unsupported algorithm {0}")]
    UnsupportedAlgorithm(String),
    #[error("ID token header has no kid")]
    MissingKeyId,
    #[error("No Google signing key with kid {0}")]
    KeyNotFound(String),
    #[error("Failed to fetch Google certs: {0}")]
    Certs(ExecuteError),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("ID token expired")]
    Expired,
    #[error("Invalid issuer")]
    InvalidIssuer,
    #[error("Audience does not match client ID")]
    InvalidAudience,
    #[error("Missing required claim {0}")]
    MissingClaim(String),
    #[error("Nonce does not match")]
    NonceMismatch,
    #[error("CSRF token not matched")]
    CSRFNotMatch,
    #[error("Invalid ID token: {0}")]
    Invalid(String),
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => VerifyError::Decode,
            ErrorKind::InvalidSignature => VerifyError::InvalidSignature,
            ErrorKind::ExpiredSignature => VerifyError::Expired,
            ErrorKind::InvalidIssuer => VerifyError::InvalidIssuer,
            ErrorKind::InvalidAudience => VerifyError::InvalidAudience,
            ErrorKind::MissingRequiredClaim(claim) => VerifyError::MissingClaim(claim.to_owned()),
            ErrorKind::InvalidAlgorithm => VerifyError::UnsupportedAlgorithm(e.to_string()),
            _ => VerifyError::Invalid(e.to_string()),
        }
    }
}

/// Verifies an encoded ID token and returns its decoded form.
pub trait TokenVerifier: Send + Sync {
    fn verify<'a>(&'a self, token: &'a IDTokenRow) -> BoxFuture<'a, Result<GoogleIDToken, VerifyError>>;
}

/// A GET request to the JWKS endpoint.
#[derive(Debug, Clone)]
pub struct CertsRequest {
    endpoint: String,
}

impl CertsRequest {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Verifies ID tokens issued by Google for one client ID.
pub struct GoogleIDTokenVerifier<T> {
    audience: ClientID,
    clock_skew: Duration,
    certs_request: CertsRequest,
    certs: CertsExe<T>,
}

impl<T: Transport> GoogleIDTokenVerifier<T> {
    /// Binds a verifier to `config.client_id()`.
    /// Fails without any network access when the client ID is empty.
    pub fn new(config: &Config, transport: Arc<T>) -> Result<Self, Error> {
        if config.client_id.is_empty() {
            error!("Client ID not found in configuration");
            return Err(ConfigError::EmptyValue.into());
        }
        Ok(Self {
            audience: config.client_id.to_owned(),
            clock_skew: config.clock_skew,
            certs_request: CertsRequest::new(&config.certs_endpoint),
            certs: CertsExe::new(transport),
        })
    }

    /// Reads the client ID from `source`, then binds a verifier to it.
    pub fn from_source(
        reader: &ConfigReader,
        source: &ConfigSource,
        builder: ConfigBuilder,
        transport: Arc<T>,
    ) -> Result<Self, Error> {
        let client_id = reader.read_client_id(source)?;
        let config = builder.client_id_value(client_id).build();
        Self::new(&config, transport)
    }

    pub fn audience(&self) -> &ClientID {
        &self.audience
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);
        validation.leeway = self.clock_skew.as_secs();
        validation
    }

    async fn verify_token(&self, token: &IDTokenRow) -> Result<GoogleIDToken, VerifyError> {
        if token.0.trim().is_empty() {
            error!("Empty ID token");
            return Err(VerifyError::Decode);
        }

        let header = decode_header(token.as_str()).map_err(|e| {
            error!("Failed to decode ID token header: {:?}", e);
            VerifyError::Decode
        })?;
        if header.alg != Algorithm::RS256 {
            error!("Unsupported ID token algorithm {:?}", header.alg);
            return Err(VerifyError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }
        let kid = header.kid.as_deref().ok_or_else(|| {
            error!("ID token header has no kid");
            VerifyError::MissingKeyId
        })?;

        let jwks = self
            .certs
            .execute(&self.certs_request)
            .await
            .map_err(VerifyError::Certs)?;
        let jwk = jwks.find(kid).ok_or_else(|| {
            error!("No Google signing key with kid {}", kid);
            VerifyError::KeyNotFound(kid.to_string())
        })?;
        let key = DecodingKey::from_jwk(jwk).map_err(|e| {
            error!("Failed to load signing key {}: {:?}", kid, e);
            VerifyError::Certs(ExecuteError::Parse)
        })?;

        let data = decode::<IDToken>(token.as_str(), &key, &self.validation()).map_err(|e| {
            error!("ID token rejected: {:?}", e);
            VerifyError::from(e)
        })?;
        debug!("Verified ID token for subject {}", data.claims.sub);

        Ok(GoogleIDToken {
            header: data.header,
            payload: data.claims,
        })
    }
}

impl<T: Transport> TokenVerifier for GoogleIDTokenVerifier<T> {
    fn verify<'a>(&'a self, token: &'a IDTokenRow) -> BoxFuture<'a, Result<GoogleIDToken, VerifyError>> {
        Box::pin(self.verify_token(token))
    }
}
