//! The two Google Sign-In operations behind one long-lived client.
//!
//! - `button_google_data`: fetch the userinfo profile with a button access token.
//! - `one_tap_google_data`: verify a One Tap ID token against the configured client ID.
//!
//! The HTTP transport and the verifier are built once and reused by every call.
//! `GoogleApiClient` is `Send + Sync` and can be shared behind an `Arc`.
//!
//! # Example
//! ```rust,no_run
//! use tiny_google_signin::{
//!     client::GoogleApiClient,
//!     config::Config,
//!     config_reader::{ConfigReader, ConfigSource},
//!     userinfo::{AccessToken, UserInfo},
//! };
//!
//! # async fn run() -> Result<(), tiny_google_signin::error::Error> {
//! let reader = ConfigReader::new("resources");
//! let client = GoogleApiClient::from_source(&reader, &ConfigSource::from_config_type("yaml"), Config::builder())?;
//!
//! let res = client.button_google_data(&AccessToken::new("ya29...")).await?;
//! let profile = UserInfo::from_response(&res)?;
//!
//! let id_token = client.one_tap_google_data("eyJ...").await?;
//! # Ok(())
//! # }
//! ```
use std::sync::Arc;

use http::Response;
use tracing::error;

use crate::{
    config::{Config, ConfigBuilder},
    config_reader::{ConfigReader, ConfigSource},
    error::Error,
    executer::{Executer, ReqwestTransport, Transport, UserInfoExe},
    id_token::{GoogleIDToken, IDTokenRow},
    nonce::Nonce,
    userinfo::{AccessToken, UserInfoRequest},
    verifier::{GoogleIDTokenVerifier, TokenVerifier, VerifyError},
};

pub struct GoogleApiClient<T = ReqwestTransport, V = GoogleIDTokenVerifier<T>> {
    config: Config,
    userinfo: UserInfoExe<T>,
    verifier: V,
}

impl GoogleApiClient {
    /// Builds the reqwest transport and the ID token verifier from `config`.
    pub fn new(config: Config) -> Result<Self, Error> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        let verifier = GoogleIDTokenVerifier::new(&config, Arc::clone(&transport))?;
        Ok(Self::with_parts(config, transport, verifier))
    }

    /// Reads the client ID from `source` and builds the client.
    pub fn from_source(
        reader: &ConfigReader,
        source: &ConfigSource,
        builder: ConfigBuilder,
    ) -> Result<Self, Error> {
        let client_id = reader.read_client_id(source)?;
        Self::new(builder.client_id_value(client_id).build())
    }
}

impl<T, V> GoogleApiClient<T, V>
where
    T: Transport,
    V: TokenVerifier,
{
    /// Assembles a client from an existing transport and verifier.
    pub fn with_parts(config: Config, transport: Arc<T>, verifier: V) -> Self {
        Self {
            config,
            userinfo: UserInfoExe::new(transport),
            verifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sends `GET userinfo` with the access token and returns the raw response.
    /// The status is not checked; see `UserInfo::from_response`.
    pub async fn button_google_data(&self, access_token: &AccessToken) -> Result<Response<String>, Error> {
        let req = UserInfoRequest::new(&self.config, access_token);
        let res = self.userinfo.execute(&req).await?;
        Ok(res)
    }

    /// Verifies a One Tap credential and returns the decoded token.
    pub async fn one_tap_google_data(&self, id_token: &str) -> Result<GoogleIDToken, Error> {
        let token = IDTokenRow::new(id_token);
        let verified = self.verifier.verify(&token).await?;
        Ok(verified)
    }

    /// Like `one_tap_google_data`, but also requires the `nonce` claim to equal `nonce`.
    pub async fn one_tap_google_data_with_nonce(
        &self,
        id_token: &str,
        nonce: &Nonce,
    ) -> Result<GoogleIDToken, Error> {
        let verified = self.one_tap_google_data(id_token).await?;
        match &verified.payload.nonce {
            Some(v) if v == nonce => Ok(verified),
            _ => {
                error!("ID token nonce does not match");
                Err(VerifyError::NonceMismatch.into())
            }
        }
    }
}
