//! Defines the settings shared by the userinfo fetch and ID token verification.
//!
//! ## Structures
//! - `Config`: Stores the client ID, Google endpoints and transport limits.
//! - `ConfigBuilder`: A builder for constructing a `Config` instance.
//! - `TokenPlacement`: Where the access token is put on the userinfo request.
//!
//! # Example
//! ```rust,no_run
//! use std::time::Duration;
//! use tiny_google_signin::config::Config;
//!
//! let config = Config::builder()
//!     .client_id("your-client-id.apps.googleusercontent.com")
//!     .timeout(Duration::from_secs(5))
//!     .build();
//! ```
//!
//! Only the client ID has no usable default. It is usually loaded with
//! [`ConfigReader`](crate::config_reader::ConfigReader).
use std::time::Duration;

pub const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
pub const CERTS_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/certs";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(10);

/// The OAuth client ID issued by Google Cloud Console.
/// ID tokens must carry it as their audience.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientID(pub(crate) String);

impl ClientID {
    /// Surrounding whitespace is dropped.
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Where the access token goes when calling the userinfo endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenPlacement {
    /// `Authorization: Bearer <token>`
    #[default]
    Header,
    /// `?access_token=<token>`.
    /// Query strings end up in proxy and server logs, so only use this
    /// for endpoints that do not accept the header.
    Query,
}

/// Holds the settings required to talk to Google on behalf of one OAuth client.
///
/// It is designed to be immutable once constructed.
///
/// # Fields
/// - `client_id`: The expected audience of One Tap ID tokens.
/// - `userinfo_endpoint`: The userinfo endpoint URL.
/// - `certs_endpoint`: The JWKS endpoint holding Google's signing keys.
/// - `timeout`: Upper bound for every outbound request.
/// - `clock_skew`: Leeway applied to `exp`/`iat` checks.
/// - `token_placement`: How the access token is attached to userinfo requests.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) client_id: ClientID,
    pub(crate) userinfo_endpoint: String,
    pub(crate) certs_endpoint: String,
    pub(crate) timeout: Duration,
    pub(crate) clock_skew: Duration,
    pub(crate) token_placement: TokenPlacement,
}
// ==========impl Config==========
impl Config {
    /// Returns a new `ConfigBuilder` instance to create a `Config` object.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn client_id(&self) -> &ClientID {
        &self.client_id
    }

    pub fn userinfo_endpoint(&self) -> &str {
        &self.userinfo_endpoint
    }

    pub fn certs_endpoint(&self) -> &str {
        &self.certs_endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    pub fn token_placement(&self) -> TokenPlacement {
        self.token_placement
    }
}

/// Provides a convenient way to create a `Config` instance step by step.
/// Unset fields fall back to Google's public endpoints and a 10 second timeout.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    client_id: ClientID,
    userinfo_endpoint: String,
    certs_endpoint: String,
    timeout: Duration,
    clock_skew: Duration,
    token_placement: TokenPlacement,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            client_id: ClientID::default(),
            userinfo_endpoint: USERINFO_ENDPOINT.to_string(),
            certs_endpoint: CERTS_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            clock_skew: DEFAULT_CLOCK_SKEW,
            token_placement: TokenPlacement::default(),
        }
    }
}

// ==========impl ConfigBuilder==========
impl ConfigBuilder {
    /// Creates a new `ConfigBuilder` instance with default values.
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    /// Sets the client ID obtained from Google Cloud Console.
    pub fn client_id(mut self, client_id: &str) -> Self {
        self.client_id = ClientID::new(client_id);
        self
    }

    /// Sets a client ID that was already loaded, e.g. by `ConfigReader`.
    pub fn client_id_value(mut self, client_id: ClientID) -> Self {
        self.client_id = client_id;
        self
    }

    /// Overrides the userinfo endpoint URL.
    pub fn userinfo_endpoint(mut self, endpoint: &str) -> Self {
        self.userinfo_endpoint = endpoint.to_string();
        self
    }

    /// Overrides the JWKS endpoint URL.
    pub fn certs_endpoint(mut self, endpoint: &str) -> Self {
        self.certs_endpoint = endpoint.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    pub fn token_placement(mut self, placement: TokenPlacement) -> Self {
        self.token_placement = placement;
        self
    }

    /// Constructs a `Config` instance with the provided values.
    pub fn build(self) -> Config {
        Config {
            client_id: self.client_id,
            userinfo_endpoint: self.userinfo_endpoint,
            certs_endpoint: self.certs_endpoint,
            timeout: self.timeout,
            clock_skew: self.clock_skew,
            token_placement: self.token_placement,
        }
    }
}
