//! Represents a nonce bound to a One Tap prompt.
use serde::{Deserialize, Serialize};

/// A `Nonce` is a **unique, random value** used to prevent replay attacks.
/// It is rendered into the One Tap `data-nonce` attribute and comes back as the
/// `nonce` claim of the ID token.
///
/// # **Usage**
///
/// - Generate one per prompt and keep it in the user's session.
/// - Pass it to `GoogleApiClient::one_tap_google_data_with_nonce` when the
///   credential is posted back.
///
/// # **Example**
///
/// ```rust,no_run
/// use tiny_google_signin::nonce::Nonce;
///
/// let nonce = Nonce::new();
/// println!("data-nonce=\"{}\"", nonce.value());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce(pub(crate) String);

impl Nonce {
    /// Generates a new nonce using **UUIDv4**.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Equivalent to `Nonce::new()`.
impl Default for Nonce {
    fn default() -> Self {
        Self::new()
    }
}

/// Restores a nonce that was stored in a session.
impl From<String> for Nonce {
    fn from(value: String) -> Self {
        Self(value)
    }
}
