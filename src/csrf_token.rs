//! Double-submit CSRF check for the One Tap callback.
//!
//! Google sets a `g_csrf_token` cookie and posts the same value as a form field
//! to the `login_uri`. Both must be present and equal.
use tracing::error;

use crate::verifier::VerifyError;

/// Name of both the cookie and the form field.
pub const CSRF_TOKEN_NAME: &str = "g_csrf_token";

/// A CSRF token received from Google's One Tap callback.
///
/// This token **has not been verified yet** and should be checked against the cookie before proceeding.
#[derive(Debug, Clone)]
pub struct UnCheckedCSRFToken(pub(crate) String);

impl From<String> for UnCheckedCSRFToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl UnCheckedCSRFToken {
    /// Checks the form value against the cookie value.
    pub fn verify(&self, cookie_val: Option<&str>) -> Result<(), VerifyError> {
        match cookie_val {
            Some(v) if !self.0.is_empty() && v == self.0 => Ok(()),
            Some(_) => {
                error!("{} cookie does not match the posted value", CSRF_TOKEN_NAME);
                Err(VerifyError::CSRFNotMatch)
            }
            None => {
                error!("No {} cookie", CSRF_TOKEN_NAME);
                Err(VerifyError::CSRFNotMatch)
            }
        }
    }
}

/// Verifies the double-submit pair taken from a One Tap callback.
pub fn verify_one_tap_csrf(cookie_val: Option<&str>, body_val: Option<&str>) -> Result<(), VerifyError> {
    let Some(body_val) = body_val else {
        error!("No {} in post body", CSRF_TOKEN_NAME);
        return Err(VerifyError::CSRFNotMatch);
    };
    UnCheckedCSRFToken::from(body_val.to_string()).verify(cookie_val)
}
