//! Tiny server-side library for Google Sign-In.
//!
//! This library covers the two server-side steps of Google's web sign-in:
//! fetching the profile behind a "Sign in with Google" button access token,
//! and verifying the ID token posted by Google One Tap.
//! [google document](https://developers.google.com/identity/gsi/web/guides/verify-google-id-token)
//! # Feature
//! - Load the OAuth client ID from a properties or YAML file
//! - Fetch userinfo with an access token (using reqwest)
//! - Verify a One Tap ID token: signature, expiry, issuer and audience (using jsonwebtoken)
//! - Check the One Tap double-submit CSRF cookie and an optional nonce
//! # Caution
//! - Google's signing keys are fetched on every verification. There is no key cache.
//! - Nothing is retried. Every failure is returned to the caller as an `Error`.
//! # Examples
//! For example usage, see the `demos` directory.
pub mod client;
pub mod config;
pub mod config_reader;
pub mod csrf_token;
pub mod error;
pub mod executer;
pub mod id_token;
pub mod nonce;
pub mod userinfo;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;
