use thiserror::Error;

use crate::{config_reader::ConfigError, executer::ExecuteError, verifier::VerifyError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Execute(#[from] ExecuteError),
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// Coarse classification of an `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The client ID could not be loaded.
    Config,
    /// Google could not be reached or answered garbage.
    Network,
    /// The ID token or One Tap callback was rejected.
    TokenInvalid,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Execute(_) | Error::Verify(VerifyError::Certs(_)) => ErrorKind::Network,
            Error::Verify(_) => ErrorKind::TokenInvalid,
        }
    }
}
