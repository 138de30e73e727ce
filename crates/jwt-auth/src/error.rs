use thiserror::Error;

use crate::auth::AuthError;

/// Errors raised while loading configuration and assembling the
/// authentication pipeline at startup.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Auth(AuthError::Config(_)))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
