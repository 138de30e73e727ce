//! Token extraction from requests

use super::config::{TokenOrigin, TokenSource};
use super::request::RequestView;
use super::token::EncodedToken;

/// Tries the configured token sources in order
#[derive(Debug, Clone)]
pub struct TokenLocator {
    sources: Vec<TokenSource>,
}

impl TokenLocator {
    #[must_use]
    pub const fn new(sources: Vec<TokenSource>) -> Self {
        Self { sources }
    }

    #[must_use]
    pub fn sources(&self) -> &[TokenSource] {
        &self.sources
    }

    /// Return the value of the first present source.
    ///
    /// A present but empty value still wins; later sources are not consulted.
    pub fn locate(&self, request: &impl RequestView) -> Option<EncodedToken> {
        self.sources.iter().find_map(|source| {
            let value = match source.origin {
                TokenOrigin::Header => request.header(&source.name),
                TokenOrigin::Cookie => request.cookie(&source.name),
                TokenOrigin::Query => request.argument(&source.name),
            }?;

            tracing::trace!(source = %source, "Token located");
            Some(EncodedToken::new(value.into_owned()))
        })
    }
}
