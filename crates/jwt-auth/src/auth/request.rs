//! Read-only view of an inbound request

use std::borrow::Cow;
use std::collections::HashMap;

/// The request lookups the token locator needs.
///
/// `None` means "not present". A present-but-empty value is `Some("")`.
pub trait RequestView {
    fn header(&self, name: &str) -> Option<Cow<'_, str>>;

    fn cookie(&self, name: &str) -> Option<Cow<'_, str>>;

    /// Query-string argument
    fn argument(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// Plain request value, for hosts without an HTTP stack and for the CLI
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    arguments: HashMap<String, String>,
}

impl RequestParts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Header names are matched case-insensitively
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }
}

impl RequestView for RequestParts {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| Cow::Borrowed(v.as_str()))
    }

    fn cookie(&self, name: &str) -> Option<Cow<'_, str>> {
        self.cookies.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }

    fn argument(&self, name: &str) -> Option<Cow<'_, str>> {
        self.arguments.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

#[cfg(feature = "http")]
mod http {
    use std::borrow::Cow;

    use axum::http::{Request, header};

    use super::RequestView;

    /// Find `name` in a `Cookie` header value (`a=1; b=2`)
    pub(super) fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
        cookie_header.split(';').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().trim_matches('"'))
        })
    }

    pub(super) fn query_value<'a>(query: &'a str, name: &str) -> Option<Cow<'a, str>> {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    // Header values that are not UTF-8 still count as present
    impl<B> RequestView for Request<B> {
        fn header(&self, name: &str) -> Option<Cow<'_, str>> {
            self.headers()
                .get(name)
                .map(|v| String::from_utf8_lossy(v.as_bytes()))
        }

        fn cookie(&self, name: &str) -> Option<Cow<'_, str>> {
            self.headers()
                .get_all(header::COOKIE)
                .iter()
                .find_map(|v| match String::from_utf8_lossy(v.as_bytes()) {
                    Cow::Borrowed(s) => cookie_value(s, name).map(Cow::Borrowed),
                    Cow::Owned(s) => cookie_value(&s, name).map(|c| Cow::Owned(c.to_owned())),
                })
        }

        fn argument(&self, name: &str) -> Option<Cow<'_, str>> {
            self.uri().query().and_then(|q| query_value(q, name))
        }
    }
}
