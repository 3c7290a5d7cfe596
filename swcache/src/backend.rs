//! Backend origin for proxied API requests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A backend origin: scheme, host and optional port, with no path.
///
/// When API requests are proxied (see [`ApiMode::Proxy`][crate::config::ApiMode::Proxy]), the
/// intercepted request's path and query are re-targeted at this origin:
///
/// ```
/// # use swcache::Backend;
/// # use url::Url;
/// let backend = Backend::from_origin("http://127.0.0.1:8000").unwrap();
/// let url = Url::parse("https://app.example.com/api/items?page=2").unwrap();
/// assert_eq!(backend.rewrite(&url).as_str(), "http://127.0.0.1:8000/api/items?page=2");
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Backend {
    origin: Url,
}

impl Backend {
    /// Parse and validate a backend origin.
    ///
    /// See [`validate_backend()`] for the rules.
    pub fn from_origin(s: &str) -> Result<Self, BackendError> {
        s.parse()
    }

    /// The origin as a string, without a trailing slash.
    pub fn origin(&self) -> String {
        self.origin.origin().ascii_serialization()
    }

    /// Point `url`'s path and query at this backend.
    pub fn rewrite(&self, url: &Url) -> Url {
        let mut rewritten = self.origin.clone();
        rewritten.set_path(url.path());
        rewritten.set_query(url.query());
        rewritten
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origin())
    }
}

impl FromStr for Backend {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_backend(s).map(|origin| Self { origin })
    }
}

impl TryFrom<String> for Backend {
    type Error = BackendError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Backend> for String {
    fn from(backend: Backend) -> Self {
        backend.origin()
    }
}

/// Backend-related errors.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum BackendError {
    /// The origin was empty.
    #[error("empty backend origin")]
    EmptyOrigin,
    /// The origin is not a URL.
    #[error("invalid backend origin: {0}")]
    Parse(#[from] url::ParseError),
    /// Only `http` and `https` backends are supported.
    #[error("unsupported backend scheme `{0}`")]
    UnsupportedScheme(String),
    /// The origin has no host.
    #[error("backend origin has no host")]
    MissingHost,
    /// The origin carries a path, query, fragment or credentials.
    #[error("backend origin must be scheme://host[:port] only")]
    NotAnOrigin,
}

/// Validate a backend origin.
///
/// Backend origins:
///   * cannot be empty
///   * must use the `http` or `https` scheme
///   * must have a host, and may have a port
///   * cannot carry a path (other than `/`), query, fragment, user name or password
pub fn validate_backend(origin: &str) -> Result<Url, BackendError> {
    let origin = origin.trim();
    if origin.is_empty() {
        return Err(BackendError::EmptyOrigin);
    }
    let url = Url::parse(origin)?;
    if url.scheme() != "http" && url.scheme() != "https" {
        Err(BackendError::UnsupportedScheme(url.scheme().to_owned()))
    } else if !url.has_host() {
        Err(BackendError::MissingHost)
    } else if url.path() != "/"
        || url.query().is_some()
        || url.fragment().is_some()
        || !url.username().is_empty()
        || url.password().is_some()
    {
        Err(BackendError::NotAnOrigin)
    } else {
        Ok(url)
    }
}

#[cfg(test)]
mod validate_backend_tests {
    use super::*;

    #[test]
    fn valid_backend_origins_are_accepted() {
        let valid_backend_origins = [
            "http://127.0.0.1:8000",
            "https://api.example.com",
            "https://api.example.com/",
            "http://localhost:5000",
            "http://[::1]:8080",
            "  https://padded.example.com  ",
        ];
        for origin in valid_backend_origins.iter() {
            match validate_backend(origin) {
                Ok(_) => {}
                x => panic!(
                    "backend origin \"{}\" yielded unexpected result: {:?}",
                    origin, x
                ),
            }
        }
    }

    #[test]
    fn empty_str_is_not_accepted() {
        match validate_backend("") {
            Err(BackendError::EmptyOrigin) => {}
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[test]
    fn relative_origins_are_not_accepted() {
        match validate_backend("api.example.com:8000/") {
            Err(BackendError::UnsupportedScheme(_)) | Err(BackendError::Parse(_)) => {}
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[test]
    fn non_http_schemes_are_not_accepted() {
        match validate_backend("ftp://files.example.com") {
            Err(BackendError::UnsupportedScheme(scheme)) => assert_eq!(scheme, "ftp"),
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[test]
    fn paths_and_queries_are_not_accepted() {
        for origin in [
            "https://api.example.com/v1",
            "https://api.example.com/?x=1",
            "https://user:pw@api.example.com",
        ] {
            match validate_backend(origin) {
                Err(BackendError::NotAnOrigin) => {}
                x => panic!("origin \"{}\" yielded unexpected result: {:?}", origin, x),
            }
        }
    }

    #[test]
    fn rewrite_keeps_port_path_and_query() {
        let backend = Backend::from_origin("http://127.0.0.1:8000/").unwrap();
        assert_eq!(backend.origin(), "http://127.0.0.1:8000");
        let url = Url::parse("https://app.example.com/api/memories/3?expand=tags#top").unwrap();
        assert_eq!(
            backend.rewrite(&url).as_str(),
            "http://127.0.0.1:8000/api/memories/3?expand=tags"
        );
    }

    #[test]
    fn backends_deserialize_from_strings() {
        let backend: Backend = serde_json::from_str(r#""https://api.example.com""#).unwrap();
        assert_eq!(backend.to_string(), "https://api.example.com");
        assert!(serde_json::from_str::<Backend>(r#""https://api.example.com/v1""#).is_err());
    }
}
