//! Deployment configuration.
//!
//! Everything that is fixed when a version of the interceptor is deployed lives in a
//! [`WorkerConfig`]: the cache namespace name (which embeds the version), the precache list, the
//! API prefix, the exclusion rules, how API requests reach the backend and the texts shown to
//! pages.
//!
//! ```
//! # use swcache::config::{ApiMode, WorkerConfig};
//! let config = WorkerConfig::from_json_str(r#"{
//!     "cache_name": "rememory-cache-v3",
//!     "scope": "https://app.example.com/",
//!     "api": { "mode": "proxy", "backend": "http://127.0.0.1:8000" }
//! }"#).unwrap();
//! assert_eq!(config.cache_name(), "rememory-cache-v3");
//! assert!(matches!(config.api(), ApiMode::Proxy { .. }));
//! ```

use crate::backend::{Backend, BackendError};
use crate::http::HeaderName;
use serde::{Deserialize, Serialize};
use swcache_shared::{
    DEFAULT_API_PREFIX, DEFAULT_NAVIGATION_FALLBACK, DEFAULT_OFFLINE_MESSAGE,
    DEFAULT_UPDATE_MESSAGE, EXTENSION_SCHEME, SENTINEL_HOST, SENTINEL_PORT,
};
use url::Url;

/// Default name of the current cache namespace.
pub const DEFAULT_CACHE_NAME: &str = "swcache-v1";

/// Default scope the precache paths and the navigation fallback are resolved against.
pub const DEFAULT_SCOPE: &str = "http://localhost/";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration is not valid JSON, or does not have the expected shape.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The cache namespace name is empty.
    #[error("cache name cannot be empty")]
    EmptyCacheName,
    /// The scope is not an `http` or `https` URL.
    #[error("scope must be an http(s) URL, got `{0}`")]
    InvalidScope(String),
    /// The API prefix does not start and end with `/`.
    #[error("API prefix must start and end with `/`, got `{0}`")]
    InvalidApiPrefix(String),
    /// An excluded host entry is not `host:port`.
    #[error("excluded host must be `host:port`, got `{0}`")]
    InvalidExcludedHost(String),
    /// A precache path or the navigation fallback does not resolve against the scope.
    #[error("path `{path}` does not resolve against the scope: {source}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it did not resolve.
        source: url::ParseError,
    },
    /// A cache key header is not a valid header name.
    #[error("invalid cache key header `{0}`")]
    InvalidHeaderName(String),
    /// The proxy backend is not a valid origin.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// How requests under the API prefix reach the backend.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ApiMode {
    /// Forward the request unmodified.
    Passthrough,
    /// Re-target the request's path and query at `backend`, sending credentials cross-origin.
    Proxy {
        /// Origin API requests are sent to.
        backend: Backend,
    },
}

impl ApiMode {
    /// Proxy API requests to the given backend origin.
    pub fn proxy(origin: &str) -> Result<Self, BackendError> {
        Ok(Self::Proxy {
            backend: Backend::from_origin(origin)?,
        })
    }
}

impl Default for ApiMode {
    fn default() -> Self {
        Self::Passthrough
    }
}

/// Overall behavior of the interceptor.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerMode {
    /// Exclusions, network-first API handling, opportunistic caching, offline fallbacks, update
    /// notifications and `SKIP_WAITING`.
    Full,
    /// Every request is cache-first with a plain network fallback. Nothing is cached at fetch
    /// time, network failures are not masked, and activation only cleans up.
    Uniform,
}

impl Default for WorkerMode {
    fn default() -> Self {
        Self::Full
    }
}

/// How a request is handled, decided from its URL alone.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Route {
    /// Not intercepted at all.
    Excluded,
    /// Network-first with a cache fallback.
    Api,
    /// Cache-first with a network fallback.
    Static,
}

/// Deployment configuration of an [`Interceptor`][crate::Interceptor].
///
/// Every field has a default, so a JSON configuration only needs the fields it changes. Builder
/// methods prefixed `with_` are provided for configuring in code.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    cache_name: String,
    scope: Url,
    precache: Vec<String>,
    api_prefix: String,
    excluded_schemes: Vec<String>,
    excluded_hosts: Vec<String>,
    navigation_fallback: String,
    api: ApiMode,
    mode: WorkerMode,
    offline_message: String,
    update_message: String,
    cache_key_headers: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_owned(),
            scope: Url::parse(DEFAULT_SCOPE).expect("default scope is a valid URL"),
            precache: vec!["/".to_owned(), "/index.html".to_owned()],
            api_prefix: DEFAULT_API_PREFIX.to_owned(),
            excluded_schemes: vec![EXTENSION_SCHEME.to_owned()],
            excluded_hosts: vec![format!("{}:{}", SENTINEL_HOST, SENTINEL_PORT)],
            navigation_fallback: DEFAULT_NAVIGATION_FALLBACK.to_owned(),
            api: ApiMode::default(),
            mode: WorkerMode::default(),
            offline_message: DEFAULT_OFFLINE_MESSAGE.to_owned(),
            update_message: DEFAULT_UPDATE_MESSAGE.to_owned(),
            cache_key_headers: Vec::new(),
        }
    }
}

impl WorkerConfig {
    /// Create a configuration with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration that has already been decoded.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the interceptor cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::EmptyCacheName);
        }
        if !matches!(self.scope.scheme(), "http" | "https") || !self.scope.has_host() {
            return Err(ConfigError::InvalidScope(self.scope.to_string()));
        }
        if !(self.api_prefix.starts_with('/') && self.api_prefix.ends_with('/')) {
            return Err(ConfigError::InvalidApiPrefix(self.api_prefix.clone()));
        }
        for entry in &self.excluded_hosts {
            parse_host_port(entry).ok_or_else(|| ConfigError::InvalidExcludedHost(entry.clone()))?;
        }
        self.precache_urls()?;
        self.navigation_fallback_url()?;
        self.key_headers()?;
        Ok(())
    }

    /// The name of the current cache namespace.
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// Builder-style setter for the current cache namespace name.
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    /// The URL relative paths are resolved against.
    pub fn scope(&self) -> &Url {
        &self.scope
    }

    /// Builder-style setter for the scope.
    pub fn with_scope(mut self, scope: Url) -> Self {
        self.scope = scope;
        self
    }

    /// The paths fetched and stored at install time.
    pub fn precache(&self) -> &[String] {
        &self.precache
    }

    /// Builder-style setter for the precache paths.
    pub fn with_precache<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precache = paths.into_iter().map(Into::into).collect();
        self
    }

    /// The precache paths resolved against the scope, in order.
    pub fn precache_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.precache.iter().map(|path| self.resolve(path)).collect()
    }

    /// The path prefix of API requests.
    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// Builder-style setter for the API prefix.
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Builder-style setter for the URL schemes that are never intercepted.
    pub fn with_excluded_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_schemes = schemes.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style setter for the `host:port` targets that are never intercepted.
    pub fn with_excluded_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// The page served to navigations that fail while offline.
    pub fn navigation_fallback(&self) -> &str {
        &self.navigation_fallback
    }

    /// Builder-style setter for the navigation fallback path.
    pub fn with_navigation_fallback(mut self, path: impl Into<String>) -> Self {
        self.navigation_fallback = path.into();
        self
    }

    /// The navigation fallback resolved against the scope.
    pub fn navigation_fallback_url(&self) -> Result<Url, ConfigError> {
        self.resolve(&self.navigation_fallback)
    }

    /// How API requests reach the backend.
    pub fn api(&self) -> &ApiMode {
        &self.api
    }

    /// Builder-style setter for the API mode.
    pub fn with_api(mut self, api: ApiMode) -> Self {
        self.api = api;
        self
    }

    /// The overall behavior of the interceptor.
    pub fn mode(&self) -> WorkerMode {
        self.mode
    }

    /// Builder-style setter for the overall behavior.
    pub fn with_mode(mut self, mode: WorkerMode) -> Self {
        self.mode = mode;
        self
    }

    /// The `message` of the offline API error body.
    pub fn offline_message(&self) -> &str {
        &self.offline_message
    }

    /// Builder-style setter for the offline API error message.
    pub fn with_offline_message(mut self, message: impl Into<String>) -> Self {
        self.offline_message = message.into();
        self
    }

    /// The `message` of the update notification.
    pub fn update_message(&self) -> &str {
        &self.update_message
    }

    /// Builder-style setter for the update notification message.
    pub fn with_update_message(mut self, message: impl Into<String>) -> Self {
        self.update_message = message.into();
        self
    }

    /// Builder-style setter for the request headers whose values become part of the cache key.
    pub fn with_cache_key_headers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cache_key_headers = names.into_iter().map(Into::into).collect();
        self
    }

    /// The request headers whose values become part of the cache key.
    pub fn key_headers(&self) -> Result<Vec<HeaderName>, ConfigError> {
        self.cache_key_headers
            .iter()
            .map(|name| {
                HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| ConfigError::InvalidHeaderName(name.clone()))
            })
            .collect()
    }

    /// Decide how a request for `url` is handled.
    ///
    /// In [`WorkerMode::Uniform`] every request is [`Route::Static`].
    pub fn classify(&self, url: &Url) -> Route {
        if self.mode == WorkerMode::Uniform {
            return Route::Static;
        }
        if self.is_excluded(url) {
            Route::Excluded
        } else if url.path().starts_with(&self.api_prefix) {
            Route::Api
        } else {
            Route::Static
        }
    }

    fn is_excluded(&self, url: &Url) -> bool {
        if self
            .excluded_schemes
            .iter()
            .any(|scheme| url.scheme().starts_with(scheme.as_str()))
        {
            return true;
        }
        let (host, port) = match (url.host_str(), url.port_or_known_default()) {
            (Some(host), Some(port)) => (host, port),
            _ => return false,
        };
        self.excluded_hosts.iter().any(|entry| {
            parse_host_port(entry)
                .map(|(h, p)| h.eq_ignore_ascii_case(host) && p == port)
                .unwrap_or(false)
        })
    }

    fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        self.scope
            .join(path)
            .map_err(|source| ConfigError::InvalidPath {
                path: path.to_owned(),
                source,
            })
    }
}

fn parse_host_port(entry: &str) -> Option<(&str, u16)> {
    let (host, port) = entry.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    Some((host, port.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let config = WorkerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.cache_name(), "swcache-v1");
        assert_eq!(config.api_prefix(), "/api/");
        assert_eq!(config.api(), &ApiMode::Passthrough);
        assert_eq!(config.mode(), WorkerMode::Full);
        assert_eq!(
            config.navigation_fallback_url().unwrap().as_str(),
            "http://localhost/index.html"
        );
    }

    #[test]
    fn classify_routes_requests() {
        let config = WorkerConfig::default();
        assert_eq!(
            config.classify(&url("chrome-extension://abcdef/popup.js")),
            Route::Excluded
        );
        assert_eq!(
            config.classify(&url("http://localhost:0/ping")),
            Route::Excluded
        );
        assert_eq!(
            config.classify(&url("http://localhost:8080/api/items")),
            Route::Api
        );
        assert_eq!(
            config.classify(&url("https://app.example.com/api/items?page=2")),
            Route::Api
        );
        assert_eq!(
            config.classify(&url("https://app.example.com/apiary.png")),
            Route::Static
        );
        assert_eq!(
            config.classify(&url("https://app.example.com/dashboard")),
            Route::Static
        );
    }

    #[test]
    fn uniform_mode_classifies_everything_as_static() {
        let config = WorkerConfig::default().with_mode(WorkerMode::Uniform);
        for u in [
            "chrome-extension://abcdef/popup.js",
            "http://localhost:0/ping",
            "https://app.example.com/api/items",
        ] {
            assert_eq!(config.classify(&url(u)), Route::Static, "{}", u);
        }
    }

    #[test]
    fn precache_paths_resolve_against_the_scope() {
        let config = WorkerConfig::default()
            .with_scope(url("https://app.example.com/app/"))
            .with_precache(["./", "./index.html", "/manifest.json"]);
        let urls: Vec<String> = config
            .precache_urls()
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            urls,
            [
                "https://app.example.com/app/",
                "https://app.example.com/app/index.html",
                "https://app.example.com/manifest.json",
            ]
        );
    }

    #[test]
    fn json_configuration_is_parsed() {
        let config = WorkerConfig::from_json_value(json!({
            "cache_name": "rememory-cache-v3",
            "api": { "mode": "proxy", "backend": "http://127.0.0.1:8000" },
            "mode": "full",
            "cache_key_headers": ["accept-language"],
        }))
        .unwrap();
        assert_eq!(config.cache_name(), "rememory-cache-v3");
        assert_eq!(config.api(), &ApiMode::proxy("http://127.0.0.1:8000").unwrap());
        assert_eq!(config.key_headers().unwrap(), ["accept-language"]);
        assert_eq!(config.precache(), ["/", "/index.html"]);
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        assert!(matches!(
            WorkerConfig::from_json_str(r#"{ "cache_name": "" }"#),
            Err(ConfigError::EmptyCacheName)
        ));
        assert!(matches!(
            WorkerConfig::from_json_str(r#"{ "api_prefix": "api" }"#),
            Err(ConfigError::InvalidApiPrefix(_))
        ));
        assert!(matches!(
            WorkerConfig::from_json_str(r#"{ "scope": "ftp://files.example.com/" }"#),
            Err(ConfigError::InvalidScope(_))
        ));
        assert!(matches!(
            WorkerConfig::from_json_str(r#"{ "excluded_hosts": ["localhost"] }"#),
            Err(ConfigError::InvalidExcludedHost(_))
        ));
        assert!(matches!(
            WorkerConfig::from_json_str(r#"{ "cache_key_headers": ["bad header"] }"#),
            Err(ConfigError::InvalidHeaderName(_))
        ));
        assert!(matches!(
            WorkerConfig::from_json_str(r#"{ "api": { "mode": "proxy", "backend": "/relative" } }"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            WorkerConfig::from_json_str(r#"{ "unknown_field": 1 }"#),
            Err(ConfigError::Json(_))
        ));
    }
}
