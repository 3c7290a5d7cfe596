//! HTTP requests.

use super::body::{Body, BodyError};
use crate::convert::{ToHeaderName, ToHeaderValue, ToMethod, ToUrl};
use crate::error::Error;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Version};
use mime::Mime;
use serde::Serialize;
use swcache_shared::{CredentialsMode, RequestDestination, RequestMode};
use thiserror::Error;
use url::Url;

/// An intercepted or outgoing HTTP request, including body, headers, method, and URL.
///
/// Besides the usual HTTP parts, a request carries the metadata a browser attaches to it: its
/// [`RequestMode`] (is it a navigation?), its [`RequestDestination`] (what will the response be
/// used for?) and its [`CredentialsMode`].
///
/// # Builder-style methods
///
/// Methods with the `with_` name prefix return `Self` to allow chaining:
///
/// ```
/// # use swcache::Request;
/// use swcache::http::RequestMode;
/// let req = Request::get("https://app.example.com/dashboard")
///     .with_mode(RequestMode::Navigate)
///     .with_header("accept", "text/html");
/// assert!(req.is_navigation());
/// ```
///
/// # Setter methods
///
/// Setter methods, such as [`set_header()`][`Self::set_header()`], are prefixed by `set_` and can
/// be mixed freely with the builder-style methods.
#[derive(Debug)]
pub struct Request {
    version: Version,
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Body>,
    mode: RequestMode,
    destination: RequestDestination,
    credentials: CredentialsMode,
}

impl Request {
    /// Create a new request with the given method and URL, no headers, and an empty body.
    ///
    /// The request starts out as a programmatic fetch: mode [`RequestMode::Cors`], destination
    /// [`RequestDestination::Empty`] and credentials [`CredentialsMode::SameOrigin`].
    pub fn new(method: impl ToMethod, url: impl ToUrl) -> Self {
        Self {
            version: Version::HTTP_11,
            method: method.into_owned(),
            url: url.into_owned(),
            headers: HeaderMap::new(),
            body: None,
            mode: RequestMode::default(),
            destination: RequestDestination::default(),
            credentials: CredentialsMode::default(),
        }
    }

    /// Make a new request with the same method, url, headers, metadata and version of this
    /// request, but no body.
    pub fn clone_without_body(&self) -> Request {
        Self {
            version: self.version,
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: None,
            mode: self.mode,
            destination: self.destination,
            credentials: self.credentials,
        }
    }

    /// Create a new `GET` [`Request`] with the given URL, no headers, and an empty body.
    pub fn get(url: impl ToUrl) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a new `HEAD` [`Request`] with the given URL, no headers, and an empty body.
    pub fn head(url: impl ToUrl) -> Self {
        Self::new(Method::HEAD, url)
    }

    /// Create a new `POST` [`Request`] with the given URL, no headers, and an empty body.
    pub fn post(url: impl ToUrl) -> Self {
        Self::new(Method::POST, url)
    }

    /// Create a new `PUT` [`Request`] with the given URL, no headers, and an empty body.
    pub fn put(url: impl ToUrl) -> Self {
        Self::new(Method::PUT, url)
    }

    /// Create a new `DELETE` [`Request`] with the given URL, no headers, and an empty body.
    pub fn delete(url: impl ToUrl) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Create a new `PATCH` [`Request`] with the given URL, no headers, and an empty body.
    pub fn patch(url: impl ToUrl) -> Self {
        Self::new(Method::PATCH, url)
    }

    /// Builder-style equivalent of [`set_body()`][`Self::set_body()`].
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.set_body(body);
        self
    }

    /// Returns `true` if this request has a body.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Set the given value as the request's body.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = Some(body.into());
    }

    /// Take and return the body from this request, if it has one.
    ///
    /// After calling this method, this request will no longer have a body.
    pub fn try_take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Take and return the body from this request.
    ///
    /// After calling this method, this request will no longer have a body. An empty body is
    /// returned if there was none.
    pub fn take_body(&mut self) -> Body {
        self.body.take().unwrap_or_default()
    }

    /// Consume the request and return its body, or an empty body if it had none.
    pub fn into_body(self) -> Body {
        self.body.unwrap_or_default()
    }

    /// Read the request body into memory, if there is one.
    pub async fn take_body_bytes(&mut self) -> Result<Option<bytes::Bytes>, BodyError> {
        match self.body.take() {
            Some(body) => Ok(Some(body.into_bytes().await?)),
            None => Ok(None),
        }
    }

    /// Builder-style equivalent of [`set_body_text_plain()`][`Self::set_body_text_plain()`].
    pub fn with_body_text_plain(mut self, body: &str) -> Self {
        self.set_body_text_plain(body);
        self
    }

    /// Set the given string as the request's body with content type `text/plain; charset=UTF-8`.
    pub fn set_body_text_plain(&mut self, body: &str) {
        self.body = Some(Body::from(body));
        self.set_content_type(mime::TEXT_PLAIN_UTF_8);
    }

    /// Builder-style equivalent of [`set_body_json()`][`Self::set_body_json()`].
    pub fn with_body_json(mut self, value: &impl Serialize) -> Result<Self, serde_json::Error> {
        self.set_body_json(value)?;
        Ok(self)
    }

    /// Convert the given value to JSON and set that JSON as the request's body.
    ///
    /// The content type is set to `application/json`.
    pub fn set_body_json(&mut self, value: &impl Serialize) -> Result<(), serde_json::Error> {
        self.body = Some(Body::from(serde_json::to_vec(value)?));
        self.set_content_type(mime::APPLICATION_JSON);
        Ok(())
    }

    /// Get the MIME type described by the request's `Content-Type` header, or `None` if that
    /// header is absent or does not parse.
    pub fn get_content_type(&self) -> Option<Mime> {
        self.get_header_str(http::header::CONTENT_TYPE)
            .and_then(|v| v.parse().ok())
    }

    /// Set the MIME type described by the request's `Content-Type` header.
    ///
    /// Any existing `Content-Type` header values will be overwritten.
    pub fn set_content_type(&mut self, mime: Mime) {
        self.set_header(http::header::CONTENT_TYPE, mime.as_ref())
    }

    /// Returns whether the given header name is present in the request.
    pub fn contains_header(&self, name: impl ToHeaderName) -> bool {
        self.headers.contains_key(name.into_owned())
    }

    /// Builder-style equivalent of [`append_header()`][`Self::append_header()`].
    pub fn with_header(mut self, name: impl ToHeaderName, value: impl ToHeaderValue) -> Self {
        self.append_header(name, value);
        self
    }

    /// Builder-style equivalent of [`set_header()`][`Self::set_header()`].
    pub fn with_set_header(mut self, name: impl ToHeaderName, value: impl ToHeaderValue) -> Self {
        self.set_header(name, value);
        self
    }

    /// Get the value of a header as a string, or `None` if the header is not present or is not
    /// valid UTF-8.
    ///
    /// If there are multiple values for the header, only one is returned.
    pub fn get_header_str(&self, name: impl ToHeaderName) -> Option<&str> {
        self.get_header(name).and_then(|hdr| hdr.to_str().ok())
    }

    /// Get the value of a header, or `None` if the header is not present.
    pub fn get_header(&self, name: impl ToHeaderName) -> Option<&HeaderValue> {
        self.headers.get(name.into_owned())
    }

    /// Get all values of a header.
    pub fn get_header_all(&self, name: impl ToHeaderName) -> impl Iterator<Item = &HeaderValue> {
        self.headers.get_all(name.into_owned()).into_iter()
    }

    /// Get an iterator of all the request's header names and values.
    pub fn get_headers(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter()
    }

    /// Borrow the request's header map.
    pub fn get_header_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a request header to the given value, discarding any previous values for the given
    /// header name.
    pub fn set_header(&mut self, name: impl ToHeaderName, value: impl ToHeaderValue) {
        self.headers.insert(name.into_owned(), value.into_owned());
    }

    /// Add a request header with given value.
    ///
    /// Unlike [`set_header()`][`Self::set_header()`], this does not discard existing values for
    /// the same header name.
    pub fn append_header(&mut self, name: impl ToHeaderName, value: impl ToHeaderValue) {
        self.headers.append(name.into_owned(), value.into_owned());
    }

    /// Remove all request headers of the given name, and return one of the removed header values
    /// if any were present.
    pub fn remove_header(&mut self, name: impl ToHeaderName) -> Option<HeaderValue> {
        self.headers.remove(name.into_owned())
    }

    /// Builder-style equivalent of [`set_method()`][`Self::set_method()`].
    pub fn with_method(mut self, method: impl ToMethod) -> Self {
        self.set_method(method);
        self
    }

    /// Get the request method as a string.
    pub fn get_method_str(&self) -> &str {
        self.method.as_str()
    }

    /// Get the request method.
    pub fn get_method(&self) -> &Method {
        &self.method
    }

    /// Set the request method.
    pub fn set_method(&mut self, method: impl ToMethod) {
        self.method = method.into_owned();
    }

    /// Returns `true` for the read-only retrieval methods, `GET` and `HEAD`.
    pub fn is_retrieval(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }

    /// Builder-style equivalent of [`set_url()`][`Self::set_url()`].
    pub fn with_url(mut self, url: impl ToUrl) -> Self {
        self.set_url(url);
        self
    }

    /// Get the request URL as a string.
    pub fn get_url_str(&self) -> &str {
        self.url.as_str()
    }

    /// Get a shared reference to the request URL.
    pub fn get_url(&self) -> &Url {
        &self.url
    }

    /// Set the request URL.
    pub fn set_url(&mut self, url: impl ToUrl) {
        self.url = url.into_owned();
    }

    /// Get the path component of the request URL.
    pub fn get_path(&self) -> &str {
        self.url.path()
    }

    /// Get the query component of the request URL, if it exists, as a percent-encoded ASCII
    /// string.
    pub fn get_query_str(&self) -> Option<&str> {
        self.url.query()
    }

    /// Builder-style equivalent of [`set_version()`][`Self::set_version()`].
    pub fn with_version(mut self, version: Version) -> Self {
        self.set_version(version);
        self
    }

    /// Get the HTTP version of this request.
    pub fn get_version(&self) -> Version {
        self.version
    }

    /// Set the HTTP version of this request.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Builder-style equivalent of [`set_mode()`][`Self::set_mode()`].
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.set_mode(mode);
        self
    }

    /// Get the mode this request was made with.
    pub fn get_mode(&self) -> RequestMode {
        self.mode
    }

    /// Set the mode of this request.
    pub fn set_mode(&mut self, mode: RequestMode) {
        self.mode = mode;
    }

    /// Returns `true` if this request is a top-level navigation.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Builder-style equivalent of [`set_destination()`][`Self::set_destination()`].
    pub fn with_destination(mut self, destination: RequestDestination) -> Self {
        self.set_destination(destination);
        self
    }

    /// Get what the response to this request will be used for.
    pub fn get_destination(&self) -> RequestDestination {
        self.destination
    }

    /// Set the destination of this request.
    pub fn set_destination(&mut self, destination: RequestDestination) {
        self.destination = destination;
    }

    /// Builder-style equivalent of [`set_credentials()`][`Self::set_credentials()`].
    pub fn with_credentials(mut self, credentials: CredentialsMode) -> Self {
        self.set_credentials(credentials);
        self
    }

    /// Get whether credentials travel with this request.
    pub fn get_credentials(&self) -> CredentialsMode {
        self.credentials
    }

    /// Set whether credentials travel with this request.
    pub fn set_credentials(&mut self, credentials: CredentialsMode) {
        self.credentials = credentials;
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct BrowserExts {
    mode: RequestMode,
    destination: RequestDestination,
    credentials: CredentialsMode,
}

impl TryFrom<Request> for http::Request<Body> {
    type Error = http::uri::InvalidUri;

    /// Convert to an [`http::Request`]. Fails for URLs that are not valid URIs, such as `data:`
    /// URLs, which have no authority.
    fn try_from(from: Request) -> Result<Self, Self::Error> {
        let uri: http::Uri = from.url.as_str().parse()?;
        let mut req = http::Request::new(from.body.unwrap_or_default());
        req.extensions_mut().insert(BrowserExts {
            mode: from.mode,
            destination: from.destination,
            credentials: from.credentials,
        });
        *req.headers_mut() = from.headers;
        *req.method_mut() = from.method;
        *req.uri_mut() = uri;
        *req.version_mut() = from.version;
        Ok(req)
    }
}

impl TryFrom<http::Request<Body>> for Request {
    type Error = url::ParseError;

    /// Convert an [`http::Request`]. Fails if the request's URI is not absolute.
    fn try_from(from: http::Request<Body>) -> Result<Self, Self::Error> {
        let (mut parts, body) = from.into_parts();
        let BrowserExts {
            mode,
            destination,
            credentials,
        } = parts.extensions.remove().unwrap_or_default();
        Ok(Request {
            version: parts.version,
            method: parts.method,
            url: Url::parse(&parts.uri.to_string())?,
            headers: parts.headers,
            body: Some(body),
            mode,
            destination,
            credentials,
        })
    }
}

/// The reason a request sent to the network failed.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SendErrorCause {
    /// The host reported that there is no network connectivity.
    #[error("network is unreachable")]
    Offline,
    /// The remote host refused the connection.
    #[error("connection refused")]
    ConnectionRefused,
    /// The request was aborted before a response arrived, for example because it timed out.
    #[error("request was aborted")]
    Aborted,
    /// All other errors.
    #[error("generic send error: {0}")]
    Generic(Error),
}

/// An error that occurred while sending a request to the network.
///
/// This is the "fetch rejected" case: no response at all was received. A response with an error
/// status is *not* a `SendError`.
#[derive(Debug, Error)]
#[error("error sending request to {url}: {error}")]
pub struct SendError {
    url: Url,
    #[source]
    error: SendErrorCause,
}

impl SendError {
    /// Create a new [`SendError`] for a request to the given URL.
    pub fn new(url: Url, error: SendErrorCause) -> Self {
        SendError { url, error }
    }

    /// Shorthand for a [`SendErrorCause::Offline`] error.
    pub fn offline(url: Url) -> Self {
        Self::new(url, SendErrorCause::Offline)
    }

    /// Get the URL of the request that failed.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the underlying cause of this `SendError`.
    pub fn root_cause(&self) -> &SendErrorCause {
        &self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_requests_look_like_programmatic_fetches() {
        let req = Request::post("https://app.example.com/api/items");
        assert_eq!(req.get_mode(), RequestMode::Cors);
        assert_eq!(req.get_destination(), RequestDestination::Empty);
        assert_eq!(req.get_credentials(), CredentialsMode::SameOrigin);
        assert!(!req.is_retrieval());
        assert!(Request::head("https://app.example.com/").is_retrieval());
    }

    #[test]
    fn clone_without_body_keeps_metadata() {
        let original = Request::put("https://app.example.com/api/items/1?draft=1")
            .with_header("x-trace", "abc")
            .with_mode(RequestMode::SameOrigin)
            .with_body_text_plain("payload");
        let copy = original.clone_without_body();
        assert!(original.has_body());
        assert!(!copy.has_body());
        assert_eq!(copy.get_method(), &Method::PUT);
        assert_eq!(copy.get_query_str(), Some("draft=1"));
        assert_eq!(copy.get_header_str("x-trace"), Some("abc"));
        assert_eq!(copy.get_mode(), RequestMode::SameOrigin);
        assert_eq!(copy.get_content_type(), Some(mime::TEXT_PLAIN_UTF_8));
    }

    #[test]
    fn http_request_conversion_preserves_browser_metadata() {
        let req = Request::get("https://app.example.com/dashboard")
            .with_mode(RequestMode::Navigate)
            .with_destination(RequestDestination::Document);
        let http_req = http::Request::<Body>::try_from(req).unwrap();
        assert_eq!(http_req.uri(), "https://app.example.com/dashboard");
        let back = Request::try_from(http_req).unwrap();
        assert!(back.is_navigation());
        assert_eq!(back.get_destination(), RequestDestination::Document);
    }

    #[test]
    fn urls_without_authority_do_not_convert_to_http_requests() {
        let req = Request::get("data:text/plain,hi");
        assert_eq!(req.get_url().scheme(), "data");
        assert!(http::Request::<Body>::try_from(req).is_err());
    }

    #[test]
    fn relative_http_requests_are_rejected() {
        let http_req = http::Request::get("/relative").body(Body::new()).unwrap();
        assert!(Request::try_from(http_req).is_err());
    }

    #[test]
    fn send_error_reports_url_and_cause() {
        let url = Url::parse("https://api.example.com/api/items").unwrap();
        let err = SendError::offline(url.clone());
        assert_eq!(err.url(), &url);
        assert!(matches!(err.root_cause(), SendErrorCause::Offline));
        assert_eq!(
            err.to_string(),
            "error sending request to https://api.example.com/api/items: network is unreachable"
        );
    }
}
