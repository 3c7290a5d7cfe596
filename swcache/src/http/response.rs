//! HTTP responses.

use super::body::{Body, BodyError};
use crate::convert::{ToHeaderName, ToHeaderValue, ToStatusCode};
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{StatusCode, Version};
use mime::Mime;
use serde::Serialize;

/// An HTTP response, including body, headers, and status code.
///
/// Responses come from the network, from the cache, or are synthesized by the interceptor when
/// neither is available.
///
/// # Builder-style methods
///
/// ```
/// # use swcache::Response;
/// use swcache::http::StatusCode;
/// let resp = Response::from_status(StatusCode::SERVICE_UNAVAILABLE)
///     .with_body_text_plain("Offline");
/// assert_eq!(resp.get_status(), 503);
/// ```
///
/// For interoperability with other Rust libraries, [`Response`] converts to and from the
/// [`http`] crate's [`http::Response`] type.
#[derive(Debug)]
pub struct Response {
    version: Version,
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Body>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// Create a new [`Response`].
    ///
    /// The new response is created with status code `200 OK`, no headers, and an empty body.
    pub fn new() -> Self {
        Self {
            version: Version::HTTP_11,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Make a new response with the same headers, status, and version of this response, but no
    /// body.
    ///
    /// If you also need to clone the response body, use
    /// [`clone_with_body()`][`Self::clone_with_body()`]
    pub fn clone_without_body(&self) -> Response {
        Self {
            version: self.version,
            status: self.status,
            headers: self.headers.clone(),
            body: None,
        }
    }

    /// Clone this response by reading its body into memory, and then sharing the same bytes
    /// between the original and the clone.
    ///
    /// This requires mutable access because a streaming body is replaced by its buffered form. If
    /// reading fails, the original keeps the failure (see [`Body::buffer()`]) and the error is
    /// returned.
    pub async fn clone_with_body(&mut self) -> Result<Response, BodyError> {
        let mut new_resp = self.clone_without_body();
        if let Some(body) = self.body.as_mut() {
            new_resp.body = Some(Body::from(body.buffer().await?));
        }
        Ok(new_resp)
    }

    /// Create a new [`Response`] with the given value as the body.
    pub fn from_body(body: impl Into<Body>) -> Self {
        Self::new().with_body(body)
    }

    /// Create a new response with the given status code.
    pub fn from_status(status: impl ToStatusCode) -> Self {
        Self::new().with_status(status)
    }

    /// Builder-style equivalent of [`set_body()`][`Self::set_body()`].
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.set_body(body);
        self
    }

    /// Returns `true` if this response has a body.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Set the given value as the response's body.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = Some(body.into());
    }

    /// Take and return the body from this response.
    ///
    /// After calling this method, this response will no longer have a body.
    pub fn take_body(&mut self) -> Body {
        self.body.take().unwrap_or_default()
    }

    /// Consume the response and return its body, or an empty body if it had none.
    pub fn into_body(self) -> Body {
        self.body.unwrap_or_default()
    }

    /// Consume the response and read its body into memory.
    pub async fn into_body_bytes(self) -> Result<bytes::Bytes, BodyError> {
        self.into_body().into_bytes().await
    }

    /// Consume the response and read its body as a UTF-8 string.
    pub async fn into_body_str(self) -> Result<String, BodyError> {
        self.into_body().into_string().await
    }

    /// Builder-style equivalent of [`set_body_text_plain()`][`Self::set_body_text_plain()`].
    pub fn with_body_text_plain(mut self, body: &str) -> Self {
        self.set_body_text_plain(body);
        self
    }

    /// Set the given string as the response's body with content type `text/plain;
    /// charset=UTF-8`.
    pub fn set_body_text_plain(&mut self, body: &str) {
        self.body = Some(Body::from(body));
        self.set_content_type(mime::TEXT_PLAIN_UTF_8);
    }

    /// Builder-style equivalent of [`set_body_json()`][`Self::set_body_json()`].
    pub fn with_body_json(mut self, value: &impl Serialize) -> Result<Self, serde_json::Error> {
        self.set_body_json(value)?;
        Ok(self)
    }

    /// Convert the given value to JSON and set that JSON as the response's body.
    ///
    /// The content type is set to `application/json`.
    pub fn set_body_json(&mut self, value: &impl Serialize) -> Result<(), serde_json::Error> {
        self.body = Some(Body::from(serde_json::to_vec(value)?));
        self.set_content_type(mime::APPLICATION_JSON);
        Ok(())
    }

    /// Get the MIME type described by the response's `Content-Type` header, or `None` if that
    /// header is absent or does not parse.
    pub fn get_content_type(&self) -> Option<Mime> {
        self.get_header_str(header::CONTENT_TYPE)
            .and_then(|v| v.parse().ok())
    }

    /// Builder-style equivalent of [`set_content_type()`][`Self::set_content_type()`].
    pub fn with_content_type(mut self, mime: Mime) -> Self {
        self.set_content_type(mime);
        self
    }

    /// Set the MIME type described by the response's `Content-Type` header.
    pub fn set_content_type(&mut self, mime: Mime) {
        self.set_header(header::CONTENT_TYPE, mime.as_ref())
    }

    /// Returns whether the given header name is present in the response.
    pub fn contains_header(&self, name: impl ToHeaderName) -> bool {
        self.headers.contains_key(name.into_owned())
    }

    /// Builder-style equivalent of [`append_header()`][`Self::append_header()`].
    pub fn with_header(mut self, name: impl ToHeaderName, value: impl ToHeaderValue) -> Self {
        self.append_header(name, value);
        self
    }

    /// Get the value of a header as a string, or `None` if the header is not present or is not
    /// valid UTF-8.
    pub fn get_header_str(&self, name: impl ToHeaderName) -> Option<&str> {
        self.get_header(name).and_then(|hdr| hdr.to_str().ok())
    }

    /// Get the value of a header, or `None` if the header is not present.
    pub fn get_header(&self, name: impl ToHeaderName) -> Option<&HeaderValue> {
        self.headers.get(name.into_owned())
    }

    /// Get an iterator of all the response's header names and values.
    pub fn get_headers(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter()
    }

    /// Borrow the response's header map.
    pub fn get_header_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a response header to the given value, discarding any previous values for the given
    /// header name.
    pub fn set_header(&mut self, name: impl ToHeaderName, value: impl ToHeaderValue) {
        self.headers.insert(name.into_owned(), value.into_owned());
    }

    /// Add a response header with given value, keeping existing values.
    pub fn append_header(&mut self, name: impl ToHeaderName, value: impl ToHeaderValue) {
        self.headers.append(name.into_owned(), value.into_owned());
    }

    /// Remove all response headers of the given name, and return one of the removed header
    /// values if any were present.
    pub fn remove_header(&mut self, name: impl ToHeaderName) -> Option<HeaderValue> {
        self.headers.remove(name.into_owned())
    }

    /// Builder-style equivalent of [`set_status()`][`Self::set_status()`].
    pub fn with_status(mut self, status: impl ToStatusCode) -> Self {
        self.set_status(status);
        self
    }

    /// Get the HTTP status code of the response.
    pub fn get_status(&self) -> StatusCode {
        self.status
    }

    /// Set the HTTP status code of the response.
    pub fn set_status(&mut self, status: impl ToStatusCode) {
        self.status = status.to_status_code();
    }

    /// Returns `true` if the status is in the `200-299` range.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Builder-style equivalent of [`set_version()`][`Self::set_version()`].
    pub fn with_version(mut self, version: Version) -> Self {
        self.set_version(version);
        self
    }

    /// Get the HTTP version of this response.
    pub fn get_version(&self) -> Version {
        self.version
    }

    /// Set the HTTP version of this response.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub(crate) fn into_parts(self) -> (StatusCode, Version, HeaderMap, Body) {
        (
            self.status,
            self.version,
            self.headers,
            self.body.unwrap_or_default(),
        )
    }

    pub(crate) fn from_parts(
        status: StatusCode,
        version: Version,
        headers: HeaderMap,
        body: Body,
    ) -> Self {
        Self {
            version,
            status,
            headers,
            body: Some(body),
        }
    }
}

impl From<Response> for http::Response<Body> {
    fn from(from: Response) -> Self {
        let mut resp = http::Response::new(from.body.unwrap_or_default());
        *resp.headers_mut() = from.headers;
        *resp.status_mut() = from.status;
        *resp.version_mut() = from.version;
        resp
    }
}

impl From<http::Response<Body>> for Response {
    fn from(from: http::Response<Body>) -> Self {
        let (parts, body) = from.into_parts();
        Response {
            version: parts.version,
            status: parts.status,
            headers: parts.headers,
            body: Some(body),
        }
    }
}
