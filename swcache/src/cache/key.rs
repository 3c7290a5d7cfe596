use crate::http::{HeaderName, HeaderValue, Method, Request};
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// Identity of a request within a cache namespace.
///
/// The key is a SHA-256 digest over the request method, the request URL with its fragment
/// removed, and the values of any headers added with [`CacheKeyBuilder::header()`]. Two requests
/// that differ only in a URL fragment share a key.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Start building a key for the given method and URL.
    pub fn builder(method: &Method, url: &Url) -> CacheKeyBuilder {
        let mut url = url.clone();
        url.set_fragment(None);
        let mut builder = CacheKeyBuilder {
            sha: Sha256::new(),
        };
        builder.field(method.as_str().as_bytes());
        builder.field(url.as_str().as_bytes());
        builder
    }

    /// The key for `request`, including the values of the given request headers.
    ///
    /// A header that is absent contributes differently from one that is present but empty.
    pub fn for_request(request: &Request, key_headers: &[HeaderName]) -> Self {
        key_headers
            .iter()
            .fold(
                Self::builder(request.get_method(), request.get_url()),
                |builder, name| builder.header(name, request.get_header(name)),
            )
            .finish()
    }

    /// The key for a plain `GET` of `url` when no key headers are configured.
    pub fn for_get(url: &Url) -> Self {
        Self::builder(&Method::GET, url).finish()
    }

    /// The raw digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const DIGITS: &[u8] = b"0123456789ABCDEF";
        let mut hex = [0; 64];
        for (i, b) in self.0.iter().enumerate() {
            hex[i * 2] = DIGITS[(b >> 4) as usize];
            hex[i * 2 + 1] = DIGITS[(b & 0xf) as usize];
        }
        // every byte of `hex` is an ASCII digit
        f.write_str(std::str::from_utf8(&hex).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self)
    }
}

/// A builder for [`CacheKey`]s that include header values.
pub struct CacheKeyBuilder {
    sha: Sha256,
}

impl CacheKeyBuilder {
    // length-prefix every field so that adjacent fields cannot run into each other
    fn field(&mut self, bytes: &[u8]) {
        self.sha.update(&(bytes.len() as u64).to_le_bytes());
        self.sha.update(bytes);
    }

    /// Mix a header name and its value (or its absence) into the key.
    pub fn header(mut self, name: &HeaderName, value: Option<&HeaderValue>) -> Self {
        self.field(name.as_str().as_bytes());
        match value {
            Some(value) => {
                self.sha.update(&[1u8]);
                self.field(value.as_bytes());
            }
            None => self.sha.update(&[0u8]),
        }
        self
    }

    /// Produce the key.
    pub fn finish(self) -> CacheKey {
        let mut key = [0; 32];
        key.copy_from_slice(&self.sha.finalize());
        CacheKey(key)
    }
}
