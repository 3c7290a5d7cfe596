use super::{CacheError, CacheKey};
use crate::http::{Body, BodyError, HeaderMap, Response, StatusCode, Version};
use async_trait::async_trait;
use bytes::Bytes;

/// A response captured for storage: status, headers and the complete body.
///
/// Unlike a [`Response`], a captured response is cheap to clone and can be replayed any number of
/// times with [`to_response()`][`Self::to_response()`].
#[derive(Clone, Debug)]
pub struct CachedResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

impl CachedResponse {
    /// Capture `response`, reading its body into memory.
    ///
    /// The response stays usable: its body is replaced by the buffered bytes.
    pub async fn capture(response: &mut Response) -> Result<Self, CacheError> {
        let (status, version, headers, body) = response.clone_with_body().await?.into_parts();
        Ok(Self {
            status,
            version,
            headers,
            body: body.into_bytes().await?,
        })
    }

    /// Capture `response`, consuming it.
    pub async fn from_response(response: Response) -> Result<Self, BodyError> {
        let (status, version, headers, body) = response.into_parts();
        Ok(Self {
            status,
            version,
            headers,
            body: body.into_bytes().await?,
        })
    }

    /// Replay the captured response.
    pub fn to_response(&self) -> Response {
        Response::from_parts(
            self.status,
            self.version,
            self.headers.clone(),
            Body::from(self.body.clone()),
        )
    }

    /// The captured status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The captured headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The captured body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl From<CachedResponse> for Response {
    fn from(cached: CachedResponse) -> Self {
        Response::from_parts(
            cached.status,
            cached.version,
            cached.headers,
            Body::from(cached.body),
        )
    }
}

/// One named cache namespace.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Find the response stored under `key`, if any.
    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError>;

    /// Store `response` under `key`, replacing any previous entry.
    async fn insert(&self, key: CacheKey, response: CachedResponse) -> Result<(), CacheError>;

    /// Remove the entry stored under `key`. Returns whether there was one.
    async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError>;
}

/// The host's store of named cache namespaces.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Handle to one namespace.
    type Cache: Cache;

    /// Open the namespace called `name`, creating it if absent.
    async fn open(&self, name: &str) -> Result<Self::Cache, CacheError>;

    /// Find the response stored under `key` in the namespace called `name`.
    ///
    /// Unlike [`open()`][`Self::open()`], this never creates the namespace: a missing namespace is
    /// a miss.
    async fn lookup(
        &self,
        name: &str,
        key: &CacheKey,
    ) -> Result<Option<CachedResponse>, CacheError>;

    /// The names of every existing namespace, in creation order.
    async fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Delete the namespace called `name`. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;
}
