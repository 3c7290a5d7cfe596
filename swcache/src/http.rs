//! HTTP types for the interceptor.
//!
//! [`Request`] and [`Response`] carry the metadata a browser attaches to intercepted requests
//! (mode, destination, credentials) alongside the usual method, URL, headers and [`Body`]. The
//! [`http`](::http) crate's types are re-exported for convenience.

pub mod body;
pub mod request;
pub mod response;

pub use self::body::{Body, BodyError};
pub use self::request::{Request, SendError, SendErrorCause};
pub use self::response::Response;

pub use ::http::header::{self, HeaderMap, HeaderName, HeaderValue};
pub use ::http::{Method, StatusCode, Version};
pub use swcache_shared::{CredentialsMode, RequestDestination, RequestMode};
