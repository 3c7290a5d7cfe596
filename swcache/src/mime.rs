//! [Media types][mdn] (also known as Multipurpose Internet Mail Extensions or MIME types).
//!
//! This module re-exports the [`mime`][`::mime`] crate, which [`Request`][crate::Request] and
//! [`Response`][crate::Response] use for their `Content-Type` accessors. Synthesized offline
//! responses are [`TEXT_PLAIN_UTF_8`] or [`APPLICATION_JSON`].
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/HTTP/Basics_of_HTTP/MIME_types

#[doc(inline)]
pub use ::mime::*;
