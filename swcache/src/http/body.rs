//! HTTP bodies.

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::fmt::{self, Debug};
use std::io;
use std::mem;
use std::pin::Pin;

type ChunkStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync>>;

/// Errors arising while reading a [`Body`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BodyError {
    /// The underlying stream failed.
    #[error("failed to read body: {0}")]
    Read(#[source] io::Error),
    /// The body was expected to be UTF-8 text but was not.
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// The body was expected to be JSON but did not parse.
    #[error("body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An HTTP body: either bytes already in memory, or a stream of chunks that may fail mid-way.
///
/// Streaming bodies are read at most once. [`buffer()`][`Self::buffer()`] drains the stream into
/// memory so the same bytes can be handed to several consumers, which is how a response is both
/// returned to a page and copied into the cache.
pub struct Body {
    inner: Inner,
}

enum Inner {
    Buffered(Bytes),
    Streaming(ChunkStream),
}

impl Default for Inner {
    fn default() -> Self {
        Inner::Buffered(Bytes::new())
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Buffered(bytes) => write!(f, "<Body {} bytes>", bytes.len()),
            Inner::Streaming(_) => write!(f, "<opaque streaming Body>"),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

impl Body {
    /// Get a new, empty HTTP body.
    pub fn new() -> Self {
        Self {
            inner: Inner::default(),
        }
    }

    /// Create a body from a stream of chunks.
    ///
    /// An `Err` item ends the body; readers see it as [`BodyError::Read`].
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + Sync + 'static,
    {
        Self {
            inner: Inner::Streaming(Box::pin(stream)),
        }
    }

    /// Return `true` if the whole body is already in memory.
    pub fn is_buffered(&self) -> bool {
        matches!(self.inner, Inner::Buffered(_))
    }

    /// The length of the body, if it is already in memory.
    pub fn known_length(&self) -> Option<usize> {
        match &self.inner {
            Inner::Buffered(bytes) => Some(bytes.len()),
            Inner::Streaming(_) => None,
        }
    }

    /// Read the rest of the body into memory and return a cheap handle to the bytes.
    ///
    /// Afterwards the body is buffered and can be read again. If the stream fails, the chunks
    /// read so far followed by the same error are put back, so a later reader observes the failure
    /// too rather than a silently truncated body.
    pub async fn buffer(&mut self) -> Result<Bytes, BodyError> {
        let mut chunks = match mem::take(&mut self.inner) {
            Inner::Buffered(bytes) => {
                self.inner = Inner::Buffered(bytes.clone());
                return Ok(bytes);
            }
            Inner::Streaming(chunks) => chunks,
        };
        let mut buf = BytesMut::new();
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(chunk) => buf.extend_from_slice(&chunk),
                Err(e) => {
                    let replay = io::Error::new(e.kind(), e.to_string());
                    let partial = buf.freeze();
                    self.inner =
                        Inner::Streaming(Box::pin(stream::iter(vec![Ok(partial), Err(replay)])));
                    return Err(BodyError::Read(e));
                }
            }
        }
        let bytes = buf.freeze();
        self.inner = Inner::Buffered(bytes.clone());
        Ok(bytes)
    }

    /// Read the entirety of the body into memory.
    pub async fn into_bytes(mut self) -> Result<Bytes, BodyError> {
        self.buffer().await
    }

    /// Read the entirety of the body into a `String`, interpreting the bytes as UTF-8.
    pub async fn into_string(self) -> Result<String, BodyError> {
        let bytes = self.into_bytes().await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// Read the entirety of the body and parse it as JSON.
    pub async fn into_json<T: DeserializeOwned>(self) -> Result<T, BodyError> {
        let bytes = self.into_bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            inner: Inner::Buffered(bytes),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Bytes::from(v).into()
    }
}

impl From<&[u8]> for Body {
    fn from(s: &[u8]) -> Self {
        Bytes::copy_from_slice(s).into()
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Bytes::from(s).into()
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Bytes::copy_from_slice(s.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_stream() -> impl Stream<Item = io::Result<Bytes>> + Send + Sync + 'static {
        stream::iter(vec![
            Ok(Bytes::from_static(b"hello ")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away")),
            Ok(Bytes::from_static(b"never seen")),
        ])
    }

    #[tokio::test]
    async fn buffering_a_stream_allows_rereading() {
        let mut body = Body::from_stream(stream::iter(vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ]));
        assert!(!body.is_buffered());
        assert_eq!(body.buffer().await.unwrap(), "hello world");
        assert!(body.is_buffered());
        assert_eq!(body.known_length(), Some(11));
        assert_eq!(body.into_string().await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn failed_buffering_replays_the_error() {
        let mut body = Body::from_stream(failing_stream());
        match body.buffer().await {
            Err(BodyError::Read(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("unexpected result: {:?}", other),
        }
        match body.into_bytes().await {
            Err(BodyError::Read(e)) => assert_eq!(e.to_string(), "peer went away"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn json_bodies_parse() {
        let body = Body::from(r#"{"error":"network_error"}"#);
        let value: serde_json::Value = body.into_json().await.unwrap();
        assert_eq!(value["error"], "network_error");
    }
}
