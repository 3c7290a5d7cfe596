//! The network boundary.
//!
//! Everything the interceptor sends upstream goes through a [`Network`]. Hosts embedding the
//! interceptor in a browser-like runtime forward to the platform's own fetch; native hosts can
//! enable the `reqwest` feature and use `ReqwestNetwork`.

use crate::http::{Request, Response, SendError};
use async_trait::async_trait;

/// Something that can send a request and wait for its response.
///
/// An error status is still a response and must be returned as `Ok`. `Err` means no response was
/// received at all.
#[async_trait]
pub trait Network: Send + Sync {
    /// Send `request` and return the response.
    async fn fetch(&self, request: Request) -> Result<Response, SendError>;
}

#[async_trait]
impl<N: Network + ?Sized> Network for std::sync::Arc<N> {
    async fn fetch(&self, request: Request) -> Result<Response, SendError> {
        (**self).fetch(request).await
    }
}

#[cfg(feature = "reqwest")]
pub use self::native::ReqwestNetwork;

#[cfg(feature = "reqwest")]
mod native {
    use super::Network;
    use crate::error::anyhow;
    use crate::http::{Body, Request, Response, SendError, SendErrorCause};
    use async_trait::async_trait;
    use futures::stream;
    use std::io;

    /// A [`Network`] backed by a [`reqwest::Client`].
    ///
    /// Request bodies are read into memory before sending; a body that fails to read becomes a
    /// [`SendErrorCause::Generic`] error. Response bodies are read in full before the response is
    /// returned, and a failure part-way surfaces when the body is read.
    #[derive(Clone, Debug, Default)]
    pub struct ReqwestNetwork {
        client: reqwest::Client,
    }

    impl ReqwestNetwork {
        /// Create a network using a default client.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a network using the given client.
        pub fn from_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    fn send_error_cause(err: reqwest::Error) -> SendErrorCause {
        if err.is_connect() {
            SendErrorCause::ConnectionRefused
        } else if err.is_timeout() {
            SendErrorCause::Aborted
        } else {
            SendErrorCause::Generic(err.into())
        }
    }

    #[async_trait]
    impl Network for ReqwestNetwork {
        async fn fetch(&self, mut request: Request) -> Result<Response, SendError> {
            let url = request.get_url().clone();
            let body = match request.take_body_bytes().await {
                Ok(body) => body,
                Err(e) => {
                    return Err(SendError::new(
                        url,
                        SendErrorCause::Generic(anyhow!("request body could not be read: {}", e)),
                    ))
                }
            };
            let mut builder = self
                .client
                .request(request.get_method().clone(), url.clone())
                .headers(request.get_header_map().clone());
            if let Some(body) = body {
                builder = builder.body(body);
            }
            let resp = builder
                .send()
                .await
                .map_err(|e| SendError::new(url.clone(), send_error_cause(e)))?;

            let mut out = Response::from_status(resp.status()).with_version(resp.version());
            for (name, value) in resp.headers() {
                out.append_header(name, value);
            }
            match resp.bytes().await {
                Ok(bytes) => out.set_body(bytes),
                Err(e) => {
                    let err = io::Error::new(io::ErrorKind::Other, e.to_string());
                    out.set_body(Body::from_stream(stream::iter(vec![Err(err)])));
                }
            }
            Ok(out)
        }
    }

}
