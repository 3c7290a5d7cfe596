//! Client and lifecycle control provided by the host.

use async_trait::async_trait;
use swcache_shared::Notification;

/// Errors reported by a [`WorkerHost`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum HostError {
    /// The operation is not valid in the interceptor's current lifecycle state.
    #[error("invalid lifecycle state: {0}")]
    InvalidState(String),
    /// The host does not support the operation.
    #[error("operation not supported by the host")]
    Unsupported,
    /// An unknown error occurred.
    #[error("host error: {0}")]
    Other(String),
}

/// Lifecycle and client control the interceptor asks of its host.
///
/// These are the host's equivalents of a worker skipping the waiting phase, claiming every open
/// page, and posting a message to each of them.
#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Activate this version immediately, without waiting for pages using an older version to
    /// close.
    async fn skip_waiting(&self) -> Result<(), HostError>;

    /// Take control of every open page in scope, including ones loaded before activation.
    async fn claim(&self) -> Result<(), HostError>;

    /// Post `notification` to every controlled page. Returns how many pages it was posted to.
    async fn post_message_all(&self, notification: &Notification) -> Result<usize, HostError>;
}

#[async_trait]
impl<H: WorkerHost + ?Sized> WorkerHost for std::sync::Arc<H> {
    async fn skip_waiting(&self) -> Result<(), HostError> {
        (**self).skip_waiting().await
    }

    async fn claim(&self) -> Result<(), HostError> {
        (**self).claim().await
    }

    async fn post_message_all(&self, notification: &Notification) -> Result<usize, HostError> {
        (**self).post_message_all(notification).await
    }
}
