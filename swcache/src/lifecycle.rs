//! The four phases of an interceptor's life, and what each reports back.
//!
//! A host drives an interceptor by calling [`Lifecycle::install()`] once when a version is first
//! deployed, [`Lifecycle::activate()`] once when it takes over, [`Lifecycle::message()`] for every
//! message a page posts, and [`Lifecycle::fetch()`] for every request a controlled page makes.
//! None of them fail: best-effort work is summarized in a report, and every fetch ends in a
//! [`FetchOutcome`].

use crate::cache::CacheError;
use crate::host::HostError;
use crate::http::{BodyError, Request, Response, SendError, StatusCode};
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// A request interceptor's lifecycle.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Create the current cache namespace and populate it with the precache set.
    async fn install(&self) -> InstallReport;

    /// Delete every cache namespace except the current one, then take control of open pages.
    async fn activate(&self) -> ActivateReport;

    /// Handle data posted by a page. `None` stands for a message with no data at all.
    async fn message(&self, data: Option<&Value>) -> MessageOutcome;

    /// Decide what happens to an intercepted request.
    async fn fetch(&self, request: Request) -> FetchOutcome;
}

/// Why a single precache path could not be stored.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PrecacheError {
    /// The path does not resolve against the scope.
    #[error("invalid precache path: {0}")]
    InvalidPath(#[from] url::ParseError),
    /// No response was received.
    #[error(transparent)]
    Network(#[from] SendError),
    /// The response status was not in the `200-299` range.
    #[error("unexpected response status {0}")]
    Status(StatusCode),
    /// The response body could not be read.
    #[error(transparent)]
    Body(#[from] BodyError),
    /// The response could not be stored.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A precache path that was not stored.
#[derive(Debug)]
pub struct PrecacheFailure {
    /// The path as configured.
    pub path: String,
    /// What went wrong.
    pub error: PrecacheError,
}

/// Summary of [`Lifecycle::install()`].
#[derive(Debug)]
pub struct InstallReport {
    /// Name of the namespace that was populated.
    pub cache_name: String,
    /// Set if the namespace could not be opened, in which case nothing was fetched.
    pub open_error: Option<CacheError>,
    /// URLs stored, in precache order.
    pub stored: Vec<Url>,
    /// Paths that were not stored, in precache order.
    pub failed: Vec<PrecacheFailure>,
    /// Whether the host agreed to skip the waiting phase.
    pub skipped_waiting: bool,
}

impl InstallReport {
    /// Returns `true` if every precache path was stored.
    pub fn is_complete(&self) -> bool {
        self.open_error.is_none() && self.failed.is_empty()
    }
}

/// A namespace that could not be cleaned up.
#[derive(Debug)]
pub struct CleanupFailure {
    /// The namespace, or `None` if the namespaces could not be listed at all.
    pub namespace: Option<String>,
    /// What went wrong.
    pub error: CacheError,
}

/// Summary of [`Lifecycle::activate()`].
#[derive(Debug, Default)]
pub struct ActivateReport {
    /// Namespaces deleted, in listing order.
    pub deleted: Vec<String>,
    /// Namespaces that could not be deleted.
    pub failed: Vec<CleanupFailure>,
    /// Whether open pages were claimed.
    pub claimed: bool,
    /// How many pages the update notification reached, or `None` if it was not sent.
    pub notified: Option<usize>,
    /// Errors reported by the host while claiming or notifying.
    pub host_errors: Vec<HostError>,
}

/// Result of [`Lifecycle::message()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageOutcome {
    /// The message asked to skip waiting, and the host did.
    SkippedWaiting,
    /// The message asked to skip waiting, but the host refused.
    SkipWaitingFailed,
    /// The message was not recognized, or messages are not handled in this mode.
    Ignored,
}

/// Result of [`Lifecycle::fetch()`].
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not intercepted. The host must handle the request as if there were no interceptor.
    Passthrough(Request),
    /// Respond with this response.
    Respond(Response),
    /// The request went to the network and failed, and nothing stands in for the response. The
    /// host should fail the request the way a failed network fetch does.
    NetworkError(SendError),
}

impl FetchOutcome {
    /// The response, if this outcome is [`FetchOutcome::Respond`].
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Respond(resp) => Some(resp),
            _ => None,
        }
    }

    /// Returns `true` if the request was not intercepted.
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough(_))
    }
}
