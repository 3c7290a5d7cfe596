//! Test doubles for the host boundaries.

use crate::cache::{
    Cache, CacheError, CacheKey, CacheStorage, CachedResponse, MemoryCache, MemoryCacheStorage,
};
use crate::host::{HostError, WorkerHost};
use crate::http::{Body, CredentialsMode, HeaderMap, Method, Request, RequestMode, Response};
use crate::http::{SendError, StatusCode};
use crate::network::Network;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use swcache_shared::Notification;

/// A body whose stream fails before yielding anything.
pub(crate) fn broken_body() -> Body {
    Body::from_stream(stream::iter(vec![Err(io::Error::new(
        io::ErrorKind::ConnectionReset,
        "client went away",
    ))]))
}

enum Scripted {
    Respond(StatusCode, &'static str),
    Truncated,
}

/// What a [`ScriptedNetwork`] saw for one request.
#[derive(Clone, Debug)]
pub(crate) struct SentRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub mode: RequestMode,
    pub credentials: CredentialsMode,
}

/// A network answering from a script keyed by URL. Unscripted URLs fail as if offline.
#[derive(Default)]
pub(crate) struct ScriptedNetwork {
    script: Mutex<HashMap<String, Scripted>>,
    offline: AtomicBool,
    sent: Mutex<Vec<SentRequest>>,
}

impl ScriptedNetwork {
    pub fn respond(&self, url: &str, status: u16, body: &'static str) {
        let status = StatusCode::from_u16(status).unwrap();
        self.script
            .lock()
            .insert(url.to_owned(), Scripted::Respond(status, body));
    }

    /// Respond `200 OK` with a body that fails part-way.
    pub fn truncate(&self, url: &str) {
        self.script.lock().insert(url.to_owned(), Scripted::Truncated);
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, mut request: Request) -> Result<Response, SendError> {
        let body = request.take_body_bytes().await.ok().flatten();
        let url = request.get_url().clone();
        self.sent.lock().push(SentRequest {
            method: request.get_method().clone(),
            url: url.to_string(),
            headers: request.get_header_map().clone(),
            body,
            mode: request.get_mode(),
            credentials: request.get_credentials(),
        });
        if self.offline.load(Ordering::SeqCst) {
            return Err(SendError::offline(url));
        }
        match self.script.lock().get(url.as_str()) {
            Some(Scripted::Respond(status, body)) => {
                Ok(Response::from_status(*status).with_body_text_plain(body))
            }
            Some(Scripted::Truncated) => Ok(Response::from_body(Body::from_stream(stream::iter(
                vec![
                    Ok(Bytes::from_static(b"partial")),
                    Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated")),
                ],
            )))),
            None => Err(SendError::offline(url)),
        }
    }
}

/// A host that records every call.
#[derive(Default)]
pub(crate) struct RecordingHost {
    clients: usize,
    failing: AtomicBool,
    skip_waiting: AtomicUsize,
    claims: AtomicUsize,
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingHost {
    pub fn with_clients(clients: usize) -> Self {
        Self {
            clients,
            ..Self::default()
        }
    }

    /// Make every later call fail.
    pub fn fail_everything(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn skip_waiting_calls(&self) -> usize {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn claim_calls(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    fn check(&self) -> Result<(), HostError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(HostError::InvalidState("redundant".to_owned()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl WorkerHost for RecordingHost {
    async fn skip_waiting(&self) -> Result<(), HostError> {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    async fn claim(&self) -> Result<(), HostError> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    async fn post_message_all(&self, notification: &Notification) -> Result<usize, HostError> {
        self.check()?;
        self.notifications.lock().push(notification.clone());
        Ok(self.clients)
    }
}

/// A [`MemoryCacheStorage`] with injectable failures.
#[derive(Default)]
pub(crate) struct FlakyStorage {
    inner: MemoryCacheStorage,
    unavailable: bool,
    failing_insert: bool,
    failing_delete: Vec<String>,
    reads: Arc<AtomicUsize>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails with [`CacheError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Inserts fail with [`CacheError::QuotaExceeded`].
    pub fn failing_insert(mut self) -> Self {
        self.failing_insert = true;
        self
    }

    /// Deleting `name` fails.
    pub fn failing_delete(mut self, name: &str) -> Self {
        self.failing_delete.push(name.to_owned());
        self
    }

    /// How many namespaces were opened or entries looked up, through the storage or any cache
    /// handle it gave out.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.unavailable {
            Err(CacheError::Unavailable)
        } else {
            Ok(())
        }
    }
}

pub(crate) struct FlakyCache {
    inner: MemoryCache,
    failing_insert: bool,
    reads: Arc<AtomicUsize>,
}

#[async_trait]
impl Cache for FlakyCache {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(key).await
    }

    async fn insert(&self, key: CacheKey, response: CachedResponse) -> Result<(), CacheError> {
        if self.failing_insert {
            return Err(CacheError::QuotaExceeded);
        }
        self.inner.insert(key, response).await
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        self.inner.remove(key).await
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    type Cache = FlakyCache;

    async fn open(&self, name: &str) -> Result<FlakyCache, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(FlakyCache {
            inner: self.inner.open(name).await?,
            failing_insert: self.failing_insert,
            reads: self.reads.clone(),
        })
    }

    async fn lookup(
        &self,
        name: &str,
        key: &CacheKey,
    ) -> Result<Option<CachedResponse>, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.lookup(name, key).await
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.check()?;
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        self.check()?;
        if self.failing_delete.iter().any(|n| n == name) {
            return Err(CacheError::Other(format!("`{}` is locked", name)));
        }
        self.inner.delete(name).await
    }
}
