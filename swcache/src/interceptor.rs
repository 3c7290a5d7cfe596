//! The request interceptor.

use crate::backend::Backend;
use crate::cache::{Cache, CacheError, CacheKey, CacheStorage, CachedResponse};
use crate::config::{ApiMode, ConfigError, Route, WorkerConfig, WorkerMode};
use crate::host::WorkerHost;
use crate::http::{
    CredentialsMode, HeaderName, Method, Request, RequestDestination, RequestMode, Response,
    StatusCode,
};
use crate::lifecycle::{
    ActivateReport, CleanupFailure, FetchOutcome, InstallReport, Lifecycle, MessageOutcome,
    PrecacheError, PrecacheFailure,
};
use crate::network::Network;
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info, warn};
use serde_json::Value;
use swcache_shared::{
    ApiErrorBody, ControlMessage, Notification, OFFLINE_STATUS, OFFLINE_TEXT,
    SERVICE_UNAVAILABLE_TEXT,
};
use url::Url;

/// A request interceptor for one deployed version.
///
/// Static requests are served cache-first. Requests under the API prefix go to the network first
/// and fall back to the cache, then to a `503` JSON error. Requests to excluded schemes and hosts
/// are passed through untouched. See [`WorkerMode::Uniform`] for the minimal alternative.
///
/// The interceptor is generic over the host's cache storage, network and client control, so the
/// same logic runs inside a browser-like runtime or natively:
///
/// ```
/// # use swcache::{Interceptor, Lifecycle, MemoryCacheStorage, Request, WorkerConfig};
/// # use swcache::{host::{HostError, WorkerHost}, network::Network, http::SendError, Response};
/// # use swcache::Notification;
/// # struct Offline;
/// # #[async_trait::async_trait]
/// # impl Network for Offline {
/// #     async fn fetch(&self, req: Request) -> Result<Response, SendError> {
/// #         Err(SendError::offline(req.get_url().clone()))
/// #     }
/// # }
/// # struct NoClients;
/// # #[async_trait::async_trait]
/// # impl WorkerHost for NoClients {
/// #     async fn skip_waiting(&self) -> Result<(), HostError> { Ok(()) }
/// #     async fn claim(&self) -> Result<(), HostError> { Ok(()) }
/// #     async fn post_message_all(&self, _: &Notification) -> Result<usize, HostError> { Ok(0) }
/// # }
/// # async fn run() {
/// let interceptor = Interceptor::new(
///     WorkerConfig::default().with_cache_name("app-v2"),
///     MemoryCacheStorage::new(),
///     Offline,
///     NoClients,
/// )
/// .unwrap();
/// let resp = interceptor
///     .fetch(Request::get("http://localhost/api/items"))
///     .await
///     .into_response()
///     .unwrap();
/// assert_eq!(resp.get_status(), 503);
/// # }
/// ```
pub struct Interceptor<S, N, H> {
    config: WorkerConfig,
    key_headers: Vec<HeaderName>,
    fallback_key: CacheKey,
    storage: S,
    network: N,
    host: H,
}

impl<S, N, H> Interceptor<S, N, H>
where
    S: CacheStorage,
    N: Network,
    H: WorkerHost,
{
    /// Create an interceptor, validating `config` first.
    pub fn new(config: WorkerConfig, storage: S, network: N, host: H) -> Result<Self, ConfigError> {
        config.validate()?;
        let key_headers = config.key_headers()?;
        let fallback = Request::get(config.navigation_fallback_url()?);
        let fallback_key = CacheKey::for_request(&fallback, &key_headers);
        Ok(Self {
            config,
            key_headers,
            fallback_key,
            storage,
            network,
            host,
        })
    }

    /// The configuration this interceptor was created with.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// The cache storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The network.
    pub fn network(&self) -> &N {
        &self.network
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    fn key(&self, request: &Request) -> CacheKey {
        CacheKey::for_request(request, &self.key_headers)
    }

    /// Look `key` up in the current namespace without creating it. Cache errors count as a miss.
    async fn lookup(&self, key: &CacheKey) -> Option<Response> {
        match self.storage.lookup(self.config.cache_name(), key).await {
            Ok(hit) => hit.map(Response::from),
            Err(e) => {
                warn!("cache lookup for {} failed: {}", key, e);
                None
            }
        }
    }

    /// Store a copy of `response` under `key`. Failures are logged and otherwise ignored.
    async fn store(&self, key: CacheKey, response: &mut Response) {
        let result: Result<(), CacheError> = async {
            let cached = CachedResponse::capture(response).await?;
            let cache = self.storage.open(self.config.cache_name()).await?;
            cache.insert(key, cached).await
        }
        .await;
        if let Err(e) = result {
            warn!("failed to cache response: {}", e);
        }
    }

    async fn precache_one(&self, cache: &S::Cache, path: &str) -> Result<Url, PrecacheError> {
        let url = self.config.scope().join(path)?;
        let request = Request::get(url.clone());
        let key = self.key(&request);
        let response = self.network.fetch(request).await?;
        if !response.is_ok() {
            return Err(PrecacheError::Status(response.get_status()));
        }
        let cached = CachedResponse::from_response(response).await?;
        cache.insert(key, cached).await?;
        Ok(url)
    }

    async fn fetch_api(&self, request: Request) -> Response {
        let key = self.key(&request);
        let outgoing = match self.config.api() {
            ApiMode::Passthrough => request,
            ApiMode::Proxy { backend } => proxy_request(backend, request).await,
        };
        match self.network.fetch(outgoing).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("API request failed, falling back to cache: {}", e);
                match self.lookup(&key).await {
                    Some(cached) => cached,
                    None => self.offline_api_response(),
                }
            }
        }
    }

    fn offline_api_response(&self) -> Response {
        let body = ApiErrorBody::network_error(self.config.offline_message());
        match Response::from_status(OFFLINE_STATUS).with_body_json(&body) {
            Ok(resp) => resp,
            Err(e) => {
                warn!("failed to encode offline API response: {}", e);
                Response::from_status(OFFLINE_STATUS)
                    .with_body_text_plain(self.config.offline_message())
            }
        }
    }

    async fn fetch_static(&self, request: Request) -> Response {
        let key = self.key(&request);
        if let Some(hit) = self.lookup(&key).await {
            debug!("cache hit for {}", request.get_url());
            return hit;
        }

        let is_document = request.get_destination() == RequestDestination::Document;
        let storable = request.get_method() == Method::GET && !is_document;
        let wants_page = request.is_navigation() || is_document;
        match self.network.fetch(request).await {
            Ok(mut resp) => {
                if storable && resp.get_status() == StatusCode::OK {
                    self.store(key, &mut resp).await;
                }
                resp
            }
            Err(e) => {
                warn!("static request failed: {}", e);
                if wants_page {
                    self.navigation_fallback().await
                } else {
                    Response::from_status(OFFLINE_STATUS)
                        .with_body_text_plain(SERVICE_UNAVAILABLE_TEXT)
                }
            }
        }
    }

    async fn navigation_fallback(&self) -> Response {
        match self.lookup(&self.fallback_key).await {
            Some(page) => page,
            None => Response::from_status(OFFLINE_STATUS).with_body_text_plain(OFFLINE_TEXT),
        }
    }

    async fn fetch_uniform(&self, request: Request) -> FetchOutcome {
        if let Some(hit) = self.lookup(&self.key(&request)).await {
            return FetchOutcome::Respond(hit);
        }
        match self.network.fetch(request).await {
            Ok(resp) => FetchOutcome::Respond(resp),
            Err(e) => FetchOutcome::NetworkError(e),
        }
    }
}

/// Re-target an API request at `backend`, keeping method and headers.
///
/// The body of a non-retrieval request is read into memory first. If that fails, the request is
/// forwarded without a body.
async fn proxy_request(backend: &Backend, mut request: Request) -> Request {
    let mut proxied = request
        .clone_without_body()
        .with_url(backend.rewrite(request.get_url()))
        .with_mode(RequestMode::Cors)
        .with_credentials(CredentialsMode::Include);
    if !request.is_retrieval() {
        match request.take_body_bytes().await {
            Ok(Some(body)) => proxied.set_body(body),
            Ok(None) => {}
            Err(e) => warn!("forwarding {} without its body: {}", request.get_url(), e),
        }
    }
    proxied
}

#[async_trait]
impl<S, N, H> Lifecycle for Interceptor<S, N, H>
where
    S: CacheStorage,
    N: Network,
    H: WorkerHost,
{
    async fn install(&self) -> InstallReport {
        let cache_name = self.config.cache_name().to_owned();
        info!("installing `{}`", cache_name);
        let mut report = InstallReport {
            cache_name,
            open_error: None,
            stored: Vec::new(),
            failed: Vec::new(),
            skipped_waiting: false,
        };

        match self.storage.open(&report.cache_name).await {
            Ok(cache) => {
                let paths = self.config.precache();
                let results =
                    join_all(paths.iter().map(|path| self.precache_one(&cache, path))).await;
                for (path, result) in paths.iter().zip(results) {
                    match result {
                        Ok(url) => report.stored.push(url),
                        Err(error) => {
                            warn!("failed to precache `{}`: {}", path, error);
                            report.failed.push(PrecacheFailure {
                                path: path.clone(),
                                error,
                            });
                        }
                    }
                }
            }
            Err(e) => {
                warn!("failed to open cache `{}`: {}", report.cache_name, e);
                report.open_error = Some(e);
            }
        }

        if self.config.mode() == WorkerMode::Full {
            match self.host.skip_waiting().await {
                Ok(()) => report.skipped_waiting = true,
                Err(e) => warn!("skip waiting failed: {}", e),
            }
        }
        info!(
            "installed `{}`: {} stored, {} failed",
            report.cache_name,
            report.stored.len(),
            report.failed.len()
        );
        report
    }

    async fn activate(&self) -> ActivateReport {
        let current = self.config.cache_name();
        info!("activating `{}`", current);
        let mut report = ActivateReport::default();

        match self.storage.keys().await {
            Ok(names) => {
                let stale: Vec<String> = names.into_iter().filter(|n| n != current).collect();
                let results = join_all(stale.iter().map(|name| self.storage.delete(name))).await;
                for (name, result) in stale.into_iter().zip(results) {
                    match result {
                        Ok(_) => {
                            info!("deleted old cache `{}`", name);
                            report.deleted.push(name);
                        }
                        Err(error) => {
                            warn!("failed to delete old cache `{}`: {}", name, error);
                            report.failed.push(CleanupFailure {
                                namespace: Some(name),
                                error,
                            });
                        }
                    }
                }
            }
            Err(error) => {
                warn!("failed to list caches: {}", error);
                report.failed.push(CleanupFailure {
                    namespace: None,
                    error,
                });
            }
        }

        if self.config.mode() == WorkerMode::Full {
            match self.host.claim().await {
                Ok(()) => report.claimed = true,
                Err(e) => {
                    warn!("failed to claim clients: {}", e);
                    report.host_errors.push(e);
                }
            }
            let notification = Notification::updated(self.config.update_message());
            match self.host.post_message_all(&notification).await {
                Ok(n) => report.notified = Some(n),
                Err(e) => {
                    warn!("failed to notify clients: {}", e);
                    report.host_errors.push(e);
                }
            }
        }
        info!(
            "activated `{}`: {} old caches deleted",
            current,
            report.deleted.len()
        );
        report
    }

    async fn message(&self, data: Option<&Value>) -> MessageOutcome {
        if self.config.mode() == WorkerMode::Uniform {
            debug!("ignoring message");
            return MessageOutcome::Ignored;
        }
        match data.and_then(ControlMessage::from_value) {
            Some(ControlMessage::SkipWaiting) => match self.host.skip_waiting().await {
                Ok(()) => MessageOutcome::SkippedWaiting,
                Err(e) => {
                    warn!("skip waiting failed: {}", e);
                    MessageOutcome::SkipWaitingFailed
                }
            },
            None => {
                debug!("ignoring unrecognized message");
                MessageOutcome::Ignored
            }
        }
    }

    async fn fetch(&self, request: Request) -> FetchOutcome {
        if self.config.mode() == WorkerMode::Uniform {
            return self.fetch_uniform(request).await;
        }
        match self.config.classify(request.get_url()) {
            Route::Excluded => FetchOutcome::Passthrough(request),
            Route::Api => FetchOutcome::Respond(self.fetch_api(request).await),
            Route::Static => FetchOutcome::Respond(self.fetch_static(request).await),
        }
    }
}
