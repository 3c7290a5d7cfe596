// Warnings (other than unused variables) in doctests are promoted to errors.
#![doc(test(attr(deny(warnings))))]
#![doc(test(attr(allow(dead_code))))]
#![doc(test(attr(allow(unused_variables))))]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::invalid_codeblock_attributes)]

//! # Offline-first request interceptor.
//!
//! An [`Interceptor`] sits between the pages of one origin and the network. It is installed once
//! per deployed version, precaching the application shell into a versioned cache namespace, and on
//! activation deletes the namespaces of earlier versions. Afterwards it decides for every request:
//!
//! * requests to excluded schemes and hosts pass through untouched;
//! * requests under the API prefix go to the network first, either unmodified or re-targeted at a
//!   [`Backend`], falling back to a cached response and then to a `503` JSON error;
//! * every other request is answered from the cache first, and successful responses are stored
//!   for next time. When the network fails, navigations get the cached shell page.
//!
//! The host supplies the platform: a [`CacheStorage`], a [`Network`][network::Network] and a
//! [`WorkerHost`][host::WorkerHost]. [`MemoryCacheStorage`] is included, and with the `reqwest`
//! feature so is a native network.
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and never installs a logger.

pub mod backend;
pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod host;
pub mod http;
pub mod interceptor;
pub mod lifecycle;
pub mod mime;
pub mod network;

#[cfg(test)]
mod testing;

pub use crate::backend::Backend;
#[doc(inline)]
pub use crate::cache::{CacheStorage, MemoryCacheStorage};
#[doc(inline)]
pub use crate::config::{ApiMode, WorkerConfig, WorkerMode};
#[doc(inline)]
pub use crate::error::Error;
#[doc(inline)]
pub use crate::http::{Body, Request, Response};
#[doc(inline)]
pub use crate::interceptor::Interceptor;
#[doc(inline)]
pub use crate::lifecycle::{FetchOutcome, Lifecycle, MessageOutcome};
pub use swcache_shared::{ControlMessage, Notification};
