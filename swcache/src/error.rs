//! Error-handling utilities.
//!
//! Each concern has its own error type, defined next to the code that returns it and re-exported
//! here. [`Error`] is an [`anyhow::Error`] for host glue that only needs to report a failure.

pub use crate::backend::BackendError;
pub use crate::cache::CacheError;
pub use crate::config::ConfigError;
pub use crate::host::HostError;
pub use crate::http::{BodyError, SendError, SendErrorCause};
pub use crate::lifecycle::PrecacheError;
pub use anyhow::{anyhow, bail, ensure, Context, Error};
