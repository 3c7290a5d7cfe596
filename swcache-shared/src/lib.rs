// Warnings (other than unused variables) in doctests are promoted to errors.
#![doc(test(attr(deny(warnings))))]
#![doc(test(attr(allow(dead_code))))]
#![doc(test(attr(allow(unused_variables))))]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::invalid_codeblock_attributes)]

//! Definitions shared between the `swcache` interceptor and the pages it controls.
//!
//! Everything that crosses the boundary between the interceptor and a page lives here: the control
//! messages a page may post, the notification broadcast on activation, the JSON body of a
//! synthesized offline API response, and the deployment defaults.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The path prefix reserved for API requests.
pub const DEFAULT_API_PREFIX: &str = "/api/";

/// URL scheme used by browser extensions. Requests with this scheme are never intercepted.
pub const EXTENSION_SCHEME: &str = "chrome-extension";

/// Host of the internal sentinel target that is never intercepted.
pub const SENTINEL_HOST: &str = "localhost";

/// Port of the internal sentinel target that is never intercepted.
pub const SENTINEL_PORT: u16 = 0;

/// Path of the page served to navigations while offline.
pub const DEFAULT_NAVIGATION_FALLBACK: &str = "/index.html";

/// Status of every synthesized offline response.
pub const OFFLINE_STATUS: StatusCode = StatusCode::SERVICE_UNAVAILABLE;

/// Body of the synthesized response for a failed navigation with no cached fallback page.
pub const OFFLINE_TEXT: &str = "Offline";

/// Body of the synthesized response for any other failed static request.
pub const SERVICE_UNAVAILABLE_TEXT: &str = "Service Unavailable";

/// Default `message` of the offline API error body.
pub const DEFAULT_OFFLINE_MESSAGE: &str =
    "Unable to reach API. You appear to be offline or the server is unreachable.";

/// Default `message` of the update notification.
pub const DEFAULT_UPDATE_MESSAGE: &str =
    "New service worker activated. Please reload to use the latest version.";

/// A control message posted by a page to the interceptor.
///
/// On the wire this is a JSON object with a `type` field:
///
/// ```
/// # use swcache_shared::ControlMessage;
/// let value = serde_json::json!({ "type": "SKIP_WAITING" });
/// assert_eq!(ControlMessage::from_value(&value), Some(ControlMessage::SkipWaiting));
/// assert_eq!(serde_json::to_value(ControlMessage::SkipWaiting).unwrap(), value);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Activate the waiting version immediately instead of waiting for every page to close.
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

impl ControlMessage {
    /// Wire name of [`ControlMessage::SkipWaiting`].
    pub const SKIP_WAITING: &'static str = "SKIP_WAITING";

    /// Recognize a control message from arbitrary posted data.
    ///
    /// Only the `type` field is inspected; other fields are ignored. Returns `None` for anything
    /// that is not an object with a recognized `type`, which callers treat as "ignore".
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.get("type")?.as_str()? {
            Self::SKIP_WAITING => Some(Self::SkipWaiting),
            _ => None,
        }
    }

    /// The wire name of this message's `type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkipWaiting => Self::SKIP_WAITING,
        }
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message broadcast by the interceptor to every page it controls.
///
/// ```
/// # use swcache_shared::Notification;
/// let n = Notification::updated("reload please");
/// assert_eq!(
///     serde_json::to_string(&n).unwrap(),
///     r#"{"type":"SW_UPDATED","message":"reload please"}"#
/// );
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// A new version took control. Pages decide for themselves whether to reload.
    #[serde(rename = "SW_UPDATED")]
    Updated {
        /// Human-readable text a page may show to the user.
        message: String,
    },
}

impl Notification {
    /// Build an [`Notification::Updated`] with the given text.
    pub fn updated(message: impl Into<String>) -> Self {
        Self::Updated {
            message: message.into(),
        }
    }
}

/// Machine-readable code in an [`ApiErrorBody`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    /// The API could not be reached and no cached response was available.
    NetworkError,
}

/// JSON body of the synthesized response returned for an unreachable API.
///
/// ```
/// # use swcache_shared::ApiErrorBody;
/// let body = ApiErrorBody::network_error("offline");
/// assert_eq!(
///     serde_json::to_string(&body).unwrap(),
///     r#"{"error":"network_error","message":"offline"}"#
/// );
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Error code, always `network_error` today.
    pub error: ApiErrorCode,
    /// Human-readable explanation.
    pub message: String,
}

impl ApiErrorBody {
    /// A `network_error` body with the given message.
    pub fn network_error(message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorCode::NetworkError,
            message: message.into(),
        }
    }
}

/// Error returned when a host-provided name does not match any variant of one of the enums below.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// How a request was initiated, as reported by the host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// A top-level navigation.
    Navigate,
    /// A same-origin request.
    SameOrigin,
    /// A cross-origin request without CORS.
    NoCors,
    /// A cross-origin request using CORS. This is the default for programmatic fetches.
    Cors,
}

impl Default for RequestMode {
    fn default() -> Self {
        Self::Cors
    }
}

impl TryFrom<&str> for RequestMode {
    type Error = UnknownVariant;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "navigate" => Ok(Self::Navigate),
            "same-origin" => Ok(Self::SameOrigin),
            "no-cors" => Ok(Self::NoCors),
            "cors" => Ok(Self::Cors),
            other => Err(UnknownVariant::new("request mode", other)),
        }
    }
}

/// What a request's response will be used for, as reported by the host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestDestination {
    /// No specific destination, e.g. a programmatic fetch. This is the default.
    Empty,
    /// A top-level document.
    Document,
    /// A nested browsing context.
    Iframe,
    /// A script.
    Script,
    /// A stylesheet.
    Style,
    /// An image.
    Image,
    /// A font.
    Font,
    /// An audio or video resource.
    Media,
    /// A web app manifest.
    Manifest,
    /// A worker script.
    Worker,
}

impl Default for RequestDestination {
    fn default() -> Self {
        Self::Empty
    }
}

impl TryFrom<&str> for RequestDestination {
    type Error = UnknownVariant;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "" => Ok(Self::Empty),
            "document" => Ok(Self::Document),
            "iframe" => Ok(Self::Iframe),
            "script" => Ok(Self::Script),
            "style" => Ok(Self::Style),
            "image" => Ok(Self::Image),
            "font" => Ok(Self::Font),
            "audio" | "video" | "track" => Ok(Self::Media),
            "manifest" => Ok(Self::Manifest),
            "worker" | "sharedworker" | "serviceworker" => Ok(Self::Worker),
            other => Err(UnknownVariant::new("request destination", other)),
        }
    }
}

/// Whether credentials (cookies, HTTP auth) travel with a request.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialsMode {
    /// Never send credentials.
    Omit,
    /// Send credentials to the same origin only. This is the default.
    SameOrigin,
    /// Always send credentials, including cross-origin.
    Include,
}

impl Default for CredentialsMode {
    fn default() -> Self {
        Self::SameOrigin
    }
}

impl TryFrom<&str> for CredentialsMode {
    type Error = UnknownVariant;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "omit" => Ok(Self::Omit),
            "same-origin" => Ok(Self::SameOrigin),
            "include" => Ok(Self::Include),
            other => Err(UnknownVariant::new("credentials mode", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skip_waiting_ignores_extra_fields() {
        let value = json!({ "type": "SKIP_WAITING", "from": "settings-page" });
        assert_eq!(
            ControlMessage::from_value(&value),
            Some(ControlMessage::SkipWaiting)
        );
    }

    #[test]
    fn unrecognized_messages_are_none() {
        for value in [
            json!(null),
            json!({}),
            json!("SKIP_WAITING"),
            json!({ "type": "skip_waiting" }),
            json!({ "type": 7 }),
            json!({ "kind": "SKIP_WAITING" }),
        ] {
            assert_eq!(ControlMessage::from_value(&value), None, "{}", value);
        }
    }

    #[test]
    fn notification_round_trips_through_json() {
        let text = r#"{"type":"SW_UPDATED","message":"hi"}"#;
        let parsed: Notification = serde_json::from_str(text).unwrap();
        assert_eq!(parsed, Notification::updated("hi"));
    }

    #[test]
    fn request_enums_parse_host_names() {
        assert_eq!(RequestMode::try_from("navigate"), Ok(RequestMode::Navigate));
        assert_eq!(
            RequestDestination::try_from("video"),
            Ok(RequestDestination::Media)
        );
        assert_eq!(RequestDestination::try_from(""), Ok(RequestDestination::Empty));
        assert_eq!(
            CredentialsMode::try_from("include"),
            Ok(CredentialsMode::Include)
        );
        let err = RequestMode::try_from("teleport").unwrap_err();
        assert_eq!(err.to_string(), "unknown request mode `teleport`");
    }

    #[test]
    fn defaults_match_programmatic_fetch() {
        assert_eq!(RequestMode::default(), RequestMode::Cors);
        assert_eq!(RequestDestination::default(), RequestDestination::Empty);
        assert_eq!(CredentialsMode::default(), CredentialsMode::SameOrigin);
    }
}
