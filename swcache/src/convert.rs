//! Convenient conversion traits.
//
// Methods on `Request` and `Response` take `impl ToHeaderName`, `impl ToUrl` and friends rather
// than the concrete types, so callers can pass string literals without explicit parsing.
//
// Unlike `TryInto`, these conversions panic when a string does not parse. Each trait documents
// which source types can panic; use the non-panicking conversion listed there for untrusted input.
// The traits are sealed, so they cannot be implemented outside this crate.
#[macro_use]
mod macros;

use ::url::Url;
use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};

pub use self::header_name::ToHeaderName;
pub use self::header_value::ToHeaderValue;
pub use self::method::ToMethod;
pub use self::status_code::ToStatusCode;
pub use self::url::ToUrl;

mod header_name {
    use super::*;

    /// Types that can be converted to a [`HeaderName`].
    ///
    /// | Source type                                         | Can panic? | Non-panicking conversion   |
    /// |-----------------------------------------------------|------------|----------------------------|
    /// | [`HeaderName` or `&HeaderName`][`HeaderName`]       | No         | N/A                        |
    /// | [`&str`][`str`], [`String`, or `&String`][`String`] | Yes        | [`HeaderName::try_from()`] |
    pub trait ToHeaderName: Sealed {}

    convert_stringy!(HeaderName, ToHeaderName, Sealed, "invalid HTTP header name");
}

mod header_value {
    use super::*;

    /// Types that can be converted to a [`HeaderValue`].
    ///
    /// | Source type                                         | Can panic? | Non-panicking conversion    |
    /// |-----------------------------------------------------|------------|-----------------------------|
    /// | [`HeaderValue` or `&HeaderValue`][`HeaderValue`]    | No         | N/A                         |
    /// | [`HeaderName`]                                      | No         | N/A                         |
    /// | [`&str`][`str`], [`String`, or `&String`][`String`] | Yes        | [`HeaderValue::try_from()`] |
    pub trait ToHeaderValue: Sealed {}

    convert_stringy!(HeaderValue, ToHeaderValue, Sealed, "invalid HTTP header value");

    impl ToHeaderValue for HeaderName {}

    impl Sealed for HeaderName {
        fn into_owned(self) -> HeaderValue {
            HeaderValue::from(self)
        }
    }
}

mod method {
    use super::*;

    /// Types that can be converted to a [`Method`].
    ///
    /// | Source type                                         | Can panic? | Non-panicking conversion |
    /// |-----------------------------------------------------|------------|--------------------------|
    /// | [`Method` or `&Method`][`Method`]                   | No         | N/A                      |
    /// | [`&str`][`str`], [`String`, or `&String`][`String`] | Yes        | [`Method::try_from()`]   |
    pub trait ToMethod: Sealed {}

    convert_stringy!(Method, ToMethod, Sealed, "invalid HTTP method");
}

mod url {
    use super::*;

    /// Types that can be converted to a [`Url`].
    ///
    /// | Source type                                         | Can panic? | Non-panicking conversion |
    /// |-----------------------------------------------------|------------|--------------------------|
    /// | [`Url or &Url`][`Url`]                              | No         | N/A                      |
    /// | [`&str`][`str`], [`String`, or `&String`][`String`] | Yes        | [`Url::parse()`]         |
    pub trait ToUrl: Sealed {}

    convert_stringy!(Url, ToUrl, Sealed, "invalid URL");
}

mod status_code {
    use super::*;

    /// Types that can be converted to a [`StatusCode`].
    ///
    /// | Source type    | Can panic? | Non-panicking conversion   |
    /// |----------------|------------|----------------------------|
    /// | [`StatusCode`] | No         | N/A                        |
    /// | [`u16`]        | Yes        | [`StatusCode::try_from()`] |
    pub trait ToStatusCode: Sealed {}

    impl ToStatusCode for StatusCode {}

    impl ToStatusCode for u16 {}

    pub trait Sealed {
        fn to_status_code(self) -> StatusCode;
    }

    impl Sealed for StatusCode {
        fn to_status_code(self) -> StatusCode {
            self
        }
    }

    impl Sealed for u16 {
        fn to_status_code(self) -> StatusCode {
            StatusCode::from_u16(self)
                .unwrap_or_else(|_| panic!("invalid HTTP status code: {}", self))
        }
    }
}
