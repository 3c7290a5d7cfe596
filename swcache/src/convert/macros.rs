//! Macros to support the implementation of conversion traits.

/// Implement a conversion trait for a type that parses from a string.
///
/// The arguments are:
///
/// - `$type`: the target type of the conversion, for example `HeaderName` for `ToHeaderName`.
///
/// - `$trait`: the user-facing trait. It should have no methods and inherit from `$sealed`; it is
///   declared by the caller so it can be documented there.
///
/// - `$sealed`: the supertrait holding the conversion method. It is declared by this macro, so the
///   caller must not define it.
///
/// - `$fail_msg`: a human-readable message used in the panic when parsing fails.
///
/// Use the macro inside a one-off module per trait and export only `$trait`, so that nothing
/// outside this crate can implement it.
macro_rules! convert_stringy {
    ( $type:path, $trait:ident, $sealed:ident, $fail_msg:literal ) => {
        #[allow(unused)]
        use std::str::FromStr;

        impl $trait for $type {}
        impl<'a> $trait for &'a $type {}
        impl $trait for &str {}
        impl $trait for String {}
        impl $trait for &String {}

        pub trait $sealed {
            fn into_owned(self) -> $type;
        }

        impl $sealed for $type {
            fn into_owned(self) -> $type {
                self
            }
        }

        impl<'a> $sealed for &'a $type {
            fn into_owned(self) -> $type {
                self.clone()
            }
        }

        impl $sealed for &str {
            fn into_owned(self) -> $type {
                <$type>::from_str(self).unwrap_or_else(|_| panic!(concat!($fail_msg, ": {}"), self))
            }
        }

        impl $sealed for String {
            fn into_owned(self) -> $type {
                $sealed::into_owned(self.as_str())
            }
        }

        impl $sealed for &String {
            fn into_owned(self) -> $type {
                $sealed::into_owned(self.as_str())
            }
        }
    };
}
