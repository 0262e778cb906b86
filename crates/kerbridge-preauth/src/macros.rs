/// Creates a `PreauthError` with `General` kind
///
/// Shorthand for
/// ```rust
/// <kerbridge_preauth::PreauthError as kerbridge_preauth::PreauthErrorExt>::general(context)
/// ```
#[macro_export]
macro_rules! general_err {
    ( $context:expr $(,)? ) => {{
        <$crate::PreauthError as $crate::PreauthErrorExt>::general($context)
    }};
}

/// Creates a `PreauthError` with `Reason` kind
///
/// Shorthand for
/// ```rust
/// <kerbridge_preauth::PreauthError as kerbridge_preauth::PreauthErrorExt>::reason(context, reason)
/// ```
#[macro_export]
macro_rules! reason_err {
    ( $context:expr, $($arg:tt)* ) => {{
        <$crate::PreauthError as $crate::PreauthErrorExt>::reason($context, format!($($arg)*))
    }};
}

/// Creates a `PreauthError` with `Custom` kind and a source error attached to it
///
/// Shorthand for
/// ```rust
/// <kerbridge_preauth::PreauthError as kerbridge_preauth::PreauthErrorExt>::custom(context, source)
/// ```
#[macro_export]
macro_rules! custom_err {
    ( $context:expr, $source:expr $(,)? ) => {{
        <$crate::PreauthError as $crate::PreauthErrorExt>::custom($context, $source)
    }};
}
