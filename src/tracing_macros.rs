// Zero-cost tracing macros for tola-htmldiff
//
// These macros forward to tracing when the `tracing` feature is enabled or in tests,
// and compile to nothing otherwise. `warning!` stands in for `warn!`, whose name
// clashes with the built-in lint attribute.

#[cfg(any(test, feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => { ::tracing::trace!($($arg)*) }
}

#[cfg(not(any(test, feature = "tracing")))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(any(test, feature = "tracing"))]
macro_rules! debug {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) }
}

#[cfg(not(any(test, feature = "tracing")))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(any(test, feature = "tracing"))]
macro_rules! warning {
    ($($arg:tt)*) => { ::tracing::warn!($($arg)*) }
}

#[cfg(not(any(test, feature = "tracing")))]
macro_rules! warning {
    ($($arg:tt)*) => {};
}

#[allow(unused_imports)]
pub(crate) use trace;

#[allow(unused_imports)]
pub(crate) use debug;

#[allow(unused_imports)]
pub(crate) use warning;
