//! Diagnostic hooks for the engine's decision points, built over the `log`
//! crate rather than a hand-rolled sink. Compiled out entirely unless the
//! `trace` feature is on, so a release build pays nothing for it.

#[cfg(feature = "trace")]
macro_rules! trace_event {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[cfg(not(feature = "trace"))]
macro_rules! trace_event {
    ($($arg:tt)*) => {
        ()
    };
}

pub(crate) use trace_event;
