//! Decision trace hook
//!
//! `bot_trace!` forwards to `tracing::debug!` under the `royale_bots::trace`
//! target when the `bot-trace` feature is on, and expands to nothing
//! otherwise.

#[cfg(feature = "bot-trace")]
#[macro_export]
macro_rules! bot_trace {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "royale_bots::trace", $($arg)*)
    };
}

#[cfg(not(feature = "bot-trace"))]
#[macro_export]
macro_rules! bot_trace {
    ($($arg:tt)*) => {};
}
