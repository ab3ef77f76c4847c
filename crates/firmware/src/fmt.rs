//! Logging shim: `defmt` on target, `tracing` on host, nothing otherwise.
//!
//! Arguments must implement both `Display` and `defmt::Format`.

#![allow(unused_macros)]

macro_rules! log_at {
    ($defmt:ident, $tracing:ident, $s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$defmt!($s $(, $x)*);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        ::tracing::$tracing!($s $(, $x)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = ($(&$x,)*);
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => { log_at!(debug, debug, $($arg)*) };
}

macro_rules! info {
    ($($arg:tt)*) => { log_at!(info, info, $($arg)*) };
}

macro_rules! warn {
    ($($arg:tt)*) => { log_at!(warn, warn, $($arg)*) };
}

macro_rules! error {
    ($($arg:tt)*) => { log_at!(error, error, $($arg)*) };
}
