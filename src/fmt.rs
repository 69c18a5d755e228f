//! Logging shims.
//!
//! Routes to `defmt`, `log` or `esp-println` depending on the enabled
//! feature and expands to nothing when none of them is enabled.

#![macro_use]
#![allow(unused_macros)]

macro_rules! log_with {
    ($level:ident, $($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$level!("{}", ::defmt::Display2Format(&format_args!($($arg)*)));

        #[cfg(feature = "log")]
        ::log::$level!($($arg)*);

        #[cfg(feature = "esp32-log")]
        ::esp_println::println!($($arg)*);

        #[cfg(not(any(feature = "defmt", feature = "log", feature = "esp32-log")))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => { log_with!(debug, $($arg)*) };
}

macro_rules! info {
    ($($arg:tt)*) => { log_with!(info, $($arg)*) };
}

macro_rules! warn {
    ($($arg:tt)*) => { log_with!(warn, $($arg)*) };
}
