//! Conditional logging macros gated on a module-level `ENABLE_LOGS` flag,
//! so chatty pipeline modules can be silenced without touching call sites.
//!
//! Each module using these must define:
//! ```rust
//! const ENABLE_LOGS: bool = true; // or false
//! ```
//! The macros are exported at the crate root.

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
