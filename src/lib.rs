pub mod api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod identity;
pub mod roster;
pub mod router;
pub mod storage;
pub mod validate;

// Debug trace helper: prints to stderr in test and debug builds, compiles to nothing
// in release. Usage: tprintln!("state: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        if false { let _ = format!($($arg)*); }
    });
}
