//! Process-wide tracing setup shared by binaries, tests and benches.

pub mod tracing;

pub use self::tracing::{DEFAULT_DIRECTIVE, LogFormat, init, init_with, init_for_tests};
