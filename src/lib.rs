/*
 * Tracks and reverses the replacement of project references with binary
 * references in build projects. The host application supplies the project
 * model through `ReferenceHostOperations`; this crate keeps the ledger that
 * makes each switch reversible.
 */
pub mod core;

pub use crate::core::*;

#[cfg(test)]
pub(crate) fn initialize_logging() {
    use simplelog::{Config, LevelFilter, SimpleLogger};
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = SimpleLogger::init(LevelFilter::Trace, Config::default());
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_initialize_logging_can_run_repeatedly() {
        super::initialize_logging();
        super::initialize_logging();
        assert!(log::log_enabled!(log::Level::Debug));
    }
}
