//! Logging bootstrap for embedding applications.

/// Initialize `env_logger` (reads `RUST_LOG`, defaults to info). Safe to
/// call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
