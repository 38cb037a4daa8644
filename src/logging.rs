use log::info;

/// Sets up `env_logger` with an `info` default, overridable through
/// `RUST_LOG`. Safe to call more than once; later calls do nothing.
pub fn initialize_logger() {
    let initialized =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_secs()
            .format_module_path(true)
            .try_init()
            .is_ok();

    if initialized {
        info!("Logger initialized");
    }
}
