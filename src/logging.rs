//! Logger setup.
//!
//! Logs go to stderr, leaving stdout to the menu and command output.
//! The default level is `warn`; `RUST_LOG` overrides it.

pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
