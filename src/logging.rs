use tracing_subscriber::{fmt, EnvFilter};

/// Log to stderr so report output on stdout stays clean.
///
/// `RUST_LOG` selects the level (default `warn`), e.g.
/// `RUST_LOG=waterfall_report=debug` to see every extracted row.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}
