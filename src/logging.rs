use std::io;

/// Installs the global subscriber. Logs always go to stderr: stdout carries
/// the JSON-RPC stream in server mode and the conversation in client mode.
pub fn setup_logging(verbose_level: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        tracing_subscriber::EnvFilter::new(filter_for_verbosity(verbose_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_writer(io::stderr)
        .init();
}

fn filter_for_verbosity(verbose_level: u8) -> &'static str {
    match verbose_level {
        0 => "warn,led_assistant=info",
        1 => "info,led_assistant=debug",
        _ => "debug,led_assistant=trace",
    }
}
