use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// When set, every trace event is additionally written to this file as JSON lines.
pub static TRACE_FILE_ENV: &str = "PLEX_CLOCKIFY_TRACE_FILE";

fn stderr_filter() -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(option_env!("LOG_DIRECTIVES").unwrap_or("info")))
}

/// Install the global subscriber: human-readable output on stderr, plus the JSON trace file if requested.
pub fn init() -> std::io::Result<()> {
	let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false).with_filter(stderr_filter());

	let json_layer = match std::env::var_os(TRACE_FILE_ENV) {
		Some(path) => {
			let file = std::fs::File::create(path)?;
			Some(fmt::layer().json().with_writer(Mutex::new(file)).with_filter(EnvFilter::new("debug")))
		}
		None => None,
	};

	tracing_subscriber::registry().with(stderr_layer).with(json_layer).try_init().map_err(std::io::Error::other)
}
