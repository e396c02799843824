//! Utilities for capturing and verifying tracing output in integration tests.
//!
//! When the binary runs with `PLEX_CLOCKIFY_TRACE_FILE` set, trace events are written to that file
//! as JSON lines. In `--mock` mode every Clockify request shows up as an `info` event with target
//! `mock_clockify` and message `"METHOD /endpoint"`.

use std::{fs, path::Path};

use serde::Deserialize;

/// A single trace event from the JSON log
#[derive(Debug, Deserialize)]
pub struct TraceEvent {
	/// The log level (DEBUG, INFO, WARN, ERROR)
	pub level: String,
	pub target: String,
	pub fields: TraceFields,
}

#[derive(Debug, Deserialize)]
pub struct TraceFields {
	pub message: Option<String>,
	/// HTTP method (for Clockify requests)
	pub method: Option<String>,
	pub endpoint: Option<String>,
}

/// Parsed trace log that provides verification methods
pub struct TraceLog {
	events: Vec<TraceEvent>,
}

impl TraceLog {
	pub fn from_file(path: &Path) -> Self {
		let content = fs::read_to_string(path).unwrap_or_default();
		let events: Vec<TraceEvent> = content.lines().filter(|line| !line.is_empty()).filter_map(|line| serde_json::from_str(line).ok()).collect();

		Self { events }
	}

	/// Whether the mock served `call`, given as `"METHOD /endpoint"`
	pub fn has_mock_call(&self, call: &str) -> bool {
		let Some((method, endpoint)) = call.split_once(' ') else {
			return false;
		};
		self.events
			.iter()
			.any(|e| e.target == "mock_clockify" && e.fields.method.as_deref() == Some(method) && e.fields.endpoint.as_deref() == Some(endpoint))
	}

	/// Mock Clockify requests in the order they were made
	pub fn mock_calls(&self) -> Vec<String> {
		self.events.iter().filter(|e| e.target == "mock_clockify").filter_map(|e| e.fields.message.clone()).collect()
	}

	/// Number of mock requests with this method
	pub fn count_method(&self, method: &str) -> usize {
		self.events
			.iter()
			.filter(|e| e.target == "mock_clockify" && e.fields.method.as_deref() == Some(method))
			.count()
	}

	/// Events at `level` whose message contains `needle`
	pub fn has_message(&self, level: &str, needle: &str) -> bool {
		self.events
			.iter()
			.any(|e| e.level == level && e.fields.message.as_deref().is_some_and(|m| m.contains(needle)))
	}
}

/// Assert that the mock served a request
#[macro_export]
macro_rules! assert_traced {
	($log:expr, $call:expr) => {
		assert!(
			$log.has_mock_call($call),
			"Expected mock call '{}' to be traced, but it wasn't. Mock calls:\n{:#?}",
			$call,
			$log.mock_calls()
		);
	};
}
