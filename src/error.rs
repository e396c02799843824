//! Error types for configuration handling and Clockify API calls.
//!
//! Both enums carry miette diagnostics so the binary can print codes and hints.

#![allow(unused_assignments)] // Fields are read by miette's derive macro via attributes

use miette::Diagnostic;

use crate::config::SettingKey;

/// Problems with the recognized settings, or with loading them.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum ConfigError {
	/// `get` was asked for a key outside the recognized set.
	#[error("unknown setting '{key}'")]
	#[diagnostic(code(plex_clockify::config::unknown_key), help("recognized settings are: clockify_api_key, plex_username, mapping"))]
	UnknownKey { key: String },

	/// `set` was asked to write a key outside the recognized set.
	#[error("setting '{key}' is not accepted")]
	#[diagnostic(code(plex_clockify::config::unrecognized), help("recognized settings are: clockify_api_key, plex_username, mapping"))]
	Unrecognized { key: String },

	#[error("required setting '{key}' is not configured")]
	#[diagnostic(code(plex_clockify::config::missing), help("set it in the config file, or through the matching PLEX_CLOCKIFY_* environment variable"))]
	MissingSetting { key: SettingKey },

	#[error("invalid value for '{key}': {reason}")]
	#[diagnostic(code(plex_clockify::config::invalid_value))]
	InvalidValue { key: SettingKey, reason: String },

	#[error("failed to load settings")]
	#[diagnostic(code(plex_clockify::config::load))]
	Load(#[from] config::ConfigError),
}

/// Everything a [`ClockifyClient`](crate::clockify::ClockifyClient) operation can fail with.
///
/// Nothing is retried: the first failing call aborts the whole operation.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum ClockifyError {
	#[error(transparent)]
	#[diagnostic(transparent)]
	Config(#[from] ConfigError),

	/// Any non-2xx response. Status and body are kept verbatim.
	#[error("Clockify response was: [{status}] {body}")]
	#[diagnostic(code(plex_clockify::clockify::remote_api))]
	RemoteApi { status: u16, body: String },

	#[error("request to Clockify failed")]
	#[diagnostic(code(plex_clockify::clockify::transport), help("check network connectivity to api.clockify.me"))]
	Transport(#[from] reqwest::Error),

	#[error("invalid JSON exchanged with {endpoint}")]
	#[diagnostic(code(plex_clockify::clockify::json))]
	Json {
		endpoint: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid Clockify URL")]
	#[diagnostic(code(plex_clockify::clockify::url))]
	Url(#[from] url::ParseError),

	#[error("the Clockify account has no workspaces")]
	#[diagnostic(code(plex_clockify::clockify::no_workspace), help("create a workspace in Clockify first"))]
	NoWorkspace,
}

impl ClockifyError {
	/// HTTP status of a remote API failure, if this is one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::RemoteApi { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// A Plex webhook payload that could not be turned into a playback event.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum WebhookError {
	#[error("webhook payload is not valid JSON")]
	#[diagnostic(code(plex_clockify::webhook::json), help("pass the `payload` part of the Plex multipart request"))]
	Json(#[from] serde_json::Error),

	#[error("webhook payload for '{event}' has no {field}")]
	#[diagnostic(code(plex_clockify::webhook::missing_field))]
	MissingField { event: String, field: &'static str },
}
