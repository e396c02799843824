//! Recognized settings and how they are loaded.
//!
//! Only three keys exist: `clockify_api_key`, `plex_username` and `mapping`. Anything else is
//! rejected, both through [`Settings::set`] and in the config file.

use std::{
	ffi::OsString,
	path::{Path, PathBuf},
	str::FromStr,
};

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::error::ConfigError;

pub static APP_NAME: &str = "plex_clockify";
pub static CONFIG_FILENAME: &str = "config.toml";
/// Environment variables `PLEX_CLOCKIFY_<KEY>` override file values for the text settings.
pub static ENV_PREFIX: &str = "PLEX_CLOCKIFY";

/// Associates a set of Plex library names with the Clockify project time is booked on.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, derive_new::new)]
pub struct LibraryMapping {
	pub libraries: Vec<String>,
	pub project: String,
}

impl LibraryMapping {
	/// Mapping used when none is configured.
	pub fn defaults() -> Vec<Self> {
		vec![Self::new(vec!["TV Shows".to_owned(), "Movies".to_owned()], "Watching TV".to_owned())]
	}

	pub fn covers(&self, library: &str) -> bool {
		self.libraries.iter().any(|l| l == library)
	}
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, derive_more::Display)]
pub enum SettingKey {
	#[display("clockify_api_key")]
	ClockifyApiKey,
	#[display("plex_username")]
	PlexUsername,
	#[display("mapping")]
	Mapping,
}

impl SettingKey {
	pub const ALL: [Self; 3] = [Self::ClockifyApiKey, Self::PlexUsername, Self::Mapping];

	fn value_kind(&self) -> &'static str {
		match self {
			Self::ClockifyApiKey | Self::PlexUsername => "text",
			Self::Mapping => "a library mapping",
		}
	}
}

impl FromStr for SettingKey {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL.into_iter().find(|k| k.to_string() == s).ok_or_else(|| ConfigError::UnknownKey { key: s.to_owned() })
	}
}

/// A value read from or written to [`Settings`].
#[derive(Clone, Debug, Eq, PartialEq, derive_more::From)]
pub enum SettingValue {
	Text(String),
	Mapping(Vec<LibraryMapping>),
}

impl SettingValue {
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(s) => Some(s),
			Self::Mapping(_) => None,
		}
	}

	pub fn as_mapping(&self) -> Option<&[LibraryMapping]> {
		match self {
			Self::Mapping(m) => Some(m),
			Self::Text(_) => None,
		}
	}

	fn kind(&self) -> &'static str {
		match self {
			Self::Text(_) => "text",
			Self::Mapping(_) => "a library mapping",
		}
	}
}

impl From<&str> for SettingValue {
	fn from(s: &str) -> Self {
		Self::Text(s.to_owned())
	}
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	pub clockify_api_key: String,
	/// Plex account whose playback is tracked. Empty means every account.
	pub plex_username: String,
	#[default(_code = "LibraryMapping::defaults()")]
	pub mapping: Vec<LibraryMapping>,
}

impl Settings {
	/// Load from `path` (or the XDG config file, if one exists) and the process environment.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		Self::load_from(path, std::env::vars_os())
	}

	/// Like [`load`](Self::load), with an explicit environment.
	///
	/// Precedence, lowest first: built-in defaults, the TOML file, `PLEX_CLOCKIFY_<KEY>` variables.
	/// Variables other than those are never decoded, so they may hold anything.
	pub fn load_from<I, K, V>(path: Option<&Path>, env: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<OsString>,
		V: Into<OsString>, {
		let mut builder = config::Config::builder();

		let file = match path {
			Some(p) => Some((p.to_path_buf(), true)),
			None => default_config_path().map(|p| (p, false)),
		};
		if let Some((file, required)) = file {
			tracing::debug!(path = %file.display(), required, "reading settings file");
			builder = builder.add_source(config::File::from(file).required(required));
		}

		// Only recognized text keys are taken from the environment; unrelated PLEX_CLOCKIFY_* variables are not settings.
		let wanted: Vec<(String, SettingKey)> = [SettingKey::ClockifyApiKey, SettingKey::PlexUsername]
			.into_iter()
			.map(|k| (format!("{ENV_PREFIX}_{}", k.to_string().to_uppercase()), k))
			.collect();
		let mut env_map = config::Map::new();
		for (name, value) in env {
			let name: OsString = name.into();
			let Some((name, key)) = wanted.iter().find(|(w, _)| name.to_str() == Some(w.as_str())) else {
				continue;
			};
			let value: OsString = value.into();
			let value = value.into_string().map_err(|_| ConfigError::InvalidValue {
				key: *key,
				reason: format!("{name} is not valid UTF-8"),
			})?;
			env_map.insert(name.clone(), value);
		}
		builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).source(Some(env_map)));

		let settings: Settings = builder.build()?.try_deserialize()?;
		Ok(settings)
	}

	pub fn get(&self, key: &str) -> Result<SettingValue, ConfigError> {
		let value = match key.parse::<SettingKey>()? {
			SettingKey::ClockifyApiKey => SettingValue::Text(self.clockify_api_key.clone()),
			SettingKey::PlexUsername => SettingValue::Text(self.plex_username.clone()),
			SettingKey::Mapping => SettingValue::Mapping(self.mapping.clone()),
		};
		Ok(value)
	}

	pub fn set(&mut self, key: &str, value: impl Into<SettingValue>) -> Result<(), ConfigError> {
		let key = key.parse::<SettingKey>().map_err(|_| ConfigError::Unrecognized { key: key.to_owned() })?;
		match (key, value.into()) {
			(SettingKey::ClockifyApiKey, SettingValue::Text(v)) => self.clockify_api_key = v,
			(SettingKey::PlexUsername, SettingValue::Text(v)) => self.plex_username = v,
			(SettingKey::Mapping, SettingValue::Mapping(v)) => self.mapping = v,
			(key, value) => {
				return Err(ConfigError::InvalidValue {
					key,
					reason: format!("expected {}, got {}", key.value_kind(), value.kind()),
				});
			}
		}
		Ok(())
	}

	/// Set all three recognized keys at once.
	///
	/// A `None` mapping writes [`LibraryMapping::defaults`], replacing whatever was there.
	pub fn configure(&mut self, clockify_api_key: impl Into<String>, plex_username: impl Into<String>, mapping: Option<Vec<LibraryMapping>>) {
		self.clockify_api_key = clockify_api_key.into();
		self.plex_username = plex_username.into();
		self.mapping = mapping.unwrap_or_else(LibraryMapping::defaults);
	}

	/// The API key, or [`ConfigError::MissingSetting`] when it is blank.
	pub fn api_key(&self) -> Result<&str, ConfigError> {
		let key = self.clockify_api_key.trim();
		if key.is_empty() {
			return Err(ConfigError::MissingSetting { key: SettingKey::ClockifyApiKey });
		}
		Ok(key)
	}

	/// Project name of the first mapping listing `library`.
	pub fn project_for_library(&self, library: &str) -> Option<&str> {
		self.mapping.iter().find(|m| m.covers(library)).map(|m| m.project.as_str())
	}
}

fn default_config_path() -> Option<PathBuf> {
	xdg::BaseDirectories::with_prefix(APP_NAME).find_config_file(CONFIG_FILENAME)
}
