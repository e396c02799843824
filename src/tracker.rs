//! Turns Plex playback events into Clockify timer calls.
//!
//! Plex posts a webhook for every playback state change. Only `media.play`/`media.resume` (start
//! tracking) and `media.pause`/`media.stop` (stop tracking) matter here; the library the media
//! belongs to decides which Clockify project the time goes to.

use serde::Deserialize;
use tracing::instrument;

use crate::{
	clockify::{ClockifyClient, TimeEntry, Transport},
	config::Settings,
	error::{ClockifyError, WebhookError},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display)]
pub enum PlaybackSignal {
	#[display("started")]
	Started,
	#[display("stopped")]
	Stopped,
}

impl PlaybackSignal {
	/// Signal for a Plex webhook event name, `None` for events that do not affect tracking.
	pub fn from_plex_event(event: &str) -> Option<Self> {
		match event {
			"media.play" | "media.resume" => Some(Self::Started),
			"media.pause" | "media.stop" => Some(Self::Stopped),
			_ => None,
		}
	}
}

/// What the tracker needs to know about one playback change.
#[derive(Clone, Debug, Eq, PartialEq, derive_new::new)]
pub struct PlexEvent {
	pub signal: PlaybackSignal,
	pub library: String,
	pub description: String,
	/// Plex account that triggered the event
	pub account: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
	event: String,
	#[serde(rename = "Account")]
	account: Option<Account>,
	#[serde(rename = "Metadata")]
	metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
struct Account {
	title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
	library_section_title: Option<String>,
	title: Option<String>,
	/// Show name, for episodes
	grandparent_title: Option<String>,
}

impl PlexEvent {
	/// Parse the JSON `payload` part of a Plex webhook. Events irrelevant to tracking give `Ok(None)`.
	pub fn from_webhook_json(payload: &str) -> Result<Option<Self>, WebhookError> {
		let payload: WebhookPayload = serde_json::from_str(payload)?;
		let Some(signal) = PlaybackSignal::from_plex_event(&payload.event) else {
			tracing::debug!(event = %payload.event, "ignoring Plex event");
			return Ok(None);
		};

		let missing = |field| WebhookError::MissingField {
			event: payload.event.clone(),
			field,
		};
		let metadata = payload.metadata.as_ref().ok_or_else(|| missing("Metadata"))?;
		let library = metadata.library_section_title.clone().ok_or_else(|| missing("Metadata.librarySectionTitle"))?;
		let title = metadata.title.as_deref().ok_or_else(|| missing("Metadata.title"))?;

		let description = match metadata.grandparent_title.as_deref() {
			Some(show) => format!("Watching {show} - {title}"),
			None => format!("Watching {title}"),
		};

		Ok(Some(Self::new(signal, library, description, payload.account.map(|a| a.title))))
	}
}

#[derive(Clone, Debug, Eq, PartialEq, derive_more::Display)]
pub enum IgnoreReason {
	#[display("event from Plex account '{_0}' is not tracked")]
	OtherAccount(String),
	#[display("library '{_0}' is not mapped to a project")]
	UnmappedLibrary(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
	Started(TimeEntry),
	/// `None` when nothing was running
	Stopped(Option<TimeEntry>),
	Ignored(IgnoreReason),
	/// The mapped project does not exist in the workspace
	UnknownProject(String),
}

/// Dispatches [`PlexEvent`]s to a [`ClockifyClient`] according to the configured mapping.
pub struct Tracker<T: Transport> {
	settings: Settings,
	client: ClockifyClient<T>,
}

impl<T: Transport> Tracker<T> {
	pub fn new(settings: Settings, client: ClockifyClient<T>) -> Self {
		Self { settings, client }
	}

	#[instrument(skip(self), fields(signal = %event.signal, library = %event.library))]
	pub fn handle(&self, event: &PlexEvent) -> Result<Outcome, ClockifyError> {
		let username = self.settings.plex_username.as_str();
		if !username.is_empty() && event.account.as_deref() != Some(username) {
			let account = event.account.clone().unwrap_or_default();
			tracing::debug!(%account, "event from untracked account");
			return Ok(Outcome::Ignored(IgnoreReason::OtherAccount(account)));
		}

		let Some(project_name) = self.settings.project_for_library(&event.library) else {
			tracing::debug!("library has no mapping");
			return Ok(Outcome::Ignored(IgnoreReason::UnmappedLibrary(event.library.clone())));
		};

		match event.signal {
			PlaybackSignal::Stopped => Ok(Outcome::Stopped(self.client.stop_timer()?)),
			PlaybackSignal::Started => match self.client.find_project(project_name)? {
				Some(project) => Ok(Outcome::Started(self.client.start_timer(&event.description, &project.id)?)),
				None => {
					tracing::warn!(project = project_name, "mapped project does not exist in Clockify");
					Ok(Outcome::UnknownProject(project_name.to_owned()))
				}
			},
		}
	}
}
