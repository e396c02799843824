//! Clockify API client with single-running-timer semantics.
//!
//! - `transport`: how requests reach Clockify (real HTTP, or anything implementing [`Transport`])
//! - `types`: the remote entities
//!
//! Starting a timer always stops the running one first, so this client never leaves two entries
//! open. The stop and the start are separate calls though: another Clockify client acting in
//! between can still break the invariant.

mod transport;
mod types;

use std::cell::OnceCell;

use jiff::Timestamp;
use serde::{Serialize, de::DeserializeOwned};
use tracing::instrument;
pub use transport::{ApiRequest, ApiResponse, BASE_URL, HttpTransport, Transport};
use types::{NewTimeEntry, StopTimeEntry};
pub use types::{Project, TimeEntry, TimeInterval, User, Workspace};

use crate::{config::Settings, error::ClockifyError};
#[cfg(test)]
use crate::mocks::MockClock as Clock;

#[cfg(not(test))]
struct Clock;
#[cfg(not(test))]
impl Clock {
	fn now() -> Timestamp {
		Timestamp::now()
	}
}

/// Clockify's accepted instant format. Sub-second precision is dropped.
pub fn format_timestamp(ts: Timestamp) -> String {
	ts.strftime("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Where a user's time entries live.
struct EntriesScope {
	workspace_id: String,
	user_id: String,
}

impl EntriesScope {
	fn user_entries(&self) -> String {
		format!("/workspaces/{}/user/{}/time-entries", self.workspace_id, self.user_id)
	}

	fn workspace_entries(&self) -> String {
		format!("/workspaces/{}/time-entries", self.workspace_id)
	}
}

/// Stateful wrapper over the Clockify API.
///
/// The workspace is resolved once and cached for the lifetime of the client; the first workspace
/// of the account is used. Not `Sync`: operations are meant to run one after another.
pub struct ClockifyClient<T = HttpTransport> {
	transport: T,
	workspace: OnceCell<Workspace>,
}

impl ClockifyClient<HttpTransport> {
	/// Client against the real Clockify API. Fails if no API key is configured.
	pub fn new(settings: &Settings) -> Result<Self, ClockifyError> {
		let api_key = settings.api_key()?;
		Ok(Self::from_transport(HttpTransport::new(api_key)?))
	}
}

impl<T: Transport> ClockifyClient<T> {
	/// Client over an arbitrary transport. The API key is still required.
	pub fn with_transport(settings: &Settings, transport: T) -> Result<Self, ClockifyError> {
		settings.api_key()?;
		Ok(Self::from_transport(transport))
	}

	fn from_transport(transport: T) -> Self {
		Self {
			transport,
			workspace: OnceCell::new(),
		}
	}

	fn request<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ClockifyError> {
		tracing::debug!(method = %request.method, endpoint = %request.endpoint, "clockify request");
		let response = self.transport.send(&request)?;

		if !response.is_success() {
			tracing::debug!(status = response.status, body = %response.body, "clockify request failed");
			return Err(ClockifyError::RemoteApi {
				status: response.status,
				body: response.body,
			});
		}

		serde_json::from_str(&response.body).map_err(|source| ClockifyError::Json {
			endpoint: request.endpoint,
			source,
		})
	}

	#[instrument(skip(self))]
	pub fn get_workspace(&self) -> Result<&Workspace, ClockifyError> {
		if let Some(workspace) = self.workspace.get() {
			return Ok(workspace);
		}

		let workspaces: Vec<Workspace> = self.request(ApiRequest::get("/workspaces"))?;
		let first = workspaces.into_iter().next().ok_or(ClockifyError::NoWorkspace)?;
		tracing::debug!(id = %first.id, name = %first.name, "caching workspace");
		Ok(self.workspace.get_or_init(|| first))
	}

	fn fetch_projects(&self) -> Result<Vec<Project>, ClockifyError> {
		let workspace_id = &self.get_workspace()?.id;
		self.request(ApiRequest::get(format!("/workspaces/{workspace_id}/projects")))
	}

	/// All projects of the workspace, or only the first one named exactly `name`.
	///
	/// A name that matches nothing yields an empty vec. An empty name counts as no filter.
	#[instrument(skip(self))]
	pub fn get_projects(&self, name: Option<&str>) -> Result<Vec<Project>, ClockifyError> {
		let projects = self.fetch_projects()?;
		match name.filter(|n| !n.is_empty()) {
			Some(name) => Ok(projects.into_iter().find(|p| p.name == name).into_iter().collect()),
			None => Ok(projects),
		}
	}

	/// Project named exactly `name`, if there is one.
	#[instrument(skip(self))]
	pub fn find_project(&self, name: &str) -> Result<Option<Project>, ClockifyError> {
		Ok(self.fetch_projects()?.into_iter().find(|p| p.name == name))
	}

	#[instrument(skip(self))]
	pub fn get_current_user(&self) -> Result<User, ClockifyError> {
		self.request(ApiRequest::get("/user"))
	}

	/// Resolves workspace and user, then looks at the most recent entry only.
	fn running_entry(&self) -> Result<(EntriesScope, Option<TimeEntry>), ClockifyError> {
		let workspace_id = self.get_workspace()?.id.clone();
		let user_id = self.get_current_user()?.id;
		let scope = EntriesScope { workspace_id, user_id };

		let latest: Vec<TimeEntry> = self.request(ApiRequest::get(scope.user_entries()).query("hydrated", true).query("page-size", 1))?;
		let running = latest.into_iter().next().filter(TimeEntry::is_running);
		Ok((scope, running))
	}

	/// The entry being tracked right now, or `None`.
	#[instrument(skip(self))]
	pub fn get_running_timer(&self) -> Result<Option<TimeEntry>, ClockifyError> {
		Ok(self.running_entry()?.1)
	}

	/// Stop the running entry, returning it as updated by Clockify. `None` if nothing was running.
	#[instrument(skip(self))]
	pub fn stop_timer(&self) -> Result<Option<TimeEntry>, ClockifyError> {
		let (scope, running) = self.running_entry()?;
		match running {
			Some(entry) => self.stop_running(&scope, &entry).map(Some),
			None => {
				tracing::debug!("no running timer to stop");
				Ok(None)
			}
		}
	}

	fn stop_running(&self, scope: &EntriesScope, running: &TimeEntry) -> Result<TimeEntry, ClockifyError> {
		let endpoint = scope.user_entries();
		let body = to_json(&endpoint, &StopTimeEntry { end: format_timestamp(Clock::now()) })?;

		let stopped: TimeEntry = self.request(ApiRequest::patch(endpoint, body))?;
		tracing::info!(id = %running.id, description = %running.description, end = ?stopped.time_interval.end, "stopped timer");
		Ok(stopped)
	}

	/// Start a new, non-billable entry, stopping whatever was running first.
	#[instrument(skip(self))]
	pub fn start_timer(&self, description: &str, project_id: &str) -> Result<TimeEntry, ClockifyError> {
		let (scope, running) = self.running_entry()?;
		if let Some(entry) = running {
			self.stop_running(&scope, &entry)?;
		}

		let endpoint = scope.workspace_entries();
		let payload = NewTimeEntry {
			start: format_timestamp(Clock::now()),
			description,
			project_id,
			billable: false,
		};
		let body = to_json(&endpoint, &payload)?;

		let created: TimeEntry = self.request(ApiRequest::post(endpoint, body))?;
		tracing::info!(id = %created.id, description, project_id, start = %created.time_interval.start, "started timer");
		Ok(created)
	}
}

fn to_json<S: Serialize>(endpoint: &str, payload: &S) -> Result<serde_json::Value, ClockifyError> {
	serde_json::to_value(payload).map_err(|source| ClockifyError::Json {
		endpoint: endpoint.to_owned(),
		source,
	})
}
