//! Mock Clockify API for testing purposes.
//!
//! Implements [`Transport`] over in-memory state, so a [`ClockifyClient`](crate::clockify::ClockifyClient)
//! can be driven end to end without touching the network. Every request is recorded and emitted as a
//! `tracing::info!` event with target `mock_clockify`, which integration tests read back from the
//! JSON trace file.

use std::{
	path::Path,
	sync::{
		Mutex, MutexGuard, PoisonError,
		atomic::{AtomicU64, Ordering},
	},
};

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
	clockify::{ApiRequest, ApiResponse, Project, TimeEntry, TimeInterval, Transport, User, Workspace},
	error::ClockifyError,
};

/// Env var naming a JSON file the binary's `--mock` mode loads its state from and saves it back to.
pub static MOCK_STATE_ENV: &str = "PLEX_CLOCKIFY_MOCK_STATE";

/// Everything the fake server knows. Entries are kept oldest first.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MockState {
	pub workspaces: Vec<Workspace>,
	pub projects: Vec<Project>,
	pub user: Option<User>,
	pub entries: Vec<TimeEntry>,
	/// Canned answers, checked before the regular routes
	#[serde(default)]
	pub responses: Vec<ScriptedResponse>,
}

impl MockState {
	fn has_workspace(&self, id: &str) -> bool {
		self.workspaces.iter().any(|w| w.id == id)
	}

	fn has_user(&self, id: &str) -> bool {
		self.user.as_ref().is_some_and(|u| u.id == id)
	}
}

/// A canned response for requests matching a method and endpoint prefix.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScriptedResponse {
	pub method: String,
	pub endpoint_prefix: String,
	pub status: u16,
	pub body: String,
}

impl ScriptedResponse {
	fn matches(&self, request: &ApiRequest) -> bool {
		self.method == request.method.as_str() && request.endpoint.starts_with(&self.endpoint_prefix)
	}
}

pub struct MockClockify {
	state: Mutex<MockState>,
	requests: Mutex<Vec<ApiRequest>>,
	next_entry_id: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
	m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockClockify {
	/// Empty account (no workspaces, no projects) for the user `user_id`.
	pub fn new(user_id: &str) -> Self {
		let state = MockState {
			user: Some(User {
				id: user_id.to_owned(),
				name: "Mock User".to_owned(),
				extra: Map::new(),
			}),
			..Default::default()
		};
		Self::from_state(state)
	}

	pub fn from_state(state: MockState) -> Self {
		let next = state.entries.len() as u64 + 1;
		Self {
			state: Mutex::new(state),
			requests: Mutex::new(Vec::new()),
			next_entry_id: AtomicU64::new(next),
		}
	}

	/// One workspace with the projects the default library mapping points at.
	pub fn demo() -> Self {
		let mock = Self::new("user-demo");
		mock.add_workspace("ws-demo", "Personal");
		mock.add_project("proj-tv", "Watching TV");
		mock.add_project("proj-reading", "Reading");
		mock
	}

	pub fn load_state_file(path: &Path) -> std::io::Result<Self> {
		let content = std::fs::read_to_string(path)?;
		let state: MockState = serde_json::from_str(&content).map_err(std::io::Error::other)?;
		Ok(Self::from_state(state))
	}

	pub fn save_state_file(&self, path: &Path) -> std::io::Result<()> {
		let content = serde_json::to_string_pretty(&*lock(&self.state)).map_err(std::io::Error::other)?;
		std::fs::write(path, content)
	}

	pub fn add_workspace(&self, id: &str, name: &str) {
		lock(&self.state).workspaces.push(Workspace {
			id: id.to_owned(),
			name: name.to_owned(),
			extra: Map::new(),
		});
	}

	pub fn add_project(&self, id: &str, name: &str) {
		lock(&self.state).projects.push(Project {
			id: id.to_owned(),
			name: name.to_owned(),
			extra: Map::new(),
		});
	}

	/// Add an entry that is still being tracked; returns its id.
	pub fn add_running_entry(&self, description: &str, project_id: &str, start: &str) -> String {
		self.insert_entry(description, project_id, start, None, false)
	}

	pub fn add_finished_entry(&self, description: &str, project_id: &str, start: &str, end: &str) -> String {
		self.insert_entry(description, project_id, start, Some(end.to_owned()), false)
	}

	fn insert_entry(&self, description: &str, project_id: &str, start: &str, end: Option<String>, billable: bool) -> String {
		let id = format!("entry-{}", self.next_entry_id.fetch_add(1, Ordering::SeqCst));
		let mut state = lock(&self.state);
		let mut extra = Map::new();
		if let Some(user) = &state.user {
			extra.insert("userId".to_owned(), Value::String(user.id.clone()));
		}
		state.entries.push(TimeEntry {
			id: id.clone(),
			description: description.to_owned(),
			project_id: Some(project_id.to_owned()),
			billable,
			time_interval: TimeInterval {
				start: start.to_owned(),
				end,
				extra: Map::new(),
			},
			extra,
		});
		id
	}

	/// Answer every request matching `method` and starting with `endpoint_prefix` with `status` and `body`.
	pub fn respond_with(&self, method: Method, endpoint_prefix: &str, status: u16, body: &str) {
		lock(&self.state).responses.push(ScriptedResponse {
			method: method.to_string(),
			endpoint_prefix: endpoint_prefix.to_owned(),
			status,
			body: body.to_owned(),
		});
	}

	/// Every request received so far, oldest first.
	pub fn requests(&self) -> Vec<ApiRequest> {
		lock(&self.requests).clone()
	}

	/// Requests as `"METHOD /endpoint"`, oldest first.
	pub fn calls(&self) -> Vec<String> {
		lock(&self.requests).iter().map(|r| format!("{} {}", r.method, r.endpoint)).collect()
	}

	pub fn count(&self, call: &str) -> usize {
		self.calls().iter().filter(|c| *c == call).count()
	}

	pub fn entries(&self) -> Vec<TimeEntry> {
		lock(&self.state).entries.clone()
	}

	pub fn running_entries(&self) -> Vec<TimeEntry> {
		lock(&self.state).entries.iter().filter(|e| e.is_running()).cloned().collect()
	}

	fn route(&self, request: &ApiRequest) -> (u16, Value) {
		let segments: Vec<&str> = request.endpoint.trim_start_matches('/').split('/').collect();
		let mut state = lock(&self.state);

		match (&request.method, segments.as_slice()) {
			(&Method::GET, ["workspaces"]) => (200, json!(state.workspaces)),
			(&Method::GET, ["user"]) => match &state.user {
				Some(user) => (200, json!(user)),
				None => unauthorized(),
			},
			(&Method::GET, ["workspaces", wid, "projects"]) if state.has_workspace(wid) => (200, json!(state.projects)),
			(&Method::GET, ["workspaces", wid, "user", uid, "time-entries"]) if state.has_workspace(wid) && state.has_user(uid) => {
				let page_size = request.query_value("page-size").and_then(|v| v.parse::<usize>().ok()).unwrap_or(50);
				let hydrated = request.query_value("hydrated") == Some("true");
				let latest: Vec<Value> = state
					.entries
					.iter()
					.rev()
					.take(page_size)
					.map(|entry| {
						let mut value = json!(entry);
						if hydrated && let Some(project) = state.projects.iter().find(|p| Some(&p.id) == entry.project_id.as_ref()) {
							value["project"] = json!(project);
						}
						value
					})
					.collect();
				(200, Value::Array(latest))
			}
			(&Method::PATCH, ["workspaces", wid, "user", uid, "time-entries"]) if state.has_workspace(wid) && state.has_user(uid) => {
				let Some(end) = request.body.as_ref().and_then(|b| b.get("end")).and_then(Value::as_str) else {
					return bad_request("end is required");
				};
				match state.entries.iter_mut().rev().find(|e| e.is_running()) {
					Some(entry) => {
						entry.time_interval.end = Some(end.to_owned());
						(200, json!(entry))
					}
					None => (404, json!({"message": "No running time entry found", "code": 404})),
				}
			}
			(&Method::POST, ["workspaces", wid, "time-entries"]) if state.has_workspace(wid) => {
				let Some(body) = request.body.as_ref() else {
					return bad_request("body is required");
				};
				let Some(start) = body.get("start").and_then(Value::as_str) else {
					return bad_request("start is required");
				};
				let description = body.get("description").and_then(Value::as_str).unwrap_or_default().to_owned();
				let project_id = body.get("projectId").and_then(Value::as_str).unwrap_or_default().to_owned();
				let billable = body.get("billable").and_then(Value::as_bool).unwrap_or(false);
				let start = start.to_owned();
				drop(state);

				let id = self.insert_entry(&description, &project_id, &start, None, billable);
				let state = lock(&self.state);
				let created = state.entries.iter().find(|e| e.id == id).map(|e| json!(e)).unwrap_or(Value::Null);
				(201, created)
			}
			_ => (404, json!({"message": format!("{} {} not found", request.method, request.endpoint), "code": 404})),
		}
	}
}

fn unauthorized() -> (u16, Value) {
	(401, json!({"message": "Full authentication is required to access this resource", "code": 1000}))
}

fn bad_request(message: &str) -> (u16, Value) {
	(400, json!({"message": message, "code": 400}))
}

impl Transport for MockClockify {
	fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClockifyError> {
		let call = format!("{} {}", request.method, request.endpoint);
		tracing::info!(target: "mock_clockify", method = %request.method, endpoint = %request.endpoint, "{call}");
		lock(&self.requests).push(request.clone());

		let scripted = lock(&self.state).responses.iter().find(|s| s.matches(request)).cloned();
		if let Some(s) = scripted {
			return Ok(ApiResponse::new(s.status, s.body));
		}

		let (status, body) = self.route(request);
		Ok(ApiResponse::new(status, body.to_string()))
	}
}
