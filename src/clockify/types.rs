//! Entities exchanged with the Clockify API.
//!
//! Only the fields the tracker reads are typed; everything else lands in `extra` untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Workspace {
	pub id: String,
	pub name: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Project {
	pub id: String,
	pub name: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TimeInterval {
	pub start: String,
	pub end: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
	pub id: String,
	#[serde(default)]
	pub description: String,
	pub project_id: Option<String>,
	#[serde(default)]
	pub billable: bool,
	pub time_interval: TimeInterval,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl TimeEntry {
	/// An entry without an end time is the one currently being tracked.
	pub fn is_running(&self) -> bool {
		self.time_interval.end.is_none()
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewTimeEntry<'a> {
	pub start: String,
	pub description: &'a str,
	pub project_id: &'a str,
	pub billable: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct StopTimeEntry {
	pub end: String,
}
