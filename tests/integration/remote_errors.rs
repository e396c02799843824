use plex_clockify::{ClockifyClient, ClockifyError, ConfigError, Settings, mock_clockify::MockClockify};
use reqwest::Method;
use rstest::rstest;

use crate::common::settings;

#[rstest]
#[case(Method::GET, "/workspaces", 404)]
#[case(Method::GET, "/workspaces", 500)]
#[case(Method::GET, "/user", 404)]
#[case(Method::GET, "/user", 500)]
#[case(Method::GET, "/workspaces/ws-demo/user/user-demo/time-entries", 404)]
#[case(Method::GET, "/workspaces/ws-demo/user/user-demo/time-entries", 500)]
#[case(Method::PATCH, "/workspaces/ws-demo/user/user-demo/time-entries", 404)]
#[case(Method::PATCH, "/workspaces/ws-demo/user/user-demo/time-entries", 500)]
#[case(Method::POST, "/workspaces/ws-demo/time-entries", 404)]
#[case(Method::POST, "/workspaces/ws-demo/time-entries", 500)]
fn test_start_aborts_on_first_failure(#[case] method: Method, #[case] endpoint: &str, #[case] status: u16) {
	let mock = MockClockify::demo();
	mock.add_running_entry("Watching Y", "proj-tv", "2024-05-29T20:00:00Z");
	mock.respond_with(method.clone(), endpoint, status, r#"{"message":"failure","code":0}"#);
	let client = ClockifyClient::with_transport(&settings(None), &mock).unwrap();

	let err = client.start_timer("Watching X", "proj-tv").unwrap_err();
	match &err {
		ClockifyError::RemoteApi { status: s, body } => {
			assert_eq!(*s, status);
			assert_eq!(body, r#"{"message":"failure","code":0}"#);
		}
		other => panic!("expected a remote API error, got {other:?}"),
	}

	let failed = format!("{method} {endpoint}");
	assert_eq!(mock.calls().last(), Some(&failed), "no calls after the failing one");
	assert_eq!(mock.count(&failed), 1);
}

#[test]
fn test_projects_failure_surfaces_status() {
	let mock = MockClockify::demo();
	mock.respond_with(Method::GET, "/workspaces/ws-demo/projects", 403, "forbidden");
	let client = ClockifyClient::with_transport(&settings(None), &mock).unwrap();

	let err = client.get_projects(Some("Watching TV")).unwrap_err();
	assert_eq!(err.status(), Some(403));
	assert_eq!(err.to_string(), "Clockify response was: [403] forbidden");
	// the workspace stays cached for the next call
	assert_eq!(client.get_workspace().unwrap().id, "ws-demo");
	assert_eq!(mock.count("GET /workspaces"), 1);
}

#[test]
fn test_failed_workspace_lookup_is_retried_by_next_call() {
	let mock = MockClockify::demo();
	mock.respond_with(Method::GET, "/workspaces", 503, "down");
	let client = ClockifyClient::with_transport(&settings(None), &mock).unwrap();

	assert!(client.get_workspace().is_err());
	assert!(client.get_workspace().is_err());
	assert_eq!(mock.count("GET /workspaces"), 2);
}

#[test]
fn test_missing_api_key_makes_no_calls() {
	let mock = MockClockify::demo();
	let mut settings = Settings::default();
	settings.configure("   ", "alice", None);

	let err = ClockifyClient::with_transport(&settings, &mock).err().unwrap();
	assert!(matches!(err, ClockifyError::Config(ConfigError::MissingSetting { .. })), "{err:?}");
	assert!(mock.calls().is_empty());
}

#[test]
fn test_unknown_user_is_unauthorized() {
	let mock = MockClockify::demo();
	mock.respond_with(Method::GET, "/user", 401, "Full authentication is required to access this resource");
	let client = ClockifyClient::with_transport(&settings(None), &mock).unwrap();

	assert_eq!(client.get_running_timer().unwrap_err().status(), Some(401));
	assert!(mock.running_entries().is_empty());
}
