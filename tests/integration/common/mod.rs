//! Shared test infrastructure for integration tests.
//!
//! Provides `TestContext`, which owns a temp directory holding:
//! - the settings file passed through `--config`
//! - the mock Clockify state shared by consecutive `--mock` runs
//! - the JSON trace file the binary writes when `PLEX_CLOCKIFY_TRACE_FILE` is set
//!
//! # Example
//!
//! ```ignore
//! let ctx = TestContext::new(r#"clockify_api_key = "test-key""#);
//! let (status, stdout, stderr) = ctx.run(&["status"]);
//! assert!(status.success());
//! ```

use std::{
	ffi::OsStr,
	io::Write as _,
	path::PathBuf,
	process::{Command, ExitStatus, Stdio},
};

use plex_clockify::{
	LibraryMapping, Settings,
	mock_clockify::{MockClockify, MockState},
};
use tempfile::TempDir;

pub static DEFAULT_CONFIG: &str = r#"
clockify_api_key = "test-key"
plex_username = "alice"
"#;

/// Settings with an API key, `alice` as the tracked account and the given mapping (default when `None`).
pub fn settings(mapping: Option<Vec<LibraryMapping>>) -> Settings {
	let mut settings = Settings::default();
	settings.configure("test-key", "alice", mapping);
	settings
}

pub struct TestContext {
	pub dir: TempDir,
	pub config_path: PathBuf,
	pub mock_state_path: PathBuf,
	pub trace_path: PathBuf,
}

impl TestContext {
	/// Create a context whose settings file holds `config` (TOML).
	pub fn new(config: &str) -> Self {
		let dir = tempfile::tempdir().unwrap();
		let config_path = dir.path().join("config.toml");
		std::fs::write(&config_path, config).unwrap();

		let mock_state_path = dir.path().join("mock_state.json");
		let trace_path = dir.path().join("trace.jsonl");
		Self {
			dir,
			config_path,
			mock_state_path,
			trace_path,
		}
	}

	fn command(&self, args: &[&str]) -> Command {
		let mut cmd = Command::new(env!("CARGO_BIN_EXE_plex_clockify"));
		cmd.arg("--mock").arg("--config").arg(&self.config_path).args(args);
		cmd.env("PLEX_CLOCKIFY_MOCK_STATE", &self.mock_state_path);
		cmd.env("PLEX_CLOCKIFY_TRACE_FILE", &self.trace_path);
		cmd.env_remove("PLEX_CLOCKIFY_CLOCKIFY_API_KEY");
		cmd.env_remove("PLEX_CLOCKIFY_PLEX_USERNAME");
		cmd.env("NO_COLOR", "1");
		cmd.env("RUST_LOG", "info");
		cmd
	}

	/// Run the binary in `--mock` mode.
	///
	/// Returns (exit_status, stdout, stderr) for easy assertions.
	pub fn run(&self, args: &[&str]) -> (ExitStatus, String, String) {
		let output = self.command(args).output().unwrap();
		(
			output.status,
			String::from_utf8_lossy(&output.stdout).into_owned(),
			String::from_utf8_lossy(&output.stderr).into_owned(),
		)
	}

	/// Like [`run`](Self::run), with extra environment variables.
	pub fn run_with_env(&self, args: &[&str], vars: &[(&str, &OsStr)]) -> (ExitStatus, String, String) {
		let mut cmd = self.command(args);
		cmd.envs(vars.iter().copied());
		let output = cmd.output().unwrap();
		(
			output.status,
			String::from_utf8_lossy(&output.stdout).into_owned(),
			String::from_utf8_lossy(&output.stderr).into_owned(),
		)
	}

	/// Seed the mock Clockify state the next `--mock` run starts from.
	pub fn seed_mock(&self, mock: &MockClockify) {
		mock.save_state_file(&self.mock_state_path).unwrap();
	}

	/// Like [`run`](Self::run), with `stdin` piped into the process.
	pub fn run_with_stdin(&self, args: &[&str], stdin: &str) -> (ExitStatus, String, String) {
		let mut cmd = self.command(args);
		cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

		let mut child = cmd.spawn().unwrap();
		child.stdin.take().unwrap().write_all(stdin.as_bytes()).unwrap();
		let output = child.wait_with_output().unwrap();
		(
			output.status,
			String::from_utf8_lossy(&output.stdout).into_owned(),
			String::from_utf8_lossy(&output.stderr).into_owned(),
		)
	}

	/// Mock Clockify state as left by the last `--mock` run.
	pub fn mock_state(&self) -> MockState {
		let content = std::fs::read_to_string(&self.mock_state_path).unwrap();
		serde_json::from_str(&content).unwrap()
	}

	pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
		let path = self.dir.path().join(name);
		std::fs::write(&path, content).unwrap();
		path
	}
}

/// A Plex webhook payload for an episode of Severance in the "TV Shows" library.
pub fn episode_payload(event: &str, account: &str) -> String {
	serde_json::json!({
		"event": event,
		"user": true,
		"owner": true,
		"Account": {"id": 1, "title": account},
		"Server": {"title": "nas", "uuid": "54664a3d8acc39983675640ec9ce00b70af9cc36"},
		"Player": {"local": true, "title": "Living Room"},
		"Metadata": {
			"librarySectionType": "show",
			"librarySectionTitle": "TV Shows",
			"type": "episode",
			"title": "Good News About Hell",
			"grandparentTitle": "Severance",
			"index": 1,
			"parentIndex": 1
		}
	})
	.to_string()
}

/// A Plex webhook payload for a movie in `library`.
pub fn movie_payload(event: &str, account: &str, library: &str, title: &str) -> String {
	serde_json::json!({
		"event": event,
		"Account": {"title": account},
		"Metadata": {"librarySectionTitle": library, "type": "movie", "title": title}
	})
	.to_string()
}
