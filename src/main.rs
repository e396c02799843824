use std::{io::Read as _, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, bail};
use plex_clockify::{
	ClockifyClient, Outcome, PlexEvent, Settings, TimeEntry, Tracker, Transport,
	mock_clockify::{MOCK_STATE_ENV, MockClockify},
};

#[derive(Debug, Parser)]
#[command(author, version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"), about, long_about = None)]
struct Cli {
	/// Settings file (defaults to $XDG_CONFIG_HOME/plex_clockify/config.toml)
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Talk to an in-memory Clockify instead of the real API
	#[arg(long, global = true)]
	mock: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Show the workspace time is tracked in
	Workspace,
	/// List projects in the workspace
	Projects {
		/// Only show the project with exactly this name
		#[arg(short, long)]
		name: Option<String>,
	},
	/// Show the running time entry
	Status,
	/// Start a new time entry, stopping the running one
	Start(StartArgs),
	/// Stop the running time entry
	Stop,
	/// Handle a Plex webhook payload (JSON) read from FILE or stdin
	HandleEvent {
		file: Option<PathBuf>,
	},
	/// Print a setting (clockify_api_key, plex_username or mapping)
	Config {
		key: String,
	},
}

#[derive(Args, Debug)]
struct StartArgs {
	/// Description for the time entry
	description: String,

	/// Project name (an exact match wins) or ID
	#[arg(short = 'p', long)]
	project: String,
}

fn main() -> Result<()> {
	color_eyre::install()?;
	plex_clockify::logging::init().wrap_err("Failed to set up logging")?;
	let cli = Cli::parse();

	let settings = Settings::load(cli.config.as_deref()).wrap_err("Failed to load settings")?;

	if let Command::Config { key } = &cli.command {
		return print_setting(&settings, key);
	}

	if cli.mock {
		let state_path = std::env::var_os(MOCK_STATE_ENV).map(PathBuf::from);
		let mock = match &state_path {
			Some(path) if path.exists() => MockClockify::load_state_file(path).wrap_err_with(|| format!("Failed to read mock state from {}", path.display()))?,
			_ => MockClockify::demo(),
		};
		let client = ClockifyClient::with_transport(&settings, &mock)?;
		// writes made before a failing call are kept
		let outcome = run(cli.command, settings, client);
		if let Some(path) = state_path {
			mock.save_state_file(&path).wrap_err_with(|| format!("Failed to write mock state to {}", path.display()))?;
		}
		return outcome;
	}

	let client = ClockifyClient::new(&settings)?;
	run(cli.command, settings, client)
}

fn run<T: Transport>(command: Command, settings: Settings, client: ClockifyClient<T>) -> Result<()> {
	match command {
		Command::Workspace => {
			let workspace = client.get_workspace()?;
			println!("{} - {}", workspace.id, workspace.name);
		}
		Command::Projects { name } => {
			let projects = client.get_projects(name.as_deref())?;
			if projects.is_empty() {
				bail!("Project not found: {}", name.unwrap_or_default());
			}
			for project in projects {
				println!("  {} - {}", project.id, project.name);
			}
		}
		Command::Status => match client.get_running_timer()? {
			Some(entry) => print_entry("Running entry:", &entry),
			None => println!("No running timer"),
		},
		Command::Start(args) => {
			let project_id = match client.find_project(&args.project)? {
				Some(project) => project.id,
				None if looks_like_id(&args.project) => args.project,
				None => bail!("Project not found: {}", args.project),
			};
			let created = client.start_timer(&args.description, &project_id)?;
			print_entry("Started entry:", &created);
		}
		Command::Stop => match client.stop_timer()? {
			Some(entry) => print_entry("Stopped entry:", &entry),
			None => println!("No running time entry found - already stopped"),
		},
		Command::HandleEvent { file } => {
			let payload = match &file {
				Some(path) => std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?,
				None => {
					let mut buf = String::new();
					std::io::stdin().read_to_string(&mut buf).wrap_err("Failed to read payload from stdin")?;
					buf
				}
			};

			let Some(event) = PlexEvent::from_webhook_json(&payload)? else {
				println!("Ignored: event does not affect tracking");
				return Ok(());
			};

			let tracker = Tracker::new(settings, client);
			match tracker.handle(&event)? {
				Outcome::Started(entry) => print_entry("Started entry:", &entry),
				Outcome::Stopped(Some(entry)) => print_entry("Stopped entry:", &entry),
				Outcome::Stopped(None) => println!("No running time entry found - already stopped"),
				Outcome::Ignored(reason) => println!("Ignored: {reason}"),
				Outcome::UnknownProject(name) => bail!("Project not found: {name}"),
			}
		}
		Command::Config { key } => print_setting(&settings, &key)?,
	}
	Ok(())
}

fn print_setting(settings: &Settings, key: &str) -> Result<()> {
	let value = settings.get(key)?;
	if let Some(text) = value.as_text() {
		println!("{text}");
	}
	for mapping in value.as_mapping().unwrap_or_default() {
		println!("{} -> {}", mapping.libraries.join(", "), mapping.project);
	}
	Ok(())
}

fn print_entry(header: &str, entry: &TimeEntry) {
	println!("{header}");
	println!("  id: {}", entry.id);
	println!("  description: {}", entry.description);
	println!("  start: {}", entry.time_interval.start);
	println!("  end: {}", entry.time_interval.end.as_deref().unwrap_or("<running>"));
	println!("  project: {}", entry.project_id.as_deref().unwrap_or("<none>"));
}

fn looks_like_id(s: &str) -> bool {
	// Clockify IDs are 24-char hex
	s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit())
}
