//! Track Plex viewing time in Clockify.
//!
//! - `clockify`: API client that keeps at most one timer running
//! - `config`: recognized settings (API key, Plex username, library mapping)
//! - `tracker`: maps Plex playback events onto timer starts and stops
//! - `mock_clockify`: in-memory Clockify for tests and `--mock` runs

pub mod clockify;
pub mod config;
pub mod error;
pub mod logging;
pub mod mock_clockify;
#[cfg(test)]
mod mocks;
pub mod tracker;

pub use clockify::{ClockifyClient, Project, TimeEntry, Transport, Workspace};
pub use config::{LibraryMapping, SettingKey, SettingValue, Settings};
pub use error::{ClockifyError, ConfigError, WebhookError};
pub use tracker::{Outcome, PlaybackSignal, PlexEvent, Tracker};
