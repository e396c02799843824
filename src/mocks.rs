use std::cell::Cell;

use jiff::Timestamp;
use tracing::instrument;

thread_local! {
	static FROZEN_NOW: Cell<Option<Timestamp>> = const { Cell::new(None) };
}

/// Stand-in for [`Timestamp`] in unit tests; returns the frozen instant when one is set.
pub struct MockClock;

impl MockClock {
	#[instrument(name = "MockClock::now")]
	pub fn now() -> Timestamp {
		let frozen = FROZEN_NOW.with(|ts| ts.get());
		tracing::debug!(?frozen, "reading mock clock");
		frozen.unwrap_or_else(Timestamp::now)
	}
}

/// Freeze the clock for the current thread.
#[instrument]
pub fn freeze(timestamp: Timestamp) {
	FROZEN_NOW.with(|ts| ts.set(Some(timestamp)));
}

/// Go back to the system clock for the current thread.
pub fn unfreeze() {
	FROZEN_NOW.with(|ts| ts.set(None));
}
