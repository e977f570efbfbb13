// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh coordination and replays.
#[derive(Debug, Default)]
pub struct GateMetrics {
	started: AtomicU64,
	joined: AtomicU64,
	succeeded: AtomicU64,
	failed: AtomicU64,
	replays: AtomicU64,
}
impl GateMetrics {
	/// Returns the number of refresh operations started (one per contention window).
	pub fn refreshes_started(&self) -> u64 {
		self.started.load(Ordering::Relaxed)
	}

	/// Returns how many unauthorized requests attached to a refresh already in flight.
	pub fn refreshes_joined(&self) -> u64 {
		self.joined.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh operations that settled successfully.
	pub fn refreshes_succeeded(&self) -> u64 {
		self.succeeded.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh operations that failed.
	pub fn refreshes_failed(&self) -> u64 {
		self.failed.load(Ordering::Relaxed)
	}

	/// Returns the number of requests replayed after a successful refresh.
	pub fn replays(&self) -> u64 {
		self.replays.load(Ordering::Relaxed)
	}

	pub(crate) fn record_started(&self) {
		self.started.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_joined(&self) {
		self.joined.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_succeeded(&self) {
		self.succeeded.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failed(&self) {
		self.failed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_replay(&self) {
		self.replays.fetch_add(1, Ordering::Relaxed);
	}
}
