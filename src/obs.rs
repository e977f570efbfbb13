//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `storefront_client.op` with the `op`
//!   (operation) and `stage` (call site) fields, plus events when a session refresh starts,
//!   is joined, or fails.
//! - Enable `metrics` to increment the `storefront_client_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`, and the
//!   `storefront_client_refresh_total` counter for every refresh lifecycle point, labeled by
//!   `event`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Client operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Request routed through the gatekeeper.
	Send,
	/// Shared session refresh.
	Refresh,
	/// Account creation.
	Signup,
	/// Credential exchange.
	Login,
	/// Session teardown.
	Logout,
	/// Profile lookup used to restore a session.
	CheckAuth,
	/// Product listing or administration.
	Catalog,
	/// Cart read or mutation.
	Cart,
	/// Coupon lookup or validation.
	Coupon,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Send => "send",
			OpKind::Refresh => "refresh",
			OpKind::Signup => "signup",
			OpKind::Login => "login",
			OpKind::Logout => "logout",
			OpKind::CheckAuth => "check_auth",
			OpKind::Catalog => "catalog",
			OpKind::Cart => "cart",
			OpKind::Coupon => "coupon",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Lifecycle points of a shared session refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshEvent {
	/// A request saw `401` while idle and started a refresh.
	Started,
	/// A request saw `401` while a refresh was in flight and attached to it.
	Joined,
	/// The refresh succeeded.
	Succeeded,
	/// The refresh failed and the local session was invalidated.
	Failed,
}
impl RefreshEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshEvent::Started => "started",
			RefreshEvent::Joined => "joined",
			RefreshEvent::Succeeded => "succeeded",
			RefreshEvent::Failed => "failed",
		}
	}
}
impl Display for RefreshEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a refresh lifecycle point on every enabled backend.
pub fn record_refresh_event(event: RefreshEvent, flight: u64) {
	trace_refresh_event(event, flight);
	record_refresh_metric(event);
}

/// Runs `fut` inside an [`OpSpan`] and records attempt plus success/failure outcomes.
pub(crate) async fn observe<T, E, Fut>(kind: OpKind, stage: &'static str, fut: Fut) -> Result<T, E>
where
	Fut: Future<Output = Result<T, E>>,
{
	let span = OpSpan::new(kind, stage);

	record_op_outcome(kind, OpOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_op_outcome(kind, OpOutcome::Success),
		Err(_) => record_op_outcome(kind, OpOutcome::Failure),
	}

	result
}
