//! Request gatekeeper: single-flight session refresh with exactly-once replay.
//!
//! Every call goes through [`Gatekeeper::send`]. When the backend answers `401`, the
//! gatekeeper either starts a session refresh (if none is running) or attaches to the one in
//! flight, waits for it to settle, and replays the original request once. A burst of
//! concurrent `401`s therefore costs exactly one refresh call. A replay that is rejected again
//! surfaces [`Error::Unauthorized`] instead of looping, and a failed refresh invalidates the
//! local session and fails every waiter with the same [`Error::RefreshFailed`] cause.
//!
//! The shared state is a [`RefreshState`] behind a synchronous mutex. The mutex is only held
//! to read or swap the state, never across an `.await`, so the check-then-start transition is
//! atomic with respect to every other caller regardless of executor.

mod metrics;

pub use metrics::GateMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	http::{self, ApiRequest, ApiResponse, RefreshPolicy, Transport},
	obs::{self, OpKind, RefreshEvent},
	session::{LocalSession, Session, SessionError, SessionService},
};

type RefreshOutcome = std::result::Result<Session, Arc<SessionError>>;

/// Per-call replay context threaded through the send loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Attempt {
	/// First execution of the logical request.
	Initial,
	/// The single replay issued after a successful refresh.
	Replayed,
}

/// Observable snapshot of the gatekeeper's refresh coordination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshStatus {
	/// No refresh is running.
	Idle,
	/// A refresh is running; the value identifies the flight.
	Refreshing(u64),
}

/// One in-flight refresh shared by every request that joins it.
#[derive(Debug)]
struct RefreshFlight {
	id: u64,
	outcome: AsyncOnceCell<RefreshOutcome>,
}

#[derive(Debug, Default)]
enum RefreshState {
	#[default]
	Idle,
	Refreshing(Arc<RefreshFlight>),
}

/// Wraps a [`Transport`] so `401` answers trigger one shared session refresh and a single
/// replay per request.
///
/// Clones share the same refresh state, metrics, and local session, so one gatekeeper (or
/// any number of its clones) coordinates all traffic of a client.
pub struct Gatekeeper<T>
where
	T: ?Sized + Transport,
{
	transport: Arc<T>,
	sessions: Arc<dyn SessionService>,
	local: Arc<LocalSession>,
	state: Arc<Mutex<RefreshState>>,
	next_flight: Arc<AtomicU64>,
	metrics: Arc<GateMetrics>,
}
impl<T> Gatekeeper<T>
where
	T: ?Sized + Transport,
{
	/// Creates a gatekeeper over `transport` that renews credentials through `sessions` and
	/// invalidates `local` when renewal fails.
	pub fn new(
		transport: impl Into<Arc<T>>,
		sessions: Arc<dyn SessionService>,
		local: Arc<LocalSession>,
	) -> Self {
		Self {
			transport: transport.into(),
			sessions,
			local,
			state: Default::default(),
			next_flight: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Transport every attempt is executed on.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Local session invalidated by failed refreshes.
	pub fn local_session(&self) -> &Arc<LocalSession> {
		&self.local
	}

	/// Refresh and replay counters.
	pub fn metrics(&self) -> &GateMetrics {
		&self.metrics
	}

	/// Current refresh coordination state.
	pub fn status(&self) -> RefreshStatus {
		match &*self.state.lock() {
			RefreshState::Idle => RefreshStatus::Idle,
			RefreshState::Refreshing(flight) => RefreshStatus::Refreshing(flight.id),
		}
	}

	/// Performs `request`, refreshing the session and replaying once on `401`.
	///
	/// Responses other than `401` are returned unmodified whatever their status, as are `401`s
	/// for requests built with [`ApiRequest::without_refresh`]. Transport failures propagate
	/// as [`Error::Transport`] and never trigger a refresh.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		obs::observe(OpKind::Send, "send", self.send_with(&request, Attempt::Initial)).await
	}

	async fn send_with(&self, request: &ApiRequest, mut attempt: Attempt) -> Result<ApiResponse> {
		loop {
			let response = self.transport.execute(request).await?;

			if !http::is_unauthorized(&response)
				|| request.refresh_policy() == RefreshPolicy::PassThrough
			{
				return Ok(response);
			}

			match attempt {
				Attempt::Initial => {
					self.await_refresh().await?;
					self.metrics.record_replay();

					attempt = Attempt::Replayed;
				},
				Attempt::Replayed =>
					return Err(Error::Unauthorized {
						method: request.method().clone(),
						url: request.url().clone(),
					}),
			}
		}
	}

	/// Joins the refresh in flight, or starts one when idle, and waits for it to settle.
	async fn await_refresh(&self) -> Result<Session> {
		let flight = self.join_or_start();
		let outcome = flight.outcome.get_or_init(|| self.run_refresh(&flight)).await;

		outcome.clone().map_err(Error::RefreshFailed)
	}

	fn join_or_start(&self) -> Arc<RefreshFlight> {
		let mut state = self.state.lock();

		match &*state {
			RefreshState::Refreshing(flight) => {
				self.metrics.record_joined();
				obs::record_refresh_event(RefreshEvent::Joined, flight.id);

				flight.clone()
			},
			RefreshState::Idle => {
				let flight = Arc::new(RefreshFlight {
					id: self.next_flight.fetch_add(1, Ordering::Relaxed),
					outcome: AsyncOnceCell::new(),
				});

				*state = RefreshState::Refreshing(flight.clone());

				self.metrics.record_started();
				obs::record_refresh_event(RefreshEvent::Started, flight.id);

				flight
			},
		}
	}

	/// Body of a flight; the once-cell guarantees it runs to completion at most once.
	async fn run_refresh(&self, flight: &Arc<RefreshFlight>) -> RefreshOutcome {
		let outcome = obs::observe(OpKind::Refresh, "run_refresh", self.sessions.refresh())
			.await
			.map_err(Arc::new);

		{
			let mut state = self.state.lock();

			if matches!(&*state, RefreshState::Refreshing(current) if Arc::ptr_eq(current, flight))
			{
				*state = RefreshState::Idle;
			}
		}

		match &outcome {
			Ok(session) => {
				self.local.renewed(session.clone());
				self.metrics.record_succeeded();
				obs::record_refresh_event(RefreshEvent::Succeeded, flight.id);
			},
			Err(_) => {
				self.local.invalidate();
				self.metrics.record_failed();
				obs::record_refresh_event(RefreshEvent::Failed, flight.id);
			},
		}

		outcome
	}
}
impl<T> Clone for Gatekeeper<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			sessions: self.sessions.clone(),
			local: self.local.clone(),
			state: self.state.clone(),
			next_flight: self.next_flight.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<T> Debug for Gatekeeper<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gatekeeper")
			.field("status", &self.status())
			.field("metrics", &self.metrics)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::test_url, error::TransportError, http::TransportFuture, session::SessionFuture,
	};

	struct StatusTransport(u16);
	impl Transport for StatusTransport {
		fn execute<'a>(&'a self, _request: &'a ApiRequest) -> TransportFuture<'a> {
			let status = self.0;

			Box::pin(async move {
				let mut response = ApiResponse::new(Vec::new());

				*response.status_mut() =
					StatusCode::from_u16(status).expect("Status fixture should be valid.");

				Ok::<_, TransportError>(response)
			})
		}
	}

	struct RejectingSessions;
	impl SessionService for RejectingSessions {
		fn refresh(&self) -> SessionFuture<'_, Session> {
			Box::pin(async {
				Err(SessionError::Rejected { status: 401, message: "refresh expired".into() })
			})
		}
	}

	fn gate(status: u16) -> Gatekeeper<StatusTransport> {
		Gatekeeper::new(
			StatusTransport(status),
			Arc::new(RejectingSessions),
			Arc::new(LocalSession::default()),
		)
	}

	fn request() -> ApiRequest {
		ApiRequest::get(test_url("/api/cart"))
	}

	#[tokio::test]
	async fn non_unauthorized_statuses_pass_through() {
		let gate = gate(500);
		let response = gate.send(request()).await.expect("Server errors should pass through.");

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(gate.metrics().refreshes_started(), 0);
		assert_eq!(gate.status(), RefreshStatus::Idle);
	}

	#[tokio::test]
	async fn pass_through_requests_keep_their_401() {
		let gate = gate(401);
		let response = gate
			.send(request().without_refresh())
			.await
			.expect("Pass-through requests should return the raw 401.");

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(gate.metrics().refreshes_started(), 0);
	}

	#[tokio::test]
	async fn failed_flights_reset_state_and_number_the_next_one() {
		let gate = gate(401);

		for _ in 0..2 {
			let err = gate.send(request()).await.expect_err("Rejected refresh should fail.");

			assert!(matches!(err, Error::RefreshFailed(_)));
			assert_eq!(gate.status(), RefreshStatus::Idle);
		}

		assert_eq!(gate.metrics().refreshes_started(), 2);
		assert_eq!(gate.metrics().refreshes_failed(), 2);
		assert_eq!(gate.next_flight.load(Ordering::Relaxed), 2);
		assert_eq!(gate.local_session().invalidations(), 2);
	}
}
