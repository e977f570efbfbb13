//! Session collaborators: the service that renews credentials and the local session holder
//! that a failed renewal invalidates.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	error::{DecodeError, TransportError},
	http::{self, ApiRequest, Transport},
};

/// Boxed future returned by [`SessionService`] operations.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SessionError>> + 'a + Send>>;

/// Failure reported by a [`SessionService`].
#[derive(Debug, ThisError)]
pub enum SessionError {
	/// The renewal credential was missing, expired, or revoked.
	#[error("Session service rejected the refresh with status {status}: {message}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Backend-supplied message, or a generic fallback.
		message: String,
	},
	/// Refresh call never produced a response.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Refresh response body was malformed.
	#[error(transparent)]
	Decode(#[from] DecodeError),
}

/// Result of a successful credential renewal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
	/// Instant the renewal completed.
	pub refreshed_at: OffsetDateTime,
	/// Informational message returned by the backend.
	pub notice: Option<String>,
}
impl Session {
	/// Creates a session stamped with the current time.
	pub fn now() -> Self {
		Self { refreshed_at: OffsetDateTime::now_utc(), notice: None }
	}

	/// Attaches the backend's informational message.
	pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
		self.notice = Some(notice.into());

		self
	}
}

/// Issues fresh short-lived credentials from the renewal credential.
///
/// Both credentials travel out-of-band, so a successful [`refresh`](SessionService::refresh)
/// only needs to report that renewal happened; the transport picks up the rotated
/// credentials on its next call.
pub trait SessionService
where
	Self: Send + Sync,
{
	/// Exchanges the renewal credential for a new short-lived credential.
	fn refresh(&self) -> SessionFuture<'_, Session>;
}

/// [`SessionService`] that calls the backend's refresh route directly on a transport.
///
/// The call bypasses the gatekeeper: a rejected refresh is the end of the line, never a
/// reason to refresh again.
pub struct HttpSessionService<T>
where
	T: ?Sized + Transport,
{
	transport: Arc<T>,
	endpoint: Url,
}
impl<T> HttpSessionService<T>
where
	T: ?Sized + Transport,
{
	/// Creates a service that posts to `endpoint` through `transport`.
	pub fn new(transport: impl Into<Arc<T>>, endpoint: Url) -> Self {
		Self { transport: transport.into(), endpoint }
	}
}
impl<T> SessionService for HttpSessionService<T>
where
	T: ?Sized + Transport,
{
	fn refresh(&self) -> SessionFuture<'_, Session> {
		Box::pin(async move {
			#[derive(Deserialize)]
			struct RefreshBody {
				message: Option<String>,
			}

			let request = ApiRequest::post(self.endpoint.clone()).without_refresh();
			let response = self.transport.execute(&request).await?;

			if !response.status().is_success() {
				return Err(SessionError::Rejected {
					status: response.status().as_u16(),
					message: http::error_message(&response)
						.unwrap_or_else(|| "Session refresh was rejected".into()),
				});
			}

			let session = Session::now();

			if response.body().is_empty() {
				return Ok(session);
			}

			let body: RefreshBody = http::decode_json(&self.endpoint, &response)?;

			Ok(match body.message {
				Some(message) => session.with_notice(message),
				None => session,
			})
		})
	}
}
impl<T> Debug for HttpSessionService<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpSessionService").field("endpoint", &self.endpoint.as_str()).finish()
	}
}

/// Storefront account role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Regular shopper.
	#[default]
	Customer,
	/// Store administrator.
	Admin,
}

/// Signed-in user as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Backend-assigned identifier.
	#[serde(rename = "_id")]
	pub id: String,
	/// Display name.
	pub name: String,
	/// Login email.
	pub email: String,
	/// Account role.
	#[serde(default)]
	pub role: Role,
}
impl UserProfile {
	/// Returns `true` for administrators.
	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}
}

#[derive(Debug, Default)]
struct LocalSessionState {
	user: Option<UserProfile>,
	session: Option<Session>,
}

/// Client-side view of the current session.
///
/// The gatekeeper calls [`invalidate`](LocalSession::invalidate) when a shared refresh fails,
/// which is the forced-logout path; [`clear`](LocalSession::clear) is the voluntary one.
#[derive(Debug, Default)]
pub struct LocalSession {
	state: RwLock<LocalSessionState>,
	invalidations: AtomicU64,
}
impl LocalSession {
	/// Currently signed-in user, if any.
	pub fn user(&self) -> Option<UserProfile> {
		self.state.read().user.clone()
	}

	/// Most recent successful renewal, if any.
	pub fn session(&self) -> Option<Session> {
		self.state.read().session.clone()
	}

	/// Returns `true` while a user is signed in.
	pub fn is_signed_in(&self) -> bool {
		self.state.read().user.is_some()
	}

	/// Number of forced invalidations observed so far.
	pub fn invalidations(&self) -> u64 {
		self.invalidations.load(Ordering::Relaxed)
	}

	/// Records the signed-in user.
	pub fn sign_in(&self, user: UserProfile) {
		self.state.write().user = Some(user);
	}

	/// Records a successful renewal.
	pub fn renewed(&self, session: Session) {
		self.state.write().session = Some(session);
	}

	/// Drops all local session state after a voluntary logout.
	pub fn clear(&self) {
		let mut state = self.state.write();

		state.user = None;
		state.session = None;
	}

	/// Drops all local session state because the credentials can no longer be renewed.
	pub fn invalidate(&self) {
		self.clear();
		self.invalidations.fetch_add(1, Ordering::Relaxed);
	}
}
