//! Storefront API client layered on the request gatekeeper.
//!
//! Account operations live here; catalog, cart and coupon calls extend
//! [`StorefrontClient`] from their own modules.

// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	gate::Gatekeeper,
	http::{self, ApiRequest, ApiResponse, Transport},
	obs::{self, OpKind},
	session::{HttpSessionService, LocalSession, SessionService, UserProfile},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

const GENERIC_FAILURE: &str = "Something went wrong";

/// Account creation form.
#[derive(Clone, Debug)]
pub struct SignupForm {
	/// Display name.
	pub name: String,
	/// Login email.
	pub email: String,
	/// Chosen password.
	pub password: String,
	/// Must equal `password`; checked before any request is made.
	pub confirm_password: String,
}

#[derive(Serialize)]
struct SignupBody<'a> {
	name: &'a str,
	email: &'a str,
	password: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
	email: &'a str,
	password: &'a str,
}

#[derive(Deserialize)]
struct UserEnvelope {
	user: UserProfile,
}

/// Storefront API client: typed account, catalog, cart and coupon operations plus a
/// gatekeeper-guarded [`send`](Self::send) for any other endpoint.
pub struct StorefrontClient<T>
where
	T: ?Sized + Transport,
{
	config: ClientConfig,
	gate: Gatekeeper<T>,
}
impl<T> StorefrontClient<T>
where
	T: ?Sized + Transport,
{
	/// Creates a client over a caller-provided transport, refreshing sessions through the
	/// configured refresh route on that same transport.
	pub fn with_transport(config: ClientConfig, transport: impl Into<Arc<T>>) -> Result<Self> {
		let transport = transport.into();
		let endpoint = config.endpoint(&config.routes.refresh)?;
		let sessions: Arc<dyn SessionService> =
			Arc::new(HttpSessionService::<T>::new(transport.clone(), endpoint));

		Ok(Self::with_session_service(config, transport, sessions))
	}

	/// Creates a client with a custom [`SessionService`].
	pub fn with_session_service(
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
		sessions: Arc<dyn SessionService>,
	) -> Self {
		let gate = Gatekeeper::new(transport, sessions, Arc::new(LocalSession::default()));

		Self { config, gate }
	}

	/// Active configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Gatekeeper guarding every call.
	pub fn gatekeeper(&self) -> &Gatekeeper<T> {
		&self.gate
	}

	/// Client-side session state.
	pub fn local_session(&self) -> &Arc<LocalSession> {
		self.gate.local_session()
	}

	/// Resolves a path relative to the API base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url> {
		Ok(self.config.endpoint(path)?)
	}

	pub(crate) fn resource(&self, collection: &str, id: &str) -> Result<Url> {
		Ok(self.config.resource(collection, id)?)
	}

	/// Sends an arbitrary request through the gatekeeper.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.gate.send(request).await
	}

	/// Creates an account and signs the new user in.
	pub async fn signup(&self, form: SignupForm) -> Result<UserProfile> {
		obs::observe(OpKind::Signup, "signup", self.signup_with(form)).await
	}

	/// Exchanges credentials for a session and records the signed-in user.
	pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
		obs::observe(OpKind::Login, "login", self.login_with(email, password)).await
	}

	/// Ends the session on the backend, then clears it locally.
	pub async fn logout(&self) -> Result<()> {
		obs::observe(OpKind::Logout, "logout", self.logout_with()).await
	}

	/// Restores the signed-in user from the backend's profile route.
	///
	/// Returns `Ok(None)` and clears the local session when the backend no longer accepts the
	/// session (including when the shared refresh failed). Network and decoding failures are
	/// reported as errors and keep the signed-in user, unlike the web storefront, which signs
	/// out on any failure.
	pub async fn check_auth(&self) -> Result<Option<UserProfile>> {
		obs::observe(OpKind::CheckAuth, "check_auth", self.check_auth_with()).await
	}

	async fn signup_with(&self, form: SignupForm) -> Result<UserProfile> {
		if form.password != form.confirm_password {
			return Err(Error::PasswordMismatch);
		}

		let url = self.endpoint(&self.config.routes.signup)?;
		let body = SignupBody { name: &form.name, email: &form.email, password: &form.password };
		let request = ApiRequest::post(url).with_json(&body)?.without_refresh();
		let envelope: UserEnvelope = self.call_json(request).await?;

		self.local_session().sign_in(envelope.user.clone());

		Ok(envelope.user)
	}

	async fn login_with(&self, email: &str, password: &str) -> Result<UserProfile> {
		let url = self.endpoint(&self.config.routes.login)?;
		let request =
			ApiRequest::post(url).with_json(&LoginBody { email, password })?.without_refresh();
		let envelope: UserEnvelope = self.call_json(request).await?;

		self.local_session().sign_in(envelope.user.clone());

		Ok(envelope.user)
	}

	async fn logout_with(&self) -> Result<()> {
		let url = self.endpoint(&self.config.routes.logout)?;

		self.call(ApiRequest::post(url)).await?;
		self.local_session().clear();

		Ok(())
	}

	async fn check_auth_with(&self) -> Result<Option<UserProfile>> {
		let url = self.endpoint(&self.config.routes.profile)?;

		match self.call_json::<UserProfile>(ApiRequest::get(url)).await {
			Ok(user) => {
				self.local_session().sign_in(user.clone());

				Ok(Some(user))
			},
			Err(e) if e.is_auth_failure() => {
				self.local_session().clear();

				Ok(None)
			},
			Err(e) => Err(e),
		}
	}

	/// Sends `request` through the gatekeeper and maps non-2xx answers to [`Error::Api`].
	pub(crate) async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
		let response = self.gate.send(request).await?;

		if response.status().is_success() {
			Ok(response)
		} else {
			Err(Error::Api {
				status: response.status().as_u16(),
				message: http::error_message(&response)
					.unwrap_or_else(|| GENERIC_FAILURE.into()),
			})
		}
	}

	pub(crate) async fn call_json<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: serde::de::DeserializeOwned,
	{
		let url = request.url().clone();
		let response = self.call(request).await?;

		Ok(http::decode_json(&url, &response)?)
	}
}
#[cfg(feature = "reqwest")]
impl StorefrontClient<ReqwestTransport> {
	/// Creates a client backed by a cookie-aware reqwest transport.
	pub fn new(config: ClientConfig) -> Result<Self> {
		let transport = ReqwestTransport::from_config(&config)?;

		Self::with_transport(config, transport)
	}
}
impl<T> Debug for StorefrontClient<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StorefrontClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("gate", &self.gate)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		error::TransportError,
		http::TransportFuture,
		session::{Session, SessionFuture},
	};
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Default)]
	struct CountingTransport(AtomicUsize);
	impl Transport for CountingTransport {
		fn execute<'a>(&'a self, _request: &'a ApiRequest) -> TransportFuture<'a> {
			self.0.fetch_add(1, Ordering::SeqCst);

			Box::pin(async { Ok::<_, TransportError>(ApiResponse::new(Vec::new())) })
		}
	}

	struct NoopSessions;
	impl SessionService for NoopSessions {
		fn refresh(&self) -> SessionFuture<'_, Session> {
			Box::pin(async { Ok(Session::now()) })
		}
	}

	#[tokio::test]
	async fn signup_rejects_mismatched_passwords_without_io() {
		let transport = Arc::new(CountingTransport::default());
		let config = ClientConfig::development().expect("Development config should build.");
		let client: StorefrontClient<CountingTransport> =
			StorefrontClient::with_session_service(config, transport.clone(), Arc::new(NoopSessions));
		let err = client
			.signup(SignupForm {
				name: "Ada".into(),
				email: "ada@example.com".into(),
				password: "hunter22".into(),
				confirm_password: "hunter23".into(),
			})
			.await
			.expect_err("Mismatched passwords should be rejected locally.");

		assert!(matches!(err, Error::PasswordMismatch));
		assert_eq!(transport.0.load(Ordering::SeqCst), 0);
	}
}
