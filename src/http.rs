//! Transport primitives for storefront API calls.
//!
//! The module exposes [`ApiRequest`], an owned snapshot of everything needed to put a call on
//! the wire, and the [`Transport`] trait that executes it. Transports borrow the snapshot for
//! each attempt instead of consuming it, so the gatekeeper can replay the identical request
//! after a session refresh without rebuilding or mutating it. Credentials are not part of the
//! snapshot; they travel out-of-band (cookies) and are picked up fresh on every attempt.

// crates.io
use ::http::{HeaderName, HeaderValue, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, DecodeError, TransportError},
};
#[cfg(feature = "reqwest")] use crate::config::ClientConfig;

/// Raw response returned by a [`Transport`].
pub type ApiResponse = ::http::Response<Vec<u8>>;

/// Boxed future returned by [`Transport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// How the gatekeeper treats a `401 Unauthorized` answer to a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
	/// Refresh the session (or join the refresh in flight) and replay once.
	#[default]
	RefreshOnUnauthorized,
	/// Hand the response back untouched. Used by calls that establish or renew credentials.
	PassThrough,
}

/// Owned, cloneable description of one logical API call.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	method: Method,
	url: Url,
	headers: HeaderMap,
	body: Option<Vec<u8>>,
	refresh_policy: RefreshPolicy,
}
impl ApiRequest {
	/// Creates a body-less request.
	pub fn new(method: Method, url: Url) -> Self {
		Self {
			method,
			url,
			headers: HeaderMap::new(),
			body: None,
			refresh_policy: RefreshPolicy::default(),
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(url: Url) -> Self {
		Self::new(Method::PUT, url)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(url: Url) -> Self {
		Self::new(Method::DELETE, url)
	}

	/// Adds a header, replacing any previous value under the same name.
	pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
		let invalid = || ConfigError::InvalidHeader { name: name.into() };
		let name_parsed = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let value_parsed = HeaderValue::from_str(value).map_err(|_| invalid())?;

		self.headers.insert(name_parsed, value_parsed);

		Ok(self)
	}

	/// Serializes `body` as JSON and sets the matching content type.
	pub fn with_json<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body)?);
		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Opts the request out of session refresh.
	pub fn without_refresh(mut self) -> Self {
		self.refresh_policy = RefreshPolicy::PassThrough;

		self
	}

	/// Request method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Request target.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Request headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Request body, if any.
	pub fn body(&self) -> Option<&[u8]> {
		self.body.as_deref()
	}

	/// Refresh handling for `401` answers.
	pub fn refresh_policy(&self) -> RefreshPolicy {
		self.refresh_policy
	}
}

/// Executes [`ApiRequest`] snapshots against the storefront backend.
///
/// The trait is the client's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by the gatekeeper and the session
/// service behind an `Arc`. A transport reports a distinguishable `401` simply by returning
/// the response; only failures that produced no response at all become [`TransportError`].
/// Implementations must not mutate or cache the request: the gatekeeper executes the same
/// snapshot again when it replays.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Performs one attempt of `request`.
	fn execute<'a>(&'a self, request: &'a ApiRequest) -> TransportFuture<'a>;
}

/// Returns `true` when `response` reports an expired or missing credential.
pub fn is_unauthorized(response: &ApiResponse) -> bool {
	response.status() == StatusCode::UNAUTHORIZED
}

/// Decodes a JSON response body, reporting the failing field path on error.
pub fn decode_json<T>(url: &Url, response: &ApiResponse) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(response.body());

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| DecodeError {
		url: url.clone(),
		status: response.status().as_u16(),
		source,
	})
}

/// Extracts the backend's `{ "message": "..." }` error text, if present.
pub fn error_message(response: &ApiResponse) -> Option<String> {
	#[derive(Deserialize)]
	struct ErrorBody {
		message: Option<String>,
	}

	serde_json::from_slice::<ErrorBody>(response.body())
		.ok()
		.and_then(|body| body.message)
		.filter(|message| !message.trim().is_empty())
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The wrapped client keeps a cookie store: the backend issues both the short-lived and the
/// renewal credential as cookies, and a refresh rotates them in the jar before any replay
/// is sent. Share one instance between the gatekeeper and the session service so both see
/// the same jar.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a cookie-aware client from `config`.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let user_agent = HeaderValue::from_str(&config.user_agent)
			.map_err(|_| ConfigError::InvalidHeader { name: "user-agent".into() })?;
		let mut builder = ReqwestClient::builder().cookie_store(true).user_agent(user_agent);

		if let Some(timeout) = config.request_timeout {
			builder = builder.timeout(timeout);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn execute<'a>(&'a self, request: &'a ApiRequest) -> TransportFuture<'a> {
		Box::pin(async move {
			let network = |e: ReqwestError| TransportError::network(request.url.clone(), e);
			let mut builder = self
				.0
				.request(request.method.clone(), request.url.clone())
				.headers(request.headers.clone());

			if let Some(body) = &request.body {
				builder = builder.body(body.clone());
			}

			let response = builder.send().await.map_err(network)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(network)?;
			let mut response_new = ApiResponse::new(body.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::test_url;

	fn response(status: u16, body: &str) -> ApiResponse {
		let mut response = ApiResponse::new(body.as_bytes().to_vec());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Status fixture should be valid.");

		response
	}

	fn url() -> Url {
		test_url("/api/products")
	}

	#[test]
	fn cloned_requests_share_no_mutable_state() {
		let original = ApiRequest::post(url())
			.with_json(&serde_json::json!({ "name": "mug" }))
			.expect("JSON body should serialize.");
		let replay = original.clone().without_refresh();

		assert_eq!(original.refresh_policy(), RefreshPolicy::RefreshOnUnauthorized);
		assert_eq!(replay.refresh_policy(), RefreshPolicy::PassThrough);
		assert_eq!(original.body(), replay.body());
		assert_eq!(
			original.headers().get(CONTENT_TYPE).map(HeaderValue::as_bytes),
			Some(&b"application/json"[..]),
		);
	}

	#[test]
	fn rejects_malformed_headers() {
		let err = ApiRequest::get(url())
			.with_header("x-bad header", "value")
			.expect_err("Header names with spaces should be rejected.");

		assert!(matches!(err, ConfigError::InvalidHeader { .. }));
	}

	#[test]
	fn unencodable_json_bodies_surface_as_encode_errors() {
		let body = std::collections::BTreeMap::from([((1_u8, 2_u8), "pair")]);
		let err = ApiRequest::post(url())
			.with_json(&body)
			.expect_err("Tuple map keys cannot be encoded as JSON.");

		assert!(matches!(err, Error::Encode(_)));
	}

	#[test]
	fn only_401_counts_as_unauthorized() {
		assert!(is_unauthorized(&response(401, "")));
		assert!(!is_unauthorized(&response(403, "")));
		assert!(!is_unauthorized(&response(500, "")));
	}

	#[test]
	fn error_message_reads_backend_shape() {
		assert_eq!(
			error_message(&response(400, r#"{"message":"User already exists"}"#)).as_deref(),
			Some("User already exists"),
		);
		assert_eq!(error_message(&response(500, "<html>")), None);
		assert_eq!(error_message(&response(500, r#"{"message":"  "}"#)), None);
	}

	#[test]
	fn decode_json_reports_field_path() {
		#[derive(Debug, Deserialize)]
		struct Profile {
			#[allow(dead_code)]
			email: String,
		}

		let err = decode_json::<Profile>(&url(), &response(200, r#"{"email":42}"#))
			.expect_err("Numeric email should fail to decode.");

		assert_eq!(err.status, 200);
		assert_eq!(err.source.path().to_string(), "email");
	}
}
