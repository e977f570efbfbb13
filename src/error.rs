//! Client-level error types shared across the gatekeeper, session, and account layers.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS); never routed through session refresh.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded into the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Request body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	Encode(#[from] serde_json::Error),

	/// Request was replayed after a successful refresh and is still unauthorized.
	#[error("Request {method} {url} is still unauthorized after the session was refreshed.")]
	Unauthorized {
		/// Method of the rejected request.
		method: Method,
		/// Target of the rejected request.
		url: Url,
	},
	/// Shared session refresh failed; every request waiting on it observes the same cause.
	#[error("Session refresh failed.")]
	RefreshFailed(#[source] Arc<crate::session::SessionError>),
	/// API answered with a non-success status.
	#[error("API rejected the request with status {status}: {message}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Backend-supplied message, or a generic fallback.
		message: String,
	},
	/// Signup form carried two different passwords.
	#[error("Passwords do not match.")]
	PasswordMismatch,
}
impl Error {
	/// Returns `true` when the error means the caller no longer holds a usable session.
	pub fn is_auth_failure(&self) -> bool {
		match self {
			Self::Unauthorized { .. } | Self::RefreshFailed(_) => true,
			Self::Api { status, .. } => matches!(status, 401 | 403),
			_ => false,
		}
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL cannot carry relative endpoint paths.
	#[error("Base URL `{url}` cannot be used as a base for API endpoints.")]
	CannotBeABase {
		/// Offending URL.
		url: String,
	},
	/// Endpoint path cannot be joined onto the base URL.
	#[error("Endpoint `{path}` cannot be joined onto the base URL.")]
	InvalidEndpoint {
		/// Relative endpoint path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Header name or value is malformed.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Header name as supplied by the caller.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Response body failed to decode.
#[derive(Debug, ThisError)]
#[error("Response body from {url} is malformed.")]
pub struct DecodeError {
	/// Endpoint that produced the body.
	pub url: Url,
	/// HTTP status code of the response.
	pub status: u16,
	/// Structured parsing failure.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}

/// Failure that kept a request from producing any response.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target of the failed call.
		url: Url,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(url: Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { url, source: Box::new(src) }
	}
}
