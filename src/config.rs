//! Client configuration: API base URL, auth route layout, and transport knobs.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Relative paths of the storefront auth routes, resolved against [`ClientConfig::base_url`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthRoutes {
	/// Account creation.
	pub signup: String,
	/// Credential exchange for a fresh session.
	pub login: String,
	/// Session teardown.
	pub logout: String,
	/// Signed-in user's profile.
	pub profile: String,
	/// Renewal-credential exchange for a new short-lived credential.
	pub refresh: String,
}
impl Default for AuthRoutes {
	fn default() -> Self {
		Self {
			signup: "auth/signup".into(),
			login: "auth/login".into(),
			logout: "auth/logout".into(),
			profile: "auth/profile".into(),
			refresh: "auth/refresh-token".into(),
		}
	}
}

/// Validated client settings.
///
/// The base URL always ends with `/` so relative endpoint paths extend it instead of
/// replacing its last segment.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// API root every endpoint path is joined onto.
	pub base_url: Url,
	/// Auth route layout.
	pub routes: AuthRoutes,
	/// Per-request timeout applied by the transport, if any.
	pub request_timeout: Option<StdDuration>,
	/// `User-Agent` sent with every request.
	pub user_agent: String,
}
impl ClientConfig {
	/// API root used by a locally running backend.
	pub const DEVELOPMENT_BASE_URL: &'static str = "http://localhost:5000/api/";

	/// Parses `base_url` and builds a configuration with default routes.
	pub fn new(base_url: &str) -> Result<Self, ConfigError> {
		let parsed =
			Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		Self::with_base_url(parsed)
	}

	/// Builds a configuration around an already parsed base URL.
	pub fn with_base_url(mut base_url: Url) -> Result<Self, ConfigError> {
		if base_url.cannot_be_a_base() {
			return Err(ConfigError::CannotBeABase { url: base_url.into() });
		}
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		Ok(Self {
			base_url,
			routes: AuthRoutes::default(),
			request_timeout: None,
			user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into(),
		})
	}

	/// Configuration for a backend listening on `localhost:5000`.
	pub fn development() -> Result<Self, ConfigError> {
		Self::new(Self::DEVELOPMENT_BASE_URL)
	}

	/// Overrides the auth route layout.
	pub fn with_routes(mut self, routes: AuthRoutes) -> Self {
		self.routes = routes;

		self
	}

	/// Sets a per-request timeout.
	pub fn with_request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Overrides the `User-Agent` header.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}

	/// Resolves a relative endpoint path against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let relative = path.trim_start_matches('/');

		self.base_url
			.join(relative)
			.map_err(|source| ConfigError::InvalidEndpoint { path: path.into(), source })
	}

	/// Resolves `collection` and appends `id` as one percent-encoded path segment.
	pub fn resource(&self, collection: &str, id: &str) -> Result<Url, ConfigError> {
		let mut url = self.endpoint(collection)?;

		match url.path_segments_mut() {
			Ok(mut segments) => {
				segments.pop_if_empty().push(id);
			},
			Err(()) => return Err(ConfigError::CannotBeABase { url: self.base_url.to_string() }),
		}

		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn base_url_gains_trailing_slash() {
		let config = ClientConfig::new("https://shop.example.com/api")
			.expect("Base URL fixture should parse.");

		assert_eq!(config.base_url.as_str(), "https://shop.example.com/api/");
		assert_eq!(
			config.endpoint("/auth/profile").expect("Profile endpoint should join.").as_str(),
			"https://shop.example.com/api/auth/profile",
		);
	}

	#[test]
	fn resource_ids_stay_in_one_segment() {
		let config = ClientConfig::development().expect("Development config should build.");

		assert_eq!(
			config.resource("cart", "665f1c").expect("Cart item URL should build.").as_str(),
			"http://localhost:5000/api/cart/665f1c",
		);
		assert_eq!(
			config
				.resource("products/category/", "jeans & tees/2")
				.expect("Category URL should build.")
				.as_str(),
			"http://localhost:5000/api/products/category/jeans%20&%20tees%2F2",
		);
	}

	#[test]
	fn development_config_targets_local_backend() {
		let config = ClientConfig::development().expect("Development config should build.");
		let refresh = config
			.endpoint(&config.routes.refresh)
			.expect("Refresh endpoint should join onto the development base.");

		assert_eq!(refresh.as_str(), "http://localhost:5000/api/auth/refresh-token");
	}

	#[test]
	fn rejects_unusable_base_urls() {
		assert!(matches!(
			ClientConfig::new("not a url"),
			Err(ConfigError::InvalidBaseUrl { .. })
		));
		assert!(matches!(
			ClientConfig::new("mailto:shop@example.com"),
			Err(ConfigError::CannotBeABase { .. })
		));
	}
}
