//! Async storefront API client whose request gatekeeper coalesces concurrent session refreshes
//! into a single call and replays every rejected request exactly once.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cart;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod obs;
pub mod session;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Shared fixtures for unit and integration tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::session::{LocalSession, Role, UserProfile};
	#[cfg(feature = "reqwest")]
	use crate::{client::StorefrontClient, config::ClientConfig, http::ReqwestTransport};

	/// Backend JSON for the user built by [`test_user`].
	pub const TEST_USER_JSON: &str =
		r#"{"_id":"665f1c","name":"Ada","email":"ada@example.com","role":"customer"}"#;

	/// Client type used by reqwest-backed integration tests.
	#[cfg(feature = "reqwest")]
	pub type ReqwestTestClient = StorefrontClient<ReqwestTransport>;

	/// Customer account used across tests.
	pub fn test_user() -> UserProfile {
		test_user_with_role(Role::Customer)
	}

	/// [`test_user`] with a different role.
	pub fn test_user_with_role(role: Role) -> UserProfile {
		UserProfile {
			id: "665f1c".into(),
			name: "Ada".into(),
			email: "ada@example.com".into(),
			role,
		}
	}

	/// Local session with [`test_user`] already signed in.
	pub fn signed_in_session() -> Arc<LocalSession> {
		let local = Arc::new(LocalSession::default());

		local.sign_in(test_user());

		local
	}

	/// Absolute URL on a fixed test host.
	pub fn test_url(path: &str) -> Url {
		Url::parse("https://shop.example.com")
			.and_then(|base| base.join(path))
			.expect("Test URL should parse.")
	}

	/// Builds a cookie-aware client whose API root is `{server_base}/api/`, matching the
	/// backend's route prefix.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_client(server_base: &str) -> ReqwestTestClient {
		let base = format!("{}/api/", server_base.trim_end_matches('/'));
		let config = ClientConfig::new(&base).expect("Failed to parse mock server base URL.");

		StorefrontClient::new(config).expect("Failed to build reqwest client for tests.")
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::OnceCell as AsyncOnceCell;
	pub use ::http::{HeaderMap, Method, StatusCode};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
