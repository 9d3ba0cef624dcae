//! Trust-and-access layer for blog and community backends: HMAC-signed bearer tokens with
//! rotation and revocation, plus a sliding-window request limiter with escalating blocks.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod gate;
pub mod limit;
pub mod obs;
pub mod store;
pub mod tokens;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use time::macros;
	// self
	use crate::{
		auth::SigningKey,
		clock::ManualClock,
		config::TrustConfig,
		gate::TrustGate,
		limit::{RateLimitRule, RuleSet},
	};

	/// Access secret shared by integration tests.
	pub const TEST_ACCESS_SECRET: &str = "access-secret-for-tests";
	/// Refresh secret shared by integration tests.
	pub const TEST_REFRESH_SECRET: &str = "refresh-secret-for-tests";

	/// Fixed starting instant used by test clocks.
	pub fn test_epoch() -> OffsetDateTime {
		macros::datetime!(2025-11-10 12:00 UTC)
	}

	/// Signing key for the access token class.
	pub fn test_access_key() -> SigningKey {
		SigningKey::new(TEST_ACCESS_SECRET)
	}

	/// Signing key for the refresh token class.
	pub fn test_refresh_key() -> SigningKey {
		SigningKey::new(TEST_REFRESH_SECRET)
	}

	/// Builds a rule literal without going through JSON.
	pub fn rule(path: &str, max_requests: u32, window_seconds: u64) -> RateLimitRule {
		RateLimitRule { path: path.into(), max_requests, window_seconds, enabled: true }
	}

	/// Compiles the provided rules, panicking only if a literal rule is rejected.
	pub fn compile_rules(rules: impl IntoIterator<Item = RateLimitRule>) -> RuleSet {
		RuleSet::compile(rules).expect("Test rule fixtures should compile.")
	}

	/// Configuration used by gate-level tests: 15 minute access tokens, 7 day refresh tokens,
	/// and a `/api/v1/login` limit of 3 requests per 10 seconds.
	pub fn test_config() -> TrustConfig {
		TrustConfig::builder(TEST_ACCESS_SECRET, TEST_REFRESH_SECRET)
			.access_token_exp_minutes(15)
			.refresh_token_exp_days(7)
			.rate_limit_rule(rule("/api/v1/login", 3, 10))
			.rate_limit_rule(rule("^/api/v1/.*$", 100, 60))
			.build()
			.expect("Test configuration should validate.")
	}

	/// Builds a gate driven by a manual clock that starts at [`test_epoch`].
	pub fn build_test_gate() -> (TrustGate<Arc<ManualClock>>, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::new(test_epoch()));
		let gate = TrustGate::new(&test_config(), clock.clone())
			.expect("Test gate should build from the test configuration.");

		(gate, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::{HashMap, HashSet, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

#[cfg(test)] use {color_eyre as _, tokio as _};
