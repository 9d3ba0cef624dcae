//! Crate-level error types for the faults that abort an operation.
//!
//! Token validation failures and rate-limit denials are ordinary outcomes and are returned as
//! values ([`crate::tokens::TokenValidation`], [`crate::limit::RateLimitDecision`]). Only a broken
//! configuration or an unreadable clock surfaces through [`Error`].

// self
use crate::{_prelude::*, clock::ClockError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A token could not be minted.
	#[error(transparent)]
	Encode(#[from] crate::codec::EncodeError),
	/// The time source could not be read; callers must fail the request as a server error.
	#[error("Trust layer is unavailable: {0}")]
	Unavailable(
		#[from]
		#[source]
		ClockError,
	),
}
impl Error {
	/// Returns `true` when the caller should answer with a server-side failure.
	pub fn is_unavailable(&self) -> bool {
		matches!(self, Self::Unavailable(_))
	}
}

/// Configuration and validation failures raised while building the trust layer.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configuration JSON could not be parsed.
	#[error("Configuration is malformed at `{path}`.")]
	Parse {
		/// Dotted path of the offending field.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Configuration file could not be read.
	#[error("Configuration file {path} could not be read.")]
	Read {
		/// File path that failed to load.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// A token class was configured with an empty signing secret.
	#[error("The {class} token secret cannot be empty.")]
	EmptySecret {
		/// Token class label.
		class: &'static str,
	},
	/// A token class was configured with a zero lifetime.
	#[error("The {class} token lifetime must be positive.")]
	NonPositiveTtl {
		/// Token class label.
		class: &'static str,
	},
	/// A rate-limit rule carries thresholds that can never admit a request.
	#[error("Rate limit rule `{path}` is invalid: {reason}.")]
	InvalidRule {
		/// Rule path or pattern.
		path: String,
		/// Human-readable reason.
		reason: &'static str,
	},
}
impl ConfigError {
	/// Wraps a path-aware JSON failure.
	pub fn parse(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = err.path().to_string();

		Self::Parse { path, source: err.into_inner() }
	}
}
