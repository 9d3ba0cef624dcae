//! Optional observability helpers for trust-layer checks.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits structured events and `trustgate.check` spans carrying the
//!   `check` (kind) and `stage` (call site) fields. Tokens only ever appear as fingerprints.
//! - `metrics` increments `trustgate_rate_limit_total{decision}` and
//!   `trustgate_token_validation_total{class,outcome}`.

mod events;
mod metrics;
mod tracing;

pub use events::*;
pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Trust-layer check kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckKind {
	/// Rate-limit admission.
	RateLimit,
	/// Access token validation.
	Access,
	/// Refresh token validation.
	Refresh,
	/// Access token rotation through a refresh token.
	Rotation,
	/// Logout revocation.
	Revocation,
}
impl CheckKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CheckKind::RateLimit => "rate_limit",
			CheckKind::Access => "access",
			CheckKind::Refresh => "refresh",
			CheckKind::Rotation => "rotation",
			CheckKind::Revocation => "revocation",
		}
	}
}
impl Display for CheckKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
