//! Token pairs handed back to callers after login or rotation.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// Access/refresh pair returned by issuance and refresh rotation.
///
/// All instants are unix seconds. After a rotation the refresh half is the caller's original
/// token, byte-for-byte, with its original expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
	/// User both tokens were minted for.
	pub user_id: u64,
	/// Access token; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token; callers must avoid logging it.
	pub refresh_token: TokenSecret,
	/// Expiry of the access token.
	pub access_token_expires_at: u64,
	/// Expiry of the refresh token.
	pub refresh_token_expires_at: u64,
	/// Lifetime of the access token in seconds.
	pub access_token_lifetime: u64,
}
impl TokenBundle {
	/// Seconds until the access token expires, floored at zero.
	pub fn access_remaining_at(&self, now: u64) -> u64 {
		self.access_token_expires_at.saturating_sub(now)
	}

	/// Seconds until the refresh token expires, floored at zero.
	pub fn refresh_remaining_at(&self, now: u64) -> u64 {
		self.refresh_token_expires_at.saturating_sub(now)
	}
}
impl Debug for TokenBundle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenBundle")
			.field("user_id", &self.user_id)
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("access_token_expires_at", &self.access_token_expires_at)
			.field("refresh_token_expires_at", &self.refresh_token_expires_at)
			.field("access_token_lifetime", &self.access_token_lifetime)
			.finish()
	}
}
