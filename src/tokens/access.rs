//! Short-lived access tokens bound to a user.

// self
use crate::{
	_prelude::*,
	auth::{AccessClaims, SigningKey},
	obs::CheckKind,
	store::Blacklist,
	tokens::{self, IssuedToken, TokenValidation},
};

/// Issues and validates access tokens with a minute-granularity lifetime.
#[derive(Clone)]
pub struct AccessTokenManager {
	key: SigningKey,
	ttl_minutes: u64,
	blacklist: Arc<dyn Blacklist>,
}
impl AccessTokenManager {
	/// Creates a manager signing with `key` and granting `ttl_minutes` per token.
	pub fn new(key: SigningKey, ttl_minutes: u64, blacklist: Arc<dyn Blacklist>) -> Self {
		Self { key, ttl_minutes, blacklist }
	}

	/// Lifetime granted to each token, in seconds.
	pub fn lifetime_secs(&self) -> u64 {
		self.ttl_minutes.saturating_mul(60)
	}

	/// Mints a token for `user_id` at `now` (unix seconds): `exp = now + ttl_minutes * 60`.
	pub fn issue(&self, user_id: u64, now: u64) -> Result<IssuedToken<AccessClaims>> {
		tokens::issue_class(user_id, now, self.lifetime_secs(), &self.key)
	}

	/// Validates `token` at `now` (unix seconds), consulting the blacklist first.
	pub fn validate(&self, token: &str, now: u64) -> TokenValidation<AccessClaims> {
		tokens::validate_class(CheckKind::Access, token, &self.key, now, self.blacklist.as_ref())
	}
}
impl Debug for AccessTokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessTokenManager")
			.field("key", &self.key)
			.field("ttl_minutes", &self.ttl_minutes)
			.field("revoked", &self.blacklist.len())
			.finish()
	}
}
