//! Composition root wiring configuration, the clock, both token managers, the shared blacklist
//! and the rate limiter into one handle owned by the service's startup routine.
//!
//! Every operation reads the clock once. A clock failure surfaces as
//! [`Error::Unavailable`](crate::error::Error::Unavailable); every other outcome is a value.

// self
use crate::{
	_prelude::*,
	auth::{
		AccessClaims, FailureOutcome, LockoutPolicy, LoginAttempts, LockoutStatus, OpaqueKind,
		OpaqueToken, TokenBundle,
	},
	clock::{self, Clock, SystemClock},
	config::TrustConfig,
	limit::{self, Admission, RateLimitDecision, RateLimiter, RuleSet},
	obs::{CheckKind, CheckSpan},
	store::{Blacklist, MemoryBlacklist},
	tokens::{AccessTokenManager, RefreshTokenManager, RotationError, TokenValidation},
};

/// Outcome of [`TrustGate::authenticate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
	/// No `Authorization: Bearer <token>` header was presented.
	Missing,
	/// A bearer token was presented and validated.
	Checked(TokenValidation<AccessClaims>),
}
impl AuthOutcome {
	/// Verified claims, if the token was valid.
	pub fn claims(&self) -> Option<&AccessClaims> {
		match self {
			Self::Missing => None,
			Self::Checked(validation) => validation.claims(),
		}
	}

	/// HTTP status a handler should answer with: 200 when valid, 401 otherwise.
	pub const fn http_status(&self) -> u16 {
		match self {
			Self::Missing => 401,
			Self::Checked(validation) => validation.http_status(),
		}
	}
}

/// Trust layer for one running service.
pub struct TrustGate<K = SystemClock>
where
	K: Clock,
{
	clock: K,
	access: AccessTokenManager,
	refresh: RefreshTokenManager,
	blacklist: Arc<dyn Blacklist>,
	limiter: RateLimiter,
	lockout: LockoutPolicy,
}
impl<K> TrustGate<K>
where
	K: Clock,
{
	/// Builds a gate backed by an in-memory blacklist.
	pub fn new(config: &TrustConfig, clock: K) -> Result<Self> {
		Self::with_blacklist(config, clock, Arc::new(MemoryBlacklist::new()))
	}

	/// Builds a gate revoking tokens through `blacklist`, shared by both token classes.
	pub fn with_blacklist(
		config: &TrustConfig,
		clock: K,
		blacklist: Arc<dyn Blacklist>,
	) -> Result<Self> {
		config.validate()?;

		let rules = RuleSet::compile(config.rate_limit_rules().iter().cloned())?;
		let access = AccessTokenManager::new(
			config.access_token_secret().clone(),
			config.access_token_exp_minutes(),
			blacklist.clone(),
		);
		let refresh = RefreshTokenManager::new(
			config.refresh_token_secret().clone(),
			config.refresh_token_exp_days(),
			blacklist.clone(),
		);

		Ok(Self {
			clock,
			access,
			refresh,
			blacklist,
			limiter: RateLimiter::new(rules),
			lockout: config.lockout_policy(),
		})
	}

	/// Rate-limits a request from `client_key` for `path`; the query string is ignored.
	pub fn admit(&self, client_key: &str, path: &str) -> Result<Admission> {
		let now = self.clock.now()?;

		Ok(self.limiter.admit(client_key, limit::normalize_path(path), now))
	}

	/// Bare decision for a request, without a retry hint.
	pub fn check(&self, client_key: &str, path: &str) -> Result<RateLimitDecision> {
		let now = self.clock.now()?;

		Ok(self.limiter.check(client_key, limit::normalize_path(path), now))
	}

	/// Whole seconds before `client_key` may retry `path`.
	pub fn retry_after(&self, client_key: &str, path: &str) -> Result<u64> {
		let now = self.clock.now()?;

		Ok(self.limiter.retry_after(client_key, limit::normalize_path(path), now))
	}

	/// Mints an access/refresh pair after a successful login.
	pub fn issue_session(&self, user_id: u64) -> Result<TokenBundle> {
		let now = self.now_secs()?;
		let access = self.access.issue(user_id, now)?;
		let refresh = self.refresh.issue(user_id, now)?;

		Ok(TokenBundle {
			user_id,
			access_token: access.token,
			refresh_token: refresh.token,
			access_token_expires_at: access.claims.exp,
			refresh_token_expires_at: refresh.claims.exp,
			access_token_lifetime: self.access.lifetime_secs(),
		})
	}

	/// Validates the access token carried by an `Authorization` header value.
	pub fn authenticate(&self, authorization: Option<&str>) -> Result<AuthOutcome> {
		let Some(token) = authorization.and_then(bearer_token) else {
			return Ok(AuthOutcome::Missing);
		};
		let now = self.now_secs()?;

		Ok(AuthOutcome::Checked(self.access.validate(token, now)))
	}

	/// Exchanges `refresh_token` for a new access token owned by `user_id`.
	///
	/// The outer result carries only internal faults; a refused token is the inner error.
	pub fn refresh(
		&self,
		refresh_token: &str,
		user_id: u64,
	) -> Result<Result<TokenBundle, RotationError>> {
		let now = self.now_secs()?;
		let rotation = self.refresh.rotate_access_token(refresh_token, user_id, now, &self.access)?;

		Ok(rotation.into_result())
	}

	/// Revokes `token`, returning `true` when it was not revoked before.
	///
	/// Either token class may be revoked; an empty token is ignored.
	pub fn logout(&self, token: &str) -> bool {
		let _span = CheckSpan::new(CheckKind::Revocation, "logout").entered();

		if token.is_empty() {
			return false;
		}

		self.blacklist.add(token)
	}

	/// Evaluates whether an account may attempt a login, resetting an elapsed lock in place.
	pub fn login_status(&self, attempts: &mut LoginAttempts) -> Result<LockoutStatus> {
		let now = self.clock.now()?;

		Ok(self.lockout.evaluate(attempts, now))
	}

	/// Records a failed login against `attempts`.
	pub fn record_login_failure(&self, attempts: LoginAttempts) -> Result<FailureOutcome> {
		let now = self.clock.now()?;

		Ok(self.lockout.register_failure(attempts, now))
	}

	/// Mints a single-use opaque token such as a password-reset or email-verification link.
	pub fn issue_opaque(&self, kind: OpaqueKind) -> Result<OpaqueToken> {
		let now = self.clock.now()?;

		OpaqueToken::generate(kind, now)
	}

	/// Lockout thresholds in force.
	pub fn lockout_policy(&self) -> &LockoutPolicy {
		&self.lockout
	}

	/// Underlying limiter, e.g. for a periodic [`RateLimiter::sweep`].
	pub fn limiter(&self) -> &RateLimiter {
		&self.limiter
	}

	/// Access token manager.
	pub fn access_tokens(&self) -> &AccessTokenManager {
		&self.access
	}

	/// Refresh token manager.
	pub fn refresh_tokens(&self) -> &RefreshTokenManager {
		&self.refresh
	}

	/// Shared revocation set.
	pub fn blacklist(&self) -> &Arc<dyn Blacklist> {
		&self.blacklist
	}

	/// Clock driving the gate.
	pub fn clock(&self) -> &K {
		&self.clock
	}

	fn now_secs(&self) -> Result<u64> {
		let now = self.clock.now()?;

		Ok(clock::unix_seconds(now)?)
	}
}
impl<K> Debug for TrustGate<K>
where
	K: Clock,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TrustGate")
			.field("access", &self.access)
			.field("refresh", &self.refresh)
			.field("revoked", &self.blacklist.len())
			.field("limiter", &self.limiter)
			.field("lockout", &self.lockout)
			.finish_non_exhaustive()
	}
}

/// Extracts the token from an `Authorization` header value of the form `Bearer <token>`.
pub fn bearer_token(header: &str) -> Option<&str> {
	header.strip_prefix("Bearer ").filter(|token| !token.is_empty())
}
