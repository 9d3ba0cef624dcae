//! Failed-login lockout policy.
//!
//! The attempt counter lives on the account row owned by the caller. The policy only decides
//! what the next counter value is and whether a login may be attempted at all.

// self
use crate::_prelude::*;

/// Defaults applied when configuration omits lockout settings.
pub const DEFAULT_LOCK_FAILED_ATTEMPTS: u32 = 5;
/// Default lockout window in minutes.
pub const DEFAULT_LOCK_DURATION_MINUTES: u32 = 10;

/// Persisted failure counter for one account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempts {
	/// Consecutive failed logins.
	pub failed: u32,
	/// Instant of the most recent failure.
	pub last_failed_at: Option<OffsetDateTime>,
}

/// Decision produced by [`LockoutPolicy::evaluate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockoutStatus {
	/// A login may be attempted.
	Open,
	/// The account is locked for at least `retry_after`.
	Locked {
		/// Time left on the lock.
		retry_after: Duration,
	},
}

/// Outcome of [`LockoutPolicy::register_failure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FailureOutcome {
	/// Counter to persist on the account.
	pub attempts: LoginAttempts,
	/// `true` when this failure tripped the lock.
	pub locked_now: bool,
}

/// Locks an account for a fixed window after too many consecutive failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockoutPolicy {
	max_attempts: u32,
	lock_duration: Duration,
}
impl LockoutPolicy {
	/// Locks after `max_attempts` failures for `lock_duration`.
	pub fn new(max_attempts: u32, lock_duration: Duration) -> Self {
		Self { max_attempts: max_attempts.max(1), lock_duration }
	}

	/// Failure threshold.
	pub fn max_attempts(&self) -> u32 {
		self.max_attempts
	}

	/// Lock window.
	pub fn lock_duration(&self) -> Duration {
		self.lock_duration
	}

	/// Decides whether a login may proceed. An elapsed lock resets `attempts` in place.
	pub fn evaluate(&self, attempts: &mut LoginAttempts, now: OffsetDateTime) -> LockoutStatus {
		if attempts.failed < self.max_attempts {
			return LockoutStatus::Open;
		}

		let elapsed = attempts.last_failed_at.map_or(self.lock_duration, |at| now - at);

		if elapsed < self.lock_duration {
			return LockoutStatus::Locked { retry_after: self.lock_duration - elapsed };
		}

		*attempts = LoginAttempts::default();

		LockoutStatus::Open
	}

	/// Records a failed login at `now`.
	pub fn register_failure(&self, attempts: LoginAttempts, now: OffsetDateTime) -> FailureOutcome {
		let failed = attempts.failed.saturating_add(1);
		let attempts = LoginAttempts { failed, last_failed_at: Some(now) };

		FailureOutcome { attempts, locked_now: failed == self.max_attempts }
	}

	/// Counter to persist after a successful login.
	pub fn register_success(&self) -> LoginAttempts {
		LoginAttempts::default()
	}
}
impl Default for LockoutPolicy {
	fn default() -> Self {
		Self::new(
			DEFAULT_LOCK_FAILED_ATTEMPTS,
			Duration::minutes(DEFAULT_LOCK_DURATION_MINUTES.into()),
		)
	}
}
