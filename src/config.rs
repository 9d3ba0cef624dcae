//! Immutable trust-layer configuration, loaded once at startup.
//!
//! The JSON layout matches the service's user configuration file. Fields owned by other
//! subsystems (SMTP, avatars, site URLs) are ignored.

// std
use std::path::Path;
// self
use crate::{
	_prelude::*,
	auth::{DEFAULT_LOCK_DURATION_MINUTES, DEFAULT_LOCK_FAILED_ATTEMPTS, LockoutPolicy, SigningKey},
	error::ConfigError,
	limit::RateLimitRule,
};

/// Secrets, lifetimes, lockout thresholds and rate-limit rules for one running service.
#[derive(Clone, Debug, Deserialize)]
pub struct TrustConfig {
	access_token_secret: SigningKey,
	access_token_exp_minutes: u64,
	refresh_token_secret: SigningKey,
	refresh_token_exp_days: u64,
	#[serde(default = "default_lock_failed_attempts")]
	lock_failed_attempts: u32,
	#[serde(default = "default_lock_duration_minutes")]
	lock_duration_minutes: u32,
	#[serde(default)]
	rate_limit_rules: Vec<RateLimitRule>,
}
impl TrustConfig {
	/// Starts a builder with the two signing secrets and default everything else.
	pub fn builder(
		access_token_secret: impl AsRef<[u8]>,
		refresh_token_secret: impl AsRef<[u8]>,
	) -> TrustConfigBuilder {
		TrustConfigBuilder::new(access_token_secret, refresh_token_secret)
	}

	/// Parses and validates configuration JSON.
	pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(json);

		Self::finish(serde_path_to_error::deserialize(&mut deserializer))
	}

	/// Parses and validates configuration JSON bytes.
	pub fn from_json_slice(json: &[u8]) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_slice(json);

		Self::finish(serde_path_to_error::deserialize(&mut deserializer))
	}

	/// Reads, parses and validates a configuration file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let bytes = std::fs::read(path)
			.map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;

		Self::from_json_slice(&bytes)
	}

	/// Checks secrets, lifetimes and rule thresholds.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.access_token_secret.is_empty() {
			return Err(ConfigError::EmptySecret { class: "access" });
		}
		if self.refresh_token_secret.is_empty() {
			return Err(ConfigError::EmptySecret { class: "refresh" });
		}
		if self.access_token_exp_minutes == 0 {
			return Err(ConfigError::NonPositiveTtl { class: "access" });
		}
		if self.refresh_token_exp_days == 0 {
			return Err(ConfigError::NonPositiveTtl { class: "refresh" });
		}

		self.rate_limit_rules.iter().try_for_each(RateLimitRule::validate)
	}

	/// Access token signing secret.
	pub fn access_token_secret(&self) -> &SigningKey {
		&self.access_token_secret
	}

	/// Access token lifetime in minutes.
	pub fn access_token_exp_minutes(&self) -> u64 {
		self.access_token_exp_minutes
	}

	/// Refresh token signing secret.
	pub fn refresh_token_secret(&self) -> &SigningKey {
		&self.refresh_token_secret
	}

	/// Refresh token lifetime in days.
	pub fn refresh_token_exp_days(&self) -> u64 {
		self.refresh_token_exp_days
	}

	/// Failed logins tolerated before an account locks.
	pub fn lock_failed_attempts(&self) -> u32 {
		self.lock_failed_attempts
	}

	/// Lock length in minutes.
	pub fn lock_duration_minutes(&self) -> u32 {
		self.lock_duration_minutes
	}

	/// Configured rate-limit rules, in file order.
	pub fn rate_limit_rules(&self) -> &[RateLimitRule] {
		&self.rate_limit_rules
	}

	/// Lockout policy derived from the lock settings.
	pub fn lockout_policy(&self) -> LockoutPolicy {
		LockoutPolicy::new(
			self.lock_failed_attempts,
			Duration::minutes(i64::from(self.lock_duration_minutes)),
		)
	}

	fn finish(
		parsed: Result<Self, serde_path_to_error::Error<serde_json::Error>>,
	) -> Result<Self, ConfigError> {
		let config = parsed.map_err(ConfigError::parse)?;

		config.validate()?;

		Ok(config)
	}
}

/// Builder for [`TrustConfig`] values.
#[derive(Debug)]
pub struct TrustConfigBuilder {
	config: TrustConfig,
}
impl TrustConfigBuilder {
	/// Creates a builder with 15 minute access tokens, 7 day refresh tokens, default lockout
	/// thresholds and no rate-limit rules.
	pub fn new(
		access_token_secret: impl AsRef<[u8]>,
		refresh_token_secret: impl AsRef<[u8]>,
	) -> Self {
		Self {
			config: TrustConfig {
				access_token_secret: SigningKey::new(access_token_secret),
				access_token_exp_minutes: 15,
				refresh_token_secret: SigningKey::new(refresh_token_secret),
				refresh_token_exp_days: 7,
				lock_failed_attempts: DEFAULT_LOCK_FAILED_ATTEMPTS,
				lock_duration_minutes: DEFAULT_LOCK_DURATION_MINUTES,
				rate_limit_rules: Vec::new(),
			},
		}
	}

	/// Overrides the access token lifetime.
	pub fn access_token_exp_minutes(mut self, minutes: u64) -> Self {
		self.config.access_token_exp_minutes = minutes;

		self
	}

	/// Overrides the refresh token lifetime.
	pub fn refresh_token_exp_days(mut self, days: u64) -> Self {
		self.config.refresh_token_exp_days = days;

		self
	}

	/// Overrides the lockout thresholds.
	pub fn lockout(mut self, failed_attempts: u32, duration_minutes: u32) -> Self {
		self.config.lock_failed_attempts = failed_attempts;
		self.config.lock_duration_minutes = duration_minutes;

		self
	}

	/// Appends one rate-limit rule.
	pub fn rate_limit_rule(mut self, rule: RateLimitRule) -> Self {
		self.config.rate_limit_rules.push(rule);

		self
	}

	/// Appends several rate-limit rules.
	pub fn rate_limit_rules<I>(mut self, rules: I) -> Self
	where
		I: IntoIterator<Item = RateLimitRule>,
	{
		self.config.rate_limit_rules.extend(rules);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<TrustConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

fn default_lock_failed_attempts() -> u32 {
	DEFAULT_LOCK_FAILED_ATTEMPTS
}

fn default_lock_duration_minutes() -> u32 {
	DEFAULT_LOCK_DURATION_MINUTES
}
