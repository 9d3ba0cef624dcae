//! Structured log events emitted by the trust layer.
//!
//! Each function compiles to a no-op without the `tracing` feature. Token strings are never
//! passed in; callers hand over [`crate::auth::fingerprint`] values instead.

/// A rule was installed at load time.
pub fn rule_loaded(
	path: &str,
	kind: &'static str,
	max_requests: u32,
	window_seconds: u64,
	enabled: bool,
) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(path, kind, max_requests, window_seconds, enabled, "rate limit rule loaded");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (path, kind, max_requests, window_seconds, enabled);
	}
}

/// A pattern rule failed to compile and was dropped.
pub fn rule_dropped(path: &str, reason: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(path, reason, "invalid rate limit pattern dropped");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (path, reason);
	}
}

/// A client just exceeded a rule and entered its block window.
pub fn limit_tripped(key: &str, rule: &str, blocked_for_secs: u64) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(key, rule, blocked_for_secs, "rate limit exceeded");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, rule, blocked_for_secs);
	}
}

/// A request was denied while its client is still blocked.
pub fn limit_blocked(key: &str, rule: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(key, rule, "request denied during block window");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, rule);
	}
}

/// A token was rejected for a routine reason (expiry, format, signature).
pub fn token_rejected(class: &'static str, outcome: &'static str, fingerprint: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(class, outcome, token = fingerprint, "token rejected");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (class, outcome, fingerprint);
	}
}

/// A refresh token was presented for a different user than the one it was minted for.
pub fn rotation_user_mismatch(claimed: u64, actual: u64, fingerprint: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(claimed, actual, token = fingerprint, "refresh token user mismatch");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (claimed, actual, fingerprint);
	}
}

/// A token was added to the blacklist.
pub fn token_revoked(fingerprint: &str, newly_added: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(token = fingerprint, newly_added, "token revoked");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (fingerprint, newly_added);
	}
}
