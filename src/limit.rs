//! Sliding-window request limiter with a fixed 2x escalating block.
//!
//! Records are keyed by `(client key, rule path)`, so every path matched by one pattern rule
//! shares a single budget per client. All state sits behind one mutex that wraps the whole
//! purge, check and mutate sequence, so concurrent checks for the same pair never over-admit.

pub mod rule;
pub mod window;

pub use rule::*;
pub use window::*;

// self
use crate::{
	_prelude::*,
	obs::{self, CheckKind, CheckSpan},
};

/// Decision for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitDecision {
	/// The request may proceed.
	Allowed,
	/// This request tripped the limit and started the block window.
	RateLimited,
	/// A previously tripped limit is still cooling down.
	Blocked,
}
impl RateLimitDecision {
	/// Returns `true` for [`RateLimitDecision::Allowed`].
	pub const fn is_allowed(self) -> bool {
		matches!(self, Self::Allowed)
	}

	/// HTTP status a handler should answer with: 200 or 429.
	pub const fn http_status(self) -> u16 {
		match self {
			Self::Allowed => 200,
			Self::RateLimited | Self::Blocked => 429,
		}
	}

	/// Stable label suitable for log or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Allowed => "allowed",
			Self::RateLimited => "rate_limited",
			Self::Blocked => "blocked",
		}
	}
}
impl Display for RateLimitDecision {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Advises callers when to retry a denied request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Denial that produced this directive.
	pub decision: RateLimitDecision,
	/// Whole seconds to wait, suitable for a `Retry-After` header.
	pub retry_after_secs: u64,
	/// Instant when the block lifts.
	pub earliest_retry_at: OffsetDateTime,
}
impl RetryDirective {
	/// Creates a directive for a denial observed at `now` under a block ending at `blocked_until`.
	///
	/// `retry_after_secs` is the floor of the remaining block and never negative.
	pub fn new(
		decision: RateLimitDecision,
		now: OffsetDateTime,
		blocked_until: OffsetDateTime,
	) -> Self {
		let retry_after_secs = if now < blocked_until {
			u64::try_from((blocked_until - now).whole_seconds()).unwrap_or(0)
		} else {
			0
		};

		Self { decision, retry_after_secs, earliest_retry_at: blocked_until }
	}
}

/// Result of [`RateLimiter::admit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Admission {
	/// The request may proceed.
	Allow,
	/// The request is denied until the directive says otherwise.
	Deny(RetryDirective),
}
impl Admission {
	/// Returns `true` for [`Admission::Allow`].
	pub fn is_allowed(&self) -> bool {
		matches!(self, Self::Allow)
	}

	/// Retry hint carried by a denial.
	pub fn retry(&self) -> Option<&RetryDirective> {
		match self {
			Self::Allow => None,
			Self::Deny(directive) => Some(directive),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RecordKey {
	client: String,
	rule: String,
}
impl RecordKey {
	fn new(client: &str, rule: &RateLimitRule) -> Self {
		Self { client: client.to_owned(), rule: rule.path.clone() }
	}
}

#[derive(Debug)]
struct Tracked {
	record: RequestRecord,
	window: Duration,
}

/// Shared, thread-safe limiter over a compiled [`RuleSet`].
#[derive(Debug)]
pub struct RateLimiter {
	rules: RuleSet,
	records: Mutex<HashMap<RecordKey, Tracked>>,
}
impl RateLimiter {
	/// Creates a limiter enforcing `rules`.
	pub fn new(rules: RuleSet) -> Self {
		Self { rules, records: Mutex::new(HashMap::new()) }
	}

	/// Compiled rules in force.
	pub fn rules(&self) -> &RuleSet {
		&self.rules
	}

	/// Decides whether `key` may request `path` at `now`.
	///
	/// A disabled exact rule falls through to the first enabled matching pattern. Paths that end
	/// up without an enabled rule are always allowed and leave no record behind.
	pub fn check(&self, key: &str, path: &str, now: OffsetDateTime) -> RateLimitDecision {
		let span = CheckSpan::new(CheckKind::RateLimit, "check").entered();
		let decision = match self.enforced_rule(path) {
			Some(rule) => {
				let mut records = self.records.lock();

				Self::admit_locked(&mut records, key, rule, now)
			},
			None => RateLimitDecision::Allowed,
		};

		span.record_outcome(decision.as_str());
		obs::record_rate_limit(decision.as_str());

		decision
	}

	/// Like [`RateLimiter::check`], but also computes the retry hint under the same lock.
	pub fn admit(&self, key: &str, path: &str, now: OffsetDateTime) -> Admission {
		let span = CheckSpan::new(CheckKind::RateLimit, "admit").entered();
		let Some(rule) = self.enforced_rule(path) else {
			span.record_outcome(RateLimitDecision::Allowed.as_str());
			obs::record_rate_limit(RateLimitDecision::Allowed.as_str());

			return Admission::Allow;
		};
		let mut records = self.records.lock();
		let decision = Self::admit_locked(&mut records, key, rule, now);

		span.record_outcome(decision.as_str());
		obs::record_rate_limit(decision.as_str());

		if decision.is_allowed() {
			return Admission::Allow;
		}

		let blocked_until = records
			.get(&RecordKey::new(key, rule))
			.and_then(|tracked| tracked.record.blocked_until())
			.unwrap_or(now);

		Admission::Deny(RetryDirective::new(decision, now, blocked_until))
	}

	/// Whole seconds before `key` may retry `path`; `0` when no block is active.
	pub fn retry_after(&self, key: &str, path: &str, now: OffsetDateTime) -> u64 {
		let Some(rule) = self.rules.resolve(path) else {
			return 0;
		};

		self.records
			.lock()
			.get(&RecordKey::new(key, rule))
			.map_or(0, |tracked| tracked.record.retry_after(now))
	}

	/// Requests `key` may still make against `path` at `now`; `None` when the path is unmetered.
	pub fn remaining(&self, key: &str, path: &str, now: OffsetDateTime) -> Option<u32> {
		let rule = self.enforced_rule(path)?;
		let remaining = self.records.lock().get(&RecordKey::new(key, rule)).map_or(
			rule.max_requests,
			|tracked| tracked.record.remaining(now, rule.max_requests, tracked.window),
		);

		Some(remaining)
	}

	/// Drops every record, lifting all blocks.
	pub fn clear(&self) {
		self.records.lock().clear();
	}

	/// Evicts records with no live timestamp and no active block, returning how many went.
	///
	/// Nothing is evicted unless this is called.
	pub fn sweep(&self, now: OffsetDateTime) -> usize {
		let mut records = self.records.lock();
		let before = records.len();

		records.retain(|_, tracked| !tracked.record.is_idle(now, tracked.window));

		before - records.len()
	}

	/// Number of `(client, rule)` records currently held.
	pub fn tracked_records(&self) -> usize {
		self.records.lock().len()
	}

	fn enforced_rule(&self, path: &str) -> Option<&Arc<RateLimitRule>> {
		self.rules.resolve_enabled(path)
	}

	fn admit_locked(
		records: &mut HashMap<RecordKey, Tracked>,
		key: &str,
		rule: &RateLimitRule,
		now: OffsetDateTime,
	) -> RateLimitDecision {
		let window = rule.window();
		let block = rule.block_duration();
		let tracked = records
			.entry(RecordKey::new(key, rule))
			.or_insert_with(|| Tracked { record: RequestRecord::default(), window });
		let decision = tracked.record.admit(now, rule.max_requests, window, block);

		match decision {
			RateLimitDecision::RateLimited => obs::limit_tripped(
				key,
				&rule.path,
				u64::try_from(block.whole_seconds()).unwrap_or(0),
			),
			RateLimitDecision::Blocked => obs::limit_blocked(key, &rule.path),
			RateLimitDecision::Allowed => {},
		}

		decision
	}
}

/// Strips the query string so `/login?next=/` matches the `/login` rule.
pub fn normalize_path(path: &str) -> &str {
	path.split_once('?').map_or(path, |(route, _)| route)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn rule(path: &str, max_requests: u32, window_seconds: u64) -> RateLimitRule {
		RateLimitRule { path: path.into(), max_requests, window_seconds, enabled: true }
	}

	fn limiter(rules: impl IntoIterator<Item = RateLimitRule>) -> RateLimiter {
		RateLimiter::new(RuleSet::compile(rules).expect("Rules should compile."))
	}

	fn epoch() -> OffsetDateTime {
		datetime!(2025-11-10 12:00 UTC)
	}

	#[test]
	fn fourth_request_trips_and_fifth_is_blocked() {
		let limiter = limiter([rule("/api/v1/login", 3, 10)]);
		let t0 = epoch();
		let decisions = (0..5)
			.map(|i| limiter.check("10.0.0.1", "/api/v1/login", t0 + Duration::seconds(i)))
			.collect::<Vec<_>>();

		assert_eq!(
			decisions,
			[
				RateLimitDecision::Allowed,
				RateLimitDecision::Allowed,
				RateLimitDecision::Allowed,
				RateLimitDecision::RateLimited,
				RateLimitDecision::Blocked,
			]
		);
		let later = t0 + Duration::seconds(4);

		assert_eq!(limiter.retry_after("10.0.0.1", "/api/v1/login", later), 19);
		assert_eq!(limiter.remaining("10.0.0.1", "/api/v1/login", later), Some(0));
	}

	#[test]
	fn block_lifts_after_twice_the_window_and_resets_budget() {
		let limiter = limiter([rule("/api/v1/login", 3, 10)]);
		let t0 = epoch();

		for _ in 0..4 {
			limiter.check("k", "/api/v1/login", t0);
		}

		let lifted = t0 + Duration::seconds(20);

		for _ in 0..3 {
			assert_eq!(limiter.check("k", "/api/v1/login", lifted), RateLimitDecision::Allowed);
		}

		assert_eq!(limiter.check("k", "/api/v1/login", lifted), RateLimitDecision::RateLimited);
	}

	#[test]
	fn clients_and_rules_are_isolated() {
		let limiter = limiter([rule("/login", 1, 10), rule("/signup", 1, 10)]);
		let t0 = epoch();

		assert!(limiter.check("a", "/login", t0).is_allowed());
		assert!(limiter.check("b", "/login", t0).is_allowed());
		assert!(limiter.check("a", "/signup", t0).is_allowed());
		assert_eq!(limiter.check("a", "/login", t0), RateLimitDecision::RateLimited);
		assert_eq!(limiter.tracked_records(), 3);
	}

	#[test]
	fn one_pattern_shares_a_budget_across_paths() {
		let limiter = limiter([rule("/api/.*", 2, 60)]);
		let t0 = epoch();

		assert!(limiter.check("k", "/api/a", t0).is_allowed());
		assert!(limiter.check("k", "/api/b", t0).is_allowed());
		assert_eq!(limiter.check("k", "/api/c", t0), RateLimitDecision::RateLimited);
		assert_eq!(limiter.retry_after("k", "/api/a", t0), 120);
	}

	#[test]
	fn unmetered_and_disabled_paths_always_pass() {
		let disabled = RateLimitRule { enabled: false, ..rule("/admin", 1, 10) };
		let disabled_pattern = RateLimitRule { enabled: false, ..rule("/assets/.*", 1, 10) };
		let limiter = limiter([rule("/login", 1, 10), disabled, disabled_pattern]);
		let t0 = epoch();

		for _ in 0..1_000 {
			assert!(limiter.check("k", "/static/app.js", t0).is_allowed());
			assert!(limiter.check("k", "/admin", t0).is_allowed());
			assert!(limiter.check("k", "/assets/app.css", t0).is_allowed());
		}

		assert_eq!(limiter.tracked_records(), 0);
		assert_eq!(limiter.remaining("k", "/static/app.js", t0), None);
		assert_eq!(limiter.remaining("k", "/admin", t0), None);
		assert_eq!(limiter.retry_after("k", "/admin", t0), 0);
	}

	#[test]
	fn disabled_exact_rule_falls_through_to_pattern() {
		let disabled_login = RateLimitRule { enabled: false, ..rule("/api/v1/login", 3, 10) };
		let limiter = limiter([disabled_login, rule("/api/v1/.*", 2, 10)]);
		let t0 = epoch();
		let admitted =
			(0..5).filter(|_| limiter.check("k", "/api/v1/login", t0).is_allowed()).count();

		assert_eq!(admitted, 2);
		assert_eq!(limiter.tracked_records(), 1);
		assert_eq!(limiter.remaining("k", "/api/v1/login", t0), Some(0));
		assert_eq!(
			limiter.check("k", "/api/v1/articles", t0),
			RateLimitDecision::Blocked,
			"The pattern budget is shared with the fallen-through path."
		);
	}

	#[test]
	fn retry_directive_points_at_the_block_deadline() {
		let limiter = limiter([rule("/login", 1, 10)]);
		let t0 = epoch();
		let tripped = t0 + Duration::milliseconds(700);

		assert!(limiter.admit("k", "/login", t0).is_allowed());

		let denied = limiter.admit("k", "/login", tripped);
		let directive = denied.retry().expect("Second request should be denied.");

		assert_eq!(directive.retry_after_secs, 20);
		assert_eq!(directive.earliest_retry_at, tripped + Duration::seconds(20));

		let later = tripped + Duration::milliseconds(5_400);
		let blocked = limiter.admit("k", "/login", later);
		let directive = blocked.retry().expect("Blocked request should be denied.");

		assert_eq!(directive.decision, RateLimitDecision::Blocked);
		assert_eq!(directive.retry_after_secs, 14);
		assert_eq!(directive.earliest_retry_at, tripped + Duration::seconds(20));
	}

	#[test]
	fn retry_directive_for_an_elapsed_block_is_immediate() {
		let t0 = epoch();
		let directive = RetryDirective::new(RateLimitDecision::Blocked, t0, t0 - Duration::seconds(1));

		assert_eq!(directive.retry_after_secs, 0);
		assert_eq!(directive.earliest_retry_at, t0 - Duration::seconds(1));
	}

	#[test]
	fn huge_blocks_do_not_overflow_retry_directives() {
		let t0 = epoch();
		let directive = RetryDirective::new(RateLimitDecision::RateLimited, t0, far_future());

		assert_eq!(directive.earliest_retry_at, far_future());
		assert!(directive.retry_after_secs > 0);
	}

	#[test]
	fn admit_attaches_retry_directive() {
		let limiter = limiter([rule("/login", 1, 30)]);
		let t0 = epoch();

		assert_eq!(limiter.admit("k", "/login", t0), Admission::Allow);

		let denied = limiter.admit("k", "/login", t0);
		let directive = denied.retry().expect("Second request should be denied.");

		assert_eq!(directive.decision, RateLimitDecision::RateLimited);
		assert_eq!(directive.retry_after_secs, 60);
		assert_eq!(directive.earliest_retry_at, t0 + Duration::seconds(60));
		assert_eq!(directive.decision.http_status(), 429);

		let blocked = limiter.admit("k", "/login", t0 + Duration::seconds(59));

		assert_eq!(
			blocked.retry().map(|d| (d.decision, d.retry_after_secs)),
			Some((RateLimitDecision::Blocked, 1))
		);
	}

	#[test]
	fn sweep_evicts_only_idle_records() {
		let limiter = limiter([rule("/login", 1, 10), rule("/feed", 5, 10)]);
		let t0 = epoch();

		limiter.check("blocked", "/login", t0);
		limiter.check("blocked", "/login", t0);
		limiter.check("reader", "/feed", t0);

		assert_eq!(limiter.sweep(t0 + Duration::seconds(5)), 0);
		assert_eq!(limiter.sweep(t0 + Duration::seconds(11)), 1);
		assert_eq!(limiter.tracked_records(), 1);
		assert_eq!(limiter.sweep(t0 + Duration::seconds(20)), 1);
		assert_eq!(limiter.tracked_records(), 0);
	}

	#[test]
	fn clear_lifts_blocks() {
		let limiter = limiter([rule("/login", 1, 10)]);
		let t0 = epoch();

		limiter.check("k", "/login", t0);
		limiter.check("k", "/login", t0);
		limiter.clear();

		assert!(limiter.check("k", "/login", t0).is_allowed());
	}

	#[test]
	fn normalize_path_strips_query() {
		assert_eq!(normalize_path("/api/v1/login?next=/home"), "/api/v1/login");
		assert_eq!(normalize_path("/api/v1/login"), "/api/v1/login");
		assert_eq!(normalize_path("?"), "");
	}

	#[test]
	fn concurrent_checks_never_over_admit() {
		let limiter = Arc::new(limiter([rule("/login", 50, 60)]));
		let t0 = epoch();
		let handles = (0..8)
			.map(|_| {
				let limiter = limiter.clone();

				std::thread::spawn(move || {
					(0..25).filter(|_| limiter.check("k", "/login", t0).is_allowed()).count()
				})
			})
			.collect::<Vec<_>>();
		let admitted = handles
			.into_iter()
			.map(|handle| handle.join().expect("Worker thread should not panic."))
			.sum::<usize>();

		assert_eq!(admitted, 50);
	}
}
