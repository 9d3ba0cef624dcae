//! Per-(client, rule) sliding window with an escalating block.

// crates.io
use time::Date;
// self
use crate::{_prelude::*, limit::RateLimitDecision};

/// Admission history for one client under one rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestRecord {
	timestamps: VecDeque<OffsetDateTime>,
	blocked_until: Option<OffsetDateTime>,
}
impl RequestRecord {
	/// Admits or denies one request at `now`.
	///
	/// A tripped limit holds for the whole block window even if the sliding window has drained.
	/// Once the block elapses the window restarts empty.
	pub fn admit(
		&mut self,
		now: OffsetDateTime,
		max_requests: u32,
		window: Duration,
		block: Duration,
	) -> RateLimitDecision {
		if let Some(until) = self.blocked_until {
			if now < until {
				return RateLimitDecision::Blocked;
			}

			self.blocked_until = None;
			self.timestamps.clear();
		}

		self.purge(now, window);

		if self.timestamps.len() >= max_requests as usize {
			self.blocked_until = Some(now.checked_add(block).unwrap_or_else(far_future));

			return RateLimitDecision::RateLimited;
		}

		self.timestamps.push_back(now);

		RateLimitDecision::Allowed
	}

	/// Whole seconds left on an active block, `0` when none.
	pub fn retry_after(&self, now: OffsetDateTime) -> u64 {
		match self.blocked_until {
			Some(until) if now < until => u64::try_from((until - now).whole_seconds()).unwrap_or(0),
			_ => 0,
		}
	}

	/// Requests still admissible at `now` without mutating the record.
	pub fn remaining(&self, now: OffsetDateTime, max_requests: u32, window: Duration) -> u32 {
		if self.blocked_until.is_some_and(|until| now < until) {
			return 0;
		}
		if self.blocked_until.is_some() {
			return max_requests;
		}

		let live = self.timestamps.iter().filter(|&&ts| now - ts <= window).count();

		max_requests.saturating_sub(u32::try_from(live).unwrap_or(u32::MAX))
	}

	/// Active block deadline, if any.
	pub fn blocked_until(&self) -> Option<OffsetDateTime> {
		self.blocked_until
	}

	/// Returns `true` when the record holds no live timestamp and no active block.
	pub fn is_idle(&self, now: OffsetDateTime, window: Duration) -> bool {
		self.blocked_until.is_none_or(|until| now >= until)
			&& self.timestamps.iter().all(|&ts| now - ts > window)
	}

	fn purge(&mut self, now: OffsetDateTime, window: Duration) {
		self.timestamps.retain(|&ts| now - ts <= window);
	}
}

/// Latest representable instant, used when a block would overflow the calendar.
pub fn far_future() -> OffsetDateTime {
	Date::MAX.midnight().assume_utc()
}
