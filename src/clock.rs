//! Time sources consumed by the trust layer.
//!
//! Claims carry whole unix seconds. The limiter keeps full [`OffsetDateTime`] precision and only
//! floors to seconds when it reports a retry hint. [`unix_seconds`] is the single conversion from
//! a clock instant to claim seconds.

// self
use crate::_prelude::*;

/// Failures raised while reading the current time.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClockError {
	/// The clock reported an instant before the unix epoch.
	#[error("Clock reported an instant before the unix epoch.")]
	BeforeEpoch,
	/// The time source could not be reached.
	#[error("Time source is unreachable: {reason}.")]
	Unreachable {
		/// Provider-supplied reason string.
		reason: String,
	},
}

/// Source of the current instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> Result<OffsetDateTime, ClockError>;
}
impl<T> Clock for Arc<T>
where
	T: ?Sized + Clock,
{
	fn now(&self) -> Result<OffsetDateTime, ClockError> {
		(**self).now()
	}
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> Result<OffsetDateTime, ClockError> {
		Ok(OffsetDateTime::now_utc())
	}
}

/// Manually driven clock for tests and demos.
#[derive(Debug)]
pub struct ManualClock(Mutex<OffsetDateTime>);
impl ManualClock {
	/// Creates a clock frozen at `instant`.
	pub fn new(instant: OffsetDateTime) -> Self {
		Self(Mutex::new(instant))
	}

	/// Moves the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}

	/// Moves the clock forward by `delta`.
	pub fn advance(&self, delta: Duration) {
		let mut guard = self.0.lock();

		*guard += delta;
	}

	/// Returns the frozen instant without going through [`Clock`].
	pub fn instant(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}
impl Clock for ManualClock {
	fn now(&self) -> Result<OffsetDateTime, ClockError> {
		Ok(self.instant())
	}
}

/// Converts a clock instant into whole unix seconds for claims.
pub fn unix_seconds(instant: OffsetDateTime) -> Result<u64, ClockError> {
	u64::try_from(instant.unix_timestamp()).map_err(|_| ClockError::BeforeEpoch)
}

/// Converts a millisecond unix timestamp into claim seconds by flooring.
///
/// Use this once, at the edge where a millisecond clock enters the crate.
pub const fn unix_seconds_from_millis(millis: u64) -> u64 {
	millis / 1_000
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn unix_seconds_rejects_pre_epoch_instants() {
		assert_eq!(
			unix_seconds(macros::datetime!(1969-12-31 23:59 UTC)),
			Err(ClockError::BeforeEpoch)
		);
		assert_eq!(unix_seconds(macros::datetime!(1970-01-01 00:01 UTC)), Ok(60));
	}

	#[test]
	fn millisecond_conversion_floors_once() {
		let millis = 1_762_776_000_999;
		let seconds = unix_seconds_from_millis(millis);

		assert_eq!(seconds, 1_762_776_000);
		// A second application would collapse the value by another factor of one thousand.
		assert_ne!(unix_seconds_from_millis(seconds), seconds);
	}

	#[test]
	fn manual_clock_advances() {
		let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));

		clock.advance(Duration::seconds(90));

		assert_eq!(clock.now(), Ok(macros::datetime!(2025-01-01 00:01:30 UTC)));

		clock.set(macros::datetime!(2025-06-01 00:00 UTC));

		assert_eq!(clock.instant(), macros::datetime!(2025-06-01 00:00 UTC));
	}
}
