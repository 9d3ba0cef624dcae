// self
use crate::{_prelude::*, obs::CheckKind};

/// A span builder used around synchronous checks.
///
/// Every span carries an empty `outcome` field that the check fills in once it has decided.
#[derive(Clone, Debug)]
pub struct CheckSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CheckSpan {
	/// Creates a new span tagged with the provided check kind + stage.
	pub fn new(kind: CheckKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!(
				"trustgate.check",
				check = kind.as_str(),
				stage,
				outcome = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span for the rest of the enclosing scope.
	pub fn entered(self) -> CheckSpanGuard {
		#[cfg(feature = "tracing")]
		{
			CheckSpanGuard { span: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			CheckSpanGuard {}
		}
	}
}

/// RAII guard returned by [`CheckSpan::entered`].
pub struct CheckSpanGuard {
	#[cfg(feature = "tracing")]
	span: tracing::span::EnteredSpan,
}
impl CheckSpanGuard {
	/// Records the check's outcome label on the entered span.
	pub fn record_outcome(&self, outcome: &'static str) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}

}
impl Debug for CheckSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CheckSpanGuard(..)")
	}
}
