/// Records a rate-limit decision via the global metrics recorder (when enabled).
pub fn record_rate_limit(decision: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("trustgate_rate_limit_total", "decision" => decision).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = decision;
	}
}

/// Records a token validation outcome via the global metrics recorder (when enabled).
pub fn record_validation(class: &'static str, outcome: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"trustgate_token_validation_total",
			"class" => class,
			"outcome" => outcome
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (class, outcome);
	}
}
