//! Walks one client through login rate limiting, session issuance, refresh rotation and logout
//! against a manually driven clock.

// std
use std::sync::Arc;
// crates.io
use color_eyre::{Result, eyre::eyre};
use time::{Duration, macros};
// self
use trustgate::{
	clock::ManualClock,
	config::TrustConfig,
	gate::{AuthOutcome, TrustGate},
	limit::Admission,
};

const CONFIG: &str = r#"{
	"access_token_secret": "demo-access-secret",
	"access_token_exp_minutes": 15,
	"refresh_token_secret": "demo-refresh-secret",
	"refresh_token_exp_days": 7,
	"rate_limit_rules": [
		{ "path": "/api/v1/login", "max_requests": 3, "window_seconds": 10 },
		{ "path": "^/api/v1/.*$", "max_requests": 100, "window_seconds": 60 }
	]
}"#;

fn main() -> Result<()> {
	color_eyre::install()?;

	let config = TrustConfig::from_json_str(CONFIG)?;
	let clock = Arc::new(ManualClock::new(macros::datetime!(2025-11-10 12:00 UTC)));
	let gate = TrustGate::new(&config, clock.clone())?;

	for attempt in 1..=5 {
		match gate.admit("203.0.113.7", "/api/v1/login?next=/feed")? {
			Admission::Allow => println!("Login attempt {attempt}: allowed."),
			Admission::Deny(retry) => println!(
				"Login attempt {attempt}: {} (retry in {}s).",
				retry.decision, retry.retry_after_secs
			),
		}
	}

	let session = gate.issue_session(42)?;
	let header = format!("Bearer {}", session.access_token.expose());
	let AuthOutcome::Checked(validation) = gate.authenticate(Some(&header))? else {
		return Err(eyre!("Issued access token was not presented."));
	};

	println!("Fresh access token: {}.", validation.as_str());

	clock.advance(Duration::minutes(20));

	println!("After 20 minutes: {:?}.", gate.authenticate(Some(&header))?);

	let rotated = gate
		.refresh(session.refresh_token.expose(), 42)?
		.map_err(|err| eyre!("Refresh rotation failed: {err}"))?;

	println!(
		"Rotated access token expires in {}s; refresh token unchanged: {}.",
		rotated.access_token_lifetime,
		rotated.refresh_token == session.refresh_token
	);

	gate.logout(rotated.access_token.expose());

	let header = format!("Bearer {}", rotated.access_token.expose());

	println!("After logout: {:?}.", gate.authenticate(Some(&header))?);

	Ok(())
}
