//! Rate-limit rules and their one-time compilation into exact and pattern tables.

// crates.io
use regex::Regex;
// self
use crate::{_prelude::*, error::ConfigError, obs};

/// Longest accepted window: ten years.
pub const MAX_WINDOW_SECONDS: u64 = 10 * 365 * 86_400;

const PATTERN_METACHARACTERS: &[char] =
	&['^', '$', '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '\\'];

/// One configured limit: at most `max_requests` per `window_seconds` for paths matching `path`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimitRule {
	/// Literal route, or a regular expression when it contains metacharacters.
	pub path: String,
	/// Requests admitted per window.
	pub max_requests: u32,
	/// Window length in seconds.
	pub window_seconds: u64,
	/// Disabled rules are skipped; an exact path then falls through to the patterns.
	#[serde(default = "default_enabled")]
	pub enabled: bool,
}
impl RateLimitRule {
	/// Returns `true` if `path` must be compiled as a pattern.
	pub fn is_pattern(&self) -> bool {
		is_pattern(&self.path)
	}

	/// Window as a duration.
	pub fn window(&self) -> Duration {
		Duration::seconds(i64::try_from(self.window_seconds).unwrap_or(i64::MAX))
	}

	/// Block applied once the limit trips: twice the window.
	pub fn block_duration(&self) -> Duration {
		self.window().saturating_mul(2)
	}

	/// Rejects rules whose thresholds can never admit a request.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let reason = if self.path.is_empty() {
			"path cannot be empty"
		} else if self.max_requests == 0 {
			"max_requests must be positive"
		} else if self.window_seconds == 0 {
			"window_seconds must be positive"
		} else if self.window_seconds > MAX_WINDOW_SECONDS {
			"window_seconds is too large"
		} else {
			return Ok(());
		};

		Err(ConfigError::InvalidRule { path: self.path.clone(), reason })
	}
}

/// Returns `true` if `path` contains any regular-expression metacharacter.
pub fn is_pattern(path: &str) -> bool {
	path.contains(PATTERN_METACHARACTERS)
}

#[derive(Clone, Debug)]
struct PatternRule {
	rule: Arc<RateLimitRule>,
	regex: Regex,
}

/// Compiled rule tables: exact paths by map lookup, then patterns in configuration order.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
	exact: HashMap<String, Arc<RateLimitRule>>,
	patterns: Vec<PatternRule>,
}
impl RuleSet {
	/// Classifies and compiles `rules`.
	///
	/// Patterns are anchored so they must match the whole path. A pattern that fails to compile
	/// is dropped with a warning. A later literal rule for the same path replaces an earlier one.
	pub fn compile(rules: impl IntoIterator<Item = RateLimitRule>) -> Result<Self, ConfigError> {
		let mut set = Self::default();

		for rule in rules {
			rule.validate()?;

			if rule.is_pattern() {
				match Regex::new(&format!("^(?:{})$", rule.path)) {
					Ok(regex) => {
						obs::rule_loaded(
							&rule.path,
							"pattern",
							rule.max_requests,
							rule.window_seconds,
							rule.enabled,
						);
						set.patterns.push(PatternRule { rule: Arc::new(rule), regex });
					},
					Err(err) => obs::rule_dropped(&rule.path, &err.to_string()),
				}
			} else {
				obs::rule_loaded(
					&rule.path,
					"exact",
					rule.max_requests,
					rule.window_seconds,
					rule.enabled,
				);
				set.exact.insert(rule.path.clone(), Arc::new(rule));
			}
		}

		Ok(set)
	}

	/// Finds the rule configured for `path`: an exact entry wins, otherwise the first matching
	/// pattern. The `enabled` flag is not consulted.
	pub fn resolve(&self, path: &str) -> Option<&Arc<RateLimitRule>> {
		self.exact.get(path).or_else(|| {
			self.patterns.iter().find(|pattern| pattern.regex.is_match(path)).map(|p| &p.rule)
		})
	}

	/// Finds the rule that limits `path`.
	///
	/// An enabled exact entry wins. Otherwise the first enabled pattern matching `path` applies,
	/// so a disabled exact rule falls through to the patterns.
	pub fn resolve_enabled(&self, path: &str) -> Option<&Arc<RateLimitRule>> {
		self.exact.get(path).filter(|rule| rule.enabled).or_else(|| {
			self.patterns
				.iter()
				.find(|pattern| pattern.rule.enabled && pattern.regex.is_match(path))
				.map(|p| &p.rule)
		})
	}

	/// Number of literal rules installed.
	pub fn exact_len(&self) -> usize {
		self.exact.len()
	}

	/// Number of pattern rules installed.
	pub fn pattern_len(&self) -> usize {
		self.patterns.len()
	}

	/// Returns `true` if no rule was installed.
	pub fn is_empty(&self) -> bool {
		self.exact.is_empty() && self.patterns.is_empty()
	}
}

fn default_enabled() -> bool {
	true
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn rule(path: &str, max_requests: u32) -> RateLimitRule {
		RateLimitRule { path: path.into(), max_requests, window_seconds: 10, enabled: true }
	}

	#[test]
	fn classification_follows_metacharacters() {
		assert!(!is_pattern("/api/v1/login"));
		assert!(!is_pattern("/api/v1/user-profile_2"));

		for path in ["^/a", "/a$", "/a.b", "/a*", "/a+", "/a?", "(a)", "[a]", "a{2}", "a|b", r"\d"] {
			assert!(is_pattern(path), "`{path}` should be treated as a pattern.");
		}
	}

	#[test]
	fn exact_rules_win_over_patterns() {
		let set = RuleSet::compile([rule("/api/v1/.*", 100), rule("/api/v1/login", 3)])
			.expect("Rules should compile.");

		assert_eq!(set.exact_len(), 1);
		assert_eq!(set.pattern_len(), 1);
		assert_eq!(set.resolve("/api/v1/login").map(|r| r.max_requests), Some(3));
		assert_eq!(set.resolve("/api/v1/articles").map(|r| r.max_requests), Some(100));
		assert!(set.resolve("/static/index.html").is_none());
	}

	#[test]
	fn patterns_match_whole_path_in_order() {
		let set = RuleSet::compile([rule("/api/v1/art.*", 5), rule("/api/.*", 50)])
			.expect("Rules should compile.");

		assert_eq!(set.resolve("/api/v1/articles").map(|r| r.max_requests), Some(5));
		assert_eq!(set.resolve("/api/v2/articles").map(|r| r.max_requests), Some(50));
		assert!(set.resolve("/mirror/api/v1/articles").is_none(), "Patterns are anchored.");
	}

	#[test]
	fn malformed_patterns_are_dropped() {
		let set = RuleSet::compile([rule("/api/(v1", 5), rule("/api/v1/login", 3)])
			.expect("Malformed patterns must not fail compilation.");

		assert_eq!(set.pattern_len(), 0);
		assert_eq!(set.exact_len(), 1);
		assert!(set.resolve("/api/(v1").is_none());
	}

	#[test]
	fn later_literal_replaces_earlier() {
		let set = RuleSet::compile([rule("/login", 3), rule("/login", 7)])
			.expect("Rules should compile.");

		assert_eq!(set.resolve("/login").map(|r| r.max_requests), Some(7));
	}

	#[test]
	fn degenerate_rules_are_rejected() {
		let err = RuleSet::compile([rule("/login", 0)]).expect_err("Zero max_requests is invalid.");

		assert!(matches!(err, ConfigError::InvalidRule { reason: "max_requests must be positive", .. }));

		let zero_window = RateLimitRule { window_seconds: 0, ..rule("/login", 1) };

		assert!(RuleSet::compile([zero_window]).is_err());

		let huge_window = RateLimitRule { window_seconds: 1_000_000_000_000, ..rule("/login", 1) };
		let err = RuleSet::compile([huge_window]).expect_err("Windows beyond ten years are invalid.");

		assert!(matches!(err, ConfigError::InvalidRule { reason: "window_seconds is too large", .. }));

		let longest = RateLimitRule { window_seconds: MAX_WINDOW_SECONDS, ..rule("/login", 1) };

		assert!(RuleSet::compile([longest]).is_ok());
	}

	#[test]
	fn disabled_rules_fall_through_to_enabled_patterns() {
		let set = RuleSet::compile([
			RateLimitRule { enabled: false, ..rule("/api/v1/login", 3) },
			RateLimitRule { enabled: false, ..rule("/api/v1/art.*", 5) },
			rule("/api/v1/.*", 50),
		])
		.expect("Rules should compile.");

		assert_eq!(set.resolve("/api/v1/login").map(|r| r.max_requests), Some(3));
		assert_eq!(set.resolve_enabled("/api/v1/login").map(|r| r.max_requests), Some(50));
		assert_eq!(set.resolve("/api/v1/articles").map(|r| r.max_requests), Some(5));
		assert_eq!(set.resolve_enabled("/api/v1/articles").map(|r| r.max_requests), Some(50));

		let only_disabled = RuleSet::compile([RateLimitRule { enabled: false, ..rule("/admin", 1) }])
			.expect("Rules should compile.");

		assert!(only_disabled.resolve("/admin").is_some());
		assert!(only_disabled.resolve_enabled("/admin").is_none());
	}

	#[test]
	fn enabled_defaults_to_true() {
		let rule: RateLimitRule =
			serde_json::from_str(r#"{"path":"/login","max_requests":3,"window_seconds":10}"#)
				.expect("Rule should deserialize without `enabled`.");

		assert!(rule.enabled);
		assert_eq!(rule.block_duration(), Duration::seconds(20));
	}
}
