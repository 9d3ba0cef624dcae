//! Random single-purpose tokens for email verification, password resets, and similar links.
//!
//! Unlike bearer tokens these carry no claims: the caller stores the string next to the account
//! row and compares it on redemption. The layout is
//! `<prefix>_<base64url(16 random bytes)>_<low 32 bits of the issue millisecond, 8 hex digits>`.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
// self
use crate::{_prelude::*, auth::secret::TokenSecret, clock};

const RANDOM_BYTES: usize = 16;

/// Purpose of an opaque token, which fixes its prefix and lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpaqueKind {
	/// Password reset link, valid for one hour.
	ResetPassword,
	/// Email verification link, valid for 24 hours.
	VerifyEmail,
	/// Opaque refresh handle, valid for seven days.
	Refresh,
	/// Anything else, valid for one hour.
	Generic,
}
impl OpaqueKind {
	/// Prefix written before the random segment.
	pub const fn prefix(self) -> &'static str {
		match self {
			OpaqueKind::ResetPassword => "rst",
			OpaqueKind::VerifyEmail => "vrf",
			OpaqueKind::Refresh => "rfr",
			OpaqueKind::Generic => "tok",
		}
	}

	/// Lifetime granted at issuance.
	pub const fn lifetime(self) -> Duration {
		match self {
			OpaqueKind::VerifyEmail => Duration::hours(24),
			OpaqueKind::Refresh => Duration::days(7),
			OpaqueKind::ResetPassword | OpaqueKind::Generic => Duration::hours(1),
		}
	}

	/// Recovers the kind from a token's prefix.
	pub fn from_token(token: &str) -> Option<Self> {
		let (prefix, _) = token.split_once('_')?;

		[Self::ResetPassword, Self::VerifyEmail, Self::Refresh, Self::Generic]
			.into_iter()
			.find(|kind| kind.prefix() == prefix)
	}
}

/// Freshly generated opaque token with its expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpaqueToken {
	/// Purpose of the token.
	pub kind: OpaqueKind,
	/// Token string; callers must avoid logging it.
	pub value: TokenSecret,
	/// Expiry in unix seconds.
	pub expires_at: u64,
}
impl OpaqueToken {
	/// Generates a token of `kind` issued at `now`.
	pub fn generate(kind: OpaqueKind, now: OffsetDateTime) -> Result<Self> {
		let issued_seconds = clock::unix_seconds(now)?;
		let lifetime = kind.lifetime().whole_seconds().unsigned_abs();
		let mut bytes = [0_u8; RANDOM_BYTES];

		rand::rng().fill(&mut bytes);

		let millis = (now.unix_timestamp_nanos() / 1_000_000) as u64;
		let value = format!(
			"{}_{}_{:08x}",
			kind.prefix(),
			URL_SAFE_NO_PAD.encode(bytes),
			millis & 0xFFFF_FFFF
		);

		Ok(Self {
			kind,
			value: TokenSecret::new(value),
			expires_at: issued_seconds.saturating_add(lifetime),
		})
	}

	/// Returns `true` once `now` (unix seconds) is strictly past the expiry.
	pub fn is_expired_at(&self, now: u64) -> bool {
		now > self.expires_at
	}
}
