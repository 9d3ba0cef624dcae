//! Access and refresh token managers sharing one signed-envelope codec and one blacklist.
//!
//! Both classes validate the same way: the blacklist is consulted first (a revoked token reads as
//! [`TokenValidation::Expired`]), then the signature, then `now > exp`. Each class has its own
//! [`SigningKey`] so leaking one secret does not let an attacker mint the other class.

pub mod access;
pub mod refresh;

pub use access::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{SigningKey, TokenClass, TokenSecret, fingerprint},
	codec::{self, CodecError},
	obs::{self, CheckKind, CheckSpan},
	store::Blacklist,
};

/// Outcome of validating a token of one class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenValidation<C> {
	/// Signature verified, not revoked, and not yet past `exp`.
	Valid(C),
	/// Past `exp`, or revoked.
	Expired,
	/// No separator, or the payload does not decode into claims.
	InvalidFormat,
	/// A segment is not valid base64.
	InvalidBase64,
	/// The signature does not match.
	InvalidSignature,
}
impl<C> TokenValidation<C> {
	/// Returns `true` for [`TokenValidation::Valid`].
	pub fn is_valid(&self) -> bool {
		matches!(self, Self::Valid(_))
	}

	/// Borrows the verified claims, if any.
	pub fn claims(&self) -> Option<&C> {
		match self {
			Self::Valid(claims) => Some(claims),
			_ => None,
		}
	}

	/// Consumes the outcome and returns the verified claims, if any.
	pub fn into_claims(self) -> Option<C> {
		match self {
			Self::Valid(claims) => Some(claims),
			_ => None,
		}
	}

	/// Stable label suitable for log or metric fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::Valid(_) => "valid",
			Self::Expired => "expired",
			Self::InvalidFormat => "invalid_format",
			Self::InvalidBase64 => "invalid_base64",
			Self::InvalidSignature => "invalid_signature",
		}
	}

	/// HTTP status a handler should answer with: 200 when valid, 401 otherwise.
	pub const fn http_status(&self) -> u16 {
		match self {
			Self::Valid(_) => 200,
			_ => 401,
		}
	}
}
impl<C> From<CodecError> for TokenValidation<C> {
	fn from(err: CodecError) -> Self {
		match err {
			CodecError::InvalidFormat => Self::InvalidFormat,
			CodecError::InvalidBase64 => Self::InvalidBase64,
			CodecError::InvalidSignature => Self::InvalidSignature,
		}
	}
}

/// Freshly minted token together with the claims it carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken<C> {
	/// Signed token string.
	pub token: TokenSecret,
	/// Claims embedded in `token`.
	pub claims: C,
}

fn issue_class<C>(
	user_id: u64,
	now: u64,
	lifetime_secs: u64,
	key: &SigningKey,
) -> Result<IssuedToken<C>>
where
	C: TokenClass,
{
	let claims = C::new(user_id, now, now.saturating_add(lifetime_secs));
	let token = codec::encode(&claims, key)?;

	Ok(IssuedToken { token: TokenSecret::new(token), claims })
}

fn validate_class<C>(
	kind: CheckKind,
	token: &str,
	key: &SigningKey,
	now: u64,
	blacklist: &dyn Blacklist,
) -> TokenValidation<C>
where
	C: TokenClass,
{
	let span = CheckSpan::new(kind, "validate").entered();
	let outcome = if blacklist.contains(token) {
		TokenValidation::Expired
	} else {
		match codec::verify::<C>(token, key) {
			Ok(claims) if claims.is_expired_at(now) => TokenValidation::Expired,
			Ok(claims) => TokenValidation::Valid(claims),
			Err(err) => err.into(),
		}
	};

	span.record_outcome(outcome.as_str());
	obs::record_validation(C::LABEL, outcome.as_str());

	if !outcome.is_valid() {
		obs::token_rejected(C::LABEL, outcome.as_str(), &fingerprint(token));
	}

	outcome
}
