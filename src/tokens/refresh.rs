//! Long-lived refresh tokens and access-token rotation.
//!
//! Rotation never re-signs or extends the refresh token. It expires on its original schedule no
//! matter how often it is used, which forces periodic re-authentication.

// self
use crate::{
	_prelude::*,
	auth::{RefreshClaims, SigningKey, TokenBundle, TokenSecret, fingerprint},
	obs::{self, CheckKind, CheckSpan},
	store::Blacklist,
	tokens::{self, AccessTokenManager, IssuedToken, TokenValidation},
};

/// Reasons a refresh token cannot be exchanged for a new access token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum RotationError {
	/// The refresh token is past `exp` or revoked.
	#[error("Refresh token has expired.")]
	Expired,
	/// The refresh token is malformed.
	#[error("Refresh token is malformed.")]
	InvalidFormat,
	/// A refresh token segment is not valid base64.
	#[error("Refresh token is not valid base64.")]
	InvalidBase64,
	/// The refresh token signature does not match.
	#[error("Refresh token signature does not match.")]
	InvalidSignature,
	/// The refresh token belongs to another user.
	#[error("Refresh token was issued to user {actual}, not user {claimed}.")]
	UserMismatch {
		/// User id asserted by the caller.
		claimed: u64,
		/// User id carried in the verified claims.
		actual: u64,
	},
}
impl RotationError {
	/// Returns `true` when the failure hints at a stolen or swapped token rather than routine
	/// expiry.
	pub fn is_possible_theft(&self) -> bool {
		matches!(self, Self::UserMismatch { .. })
	}

	/// HTTP status a handler should answer with.
	pub const fn http_status(&self) -> u16 {
		401
	}
}

/// Result of [`RefreshTokenManager::rotate_access_token`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rotation {
	/// A new access token paired with the unchanged refresh token.
	Rotated(TokenBundle),
	/// The refresh token was refused.
	Rejected(RotationError),
}
impl Rotation {
	/// Returns the bundle on success.
	pub fn bundle(&self) -> Option<&TokenBundle> {
		match self {
			Self::Rotated(bundle) => Some(bundle),
			Self::Rejected(_) => None,
		}
	}

	/// Converts into a standard result.
	pub fn into_result(self) -> Result<TokenBundle, RotationError> {
		match self {
			Self::Rotated(bundle) => Ok(bundle),
			Self::Rejected(err) => Err(err),
		}
	}
}

/// Issues and validates refresh tokens with a day-granularity lifetime.
#[derive(Clone)]
pub struct RefreshTokenManager {
	key: SigningKey,
	ttl_days: u64,
	blacklist: Arc<dyn Blacklist>,
}
impl RefreshTokenManager {
	/// Creates a manager signing with `key` and granting `ttl_days` per token.
	pub fn new(key: SigningKey, ttl_days: u64, blacklist: Arc<dyn Blacklist>) -> Self {
		Self { key, ttl_days, blacklist }
	}

	/// Lifetime granted to each token, in seconds.
	pub fn lifetime_secs(&self) -> u64 {
		self.ttl_days.saturating_mul(86_400)
	}

	/// Mints a token for `user_id` at `now` (unix seconds): `exp = now + ttl_days * 86400`.
	pub fn issue(&self, user_id: u64, now: u64) -> Result<IssuedToken<RefreshClaims>> {
		tokens::issue_class(user_id, now, self.lifetime_secs(), &self.key)
	}

	/// Validates `token` at `now` (unix seconds), consulting the blacklist first.
	pub fn validate(&self, token: &str, now: u64) -> TokenValidation<RefreshClaims> {
		tokens::validate_class(CheckKind::Refresh, token, &self.key, now, self.blacklist.as_ref())
	}

	/// Exchanges a valid refresh token owned by `claimed_user_id` for a new access token.
	///
	/// The returned bundle carries `refresh_token` unchanged along with its original expiry.
	pub fn rotate_access_token(
		&self,
		refresh_token: &str,
		claimed_user_id: u64,
		now: u64,
		access: &AccessTokenManager,
	) -> Result<Rotation> {
		let _span = CheckSpan::new(CheckKind::Rotation, "rotate_access_token").entered();
		let claims = match self.validate(refresh_token, now) {
			TokenValidation::Valid(claims) => claims,
			TokenValidation::Expired => return Ok(Rotation::Rejected(RotationError::Expired)),
			TokenValidation::InvalidFormat =>
				return Ok(Rotation::Rejected(RotationError::InvalidFormat)),
			TokenValidation::InvalidBase64 =>
				return Ok(Rotation::Rejected(RotationError::InvalidBase64)),
			TokenValidation::InvalidSignature =>
				return Ok(Rotation::Rejected(RotationError::InvalidSignature)),
		};

		if claims.user_id != claimed_user_id {
			let token = fingerprint(refresh_token);

			obs::rotation_user_mismatch(claimed_user_id, claims.user_id, &token);

			return Ok(Rotation::Rejected(RotationError::UserMismatch {
				claimed: claimed_user_id,
				actual: claims.user_id,
			}));
		}

		let issued = access.issue(claims.user_id, now)?;

		Ok(Rotation::Rotated(TokenBundle {
			user_id: claims.user_id,
			access_token: issued.token,
			refresh_token: TokenSecret::new(refresh_token),
			access_token_expires_at: issued.claims.exp,
			refresh_token_expires_at: claims.exp,
			access_token_lifetime: access.lifetime_secs(),
		}))
	}
}
impl Debug for RefreshTokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshTokenManager")
			.field("key", &self.key)
			.field("ttl_days", &self.ttl_days)
			.field("revoked", &self.blacklist.len())
			.finish()
	}
}
