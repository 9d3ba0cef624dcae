//! Signed claim payloads for the access and refresh token classes.

// self
use crate::_prelude::*;

/// Marker describing a token class: which claims it carries and how it is labeled.
pub trait TokenClass
where
	Self: Clone + Debug + Serialize + DeserializeOwned + Send + Sync,
{
	/// Stable label used in logs, metrics, and configuration errors.
	const LABEL: &'static str;

	/// Builds claims for `user_id` issued at `iat` and expiring at `exp` (unix seconds).
	fn new(user_id: u64, iat: u64, exp: u64) -> Self;

	/// User the claims were minted for.
	fn user_id(&self) -> u64;

	/// Issued-at instant in unix seconds.
	fn issued_at(&self) -> u64;

	/// Expiry instant in unix seconds.
	fn expires_at(&self) -> u64;

	/// Returns `true` once `now` (unix seconds) is strictly past the expiry.
	fn is_expired_at(&self, now: u64) -> bool {
		now > self.expires_at()
	}
}

macro_rules! def_claims {
	($name:ident, $doc:literal, $label:literal) => {
		#[doc = $doc]
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
		pub struct $name {
			/// User the token was minted for.
			pub user_id: u64,
			/// Issued-at instant in unix seconds.
			pub iat: u64,
			/// Expiry instant in unix seconds.
			pub exp: u64,
		}
		impl TokenClass for $name {
			const LABEL: &'static str = $label;

			fn new(user_id: u64, iat: u64, exp: u64) -> Self {
				Self { user_id, iat, exp }
			}

			fn user_id(&self) -> u64 {
				self.user_id
			}

			fn issued_at(&self) -> u64 {
				self.iat
			}

			fn expires_at(&self) -> u64 {
				self.exp
			}
		}
	};
}

def_claims! { AccessClaims, "Claims carried by short-lived access tokens.", "access" }
def_claims! { RefreshClaims, "Claims carried by long-lived refresh tokens.", "refresh" }
