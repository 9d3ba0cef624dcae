//! Redacting wrappers for signing keys and issued token strings.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Redacted token string wrapper keeping issued tokens out of logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Stable, log-safe fingerprint of the token.
	pub fn fingerprint(&self) -> String {
		fingerprint(&self.0)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// HMAC signing secret for one token class.
///
/// Has no equality; secrets are only checked through a constant-time MAC.
#[derive(Clone)]
pub struct SigningKey(Arc<[u8]>);
impl SigningKey {
	/// Wraps the raw secret bytes.
	pub fn new(secret: impl AsRef<[u8]>) -> Self {
		Self(Arc::from(secret.as_ref()))
	}

	/// Returns the secret bytes for MAC computation.
	pub fn expose(&self) -> &[u8] {
		&self.0
	}

	/// Returns `true` if the secret holds no bytes.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for SigningKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningKey").field(&"<redacted>").finish()
	}
}
impl<'de> Deserialize<'de> for SigningKey {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		String::deserialize(deserializer).map(Self::new)
	}
}

/// Base64 (no padding) SHA-256 digest of `token`, suitable for log fields.
pub fn fingerprint(token: &str) -> String {
	let digest = Sha256::digest(token.as_bytes());

	STANDARD_NO_PAD.encode(&digest[..12])
}
