//! Compact two-part signed envelope: `<payload>.<signature>`.
//!
//! `payload` is base64url (no padding) over the claims JSON and `signature` is base64url over
//! `HMAC-SHA1(payload, key)`, with the MAC computed over the encoded payload text. Only the
//! canonical unpadded form decodes, so a signed payload has exactly one accepted spelling.
//! Claims are only deserialized after the signature has been checked in constant time.

// crates.io
use base64::{
	Engine as _, alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use hmac::{Hmac, Mac};
use sha1::Sha1;
// self
use crate::{_prelude::*, auth::SigningKey};

type HmacSha1 = Hmac<Sha1>;

const SEPARATOR: char = '.';
const TOKEN_BASE64: GeneralPurpose = GeneralPurpose::new(
	&alphabet::URL_SAFE,
	GeneralPurposeConfig::new()
		.with_encode_padding(false)
		.with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Reasons a token string fails verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ThisError)]
pub enum CodecError {
	/// No separator, or the payload is not the expected claims JSON.
	#[error("Token is malformed.")]
	InvalidFormat,
	/// A segment is not valid base64.
	#[error("Token segment is not valid base64.")]
	InvalidBase64,
	/// The recomputed MAC does not match the presented signature.
	#[error("Token signature does not match.")]
	InvalidSignature,
}

/// Failures raised while minting a token.
#[derive(Debug, ThisError)]
pub enum EncodeError {
	/// Claims could not be serialized.
	#[error("Token claims could not be serialized.")]
	Serialize(#[from] serde_json::Error),
	/// The MAC rejected the signing key.
	#[error("Signing key was rejected by the MAC.")]
	InvalidKey,
}

/// Serializes `claims` and signs them with `key`.
pub fn encode<C>(claims: &C, key: &SigningKey) -> Result<String, EncodeError>
where
	C: ?Sized + Serialize,
{
	let json = serde_json::to_vec(claims)?;
	let payload = TOKEN_BASE64.encode(json);
	let mut mac = keyed_mac(key).ok_or(EncodeError::InvalidKey)?;

	mac.update(payload.as_bytes());

	let signature = TOKEN_BASE64.encode(mac.finalize().into_bytes());

	Ok(format!("{payload}{SEPARATOR}{signature}"))
}

/// Splits a token on its first separator without checking anything else.
pub fn decode_unverified(token: &str) -> Result<(&str, &str), CodecError> {
	token.split_once(SEPARATOR).ok_or(CodecError::InvalidFormat)
}

/// Checks the signature of `token` against `key` and returns the embedded claims.
pub fn verify<C>(token: &str, key: &SigningKey) -> Result<C, CodecError>
where
	C: DeserializeOwned,
{
	let (payload, signature) = decode_unverified(token)?;
	let payload_bytes = TOKEN_BASE64.decode(payload).map_err(|_| CodecError::InvalidBase64)?;
	let signature_bytes = TOKEN_BASE64.decode(signature).map_err(|_| CodecError::InvalidBase64)?;
	let mut mac = keyed_mac(key).ok_or(CodecError::InvalidSignature)?;

	mac.update(payload.as_bytes());
	mac.verify_slice(&signature_bytes).map_err(|_| CodecError::InvalidSignature)?;

	serde_json::from_slice(&payload_bytes).map_err(|_| CodecError::InvalidFormat)
}

fn keyed_mac(key: &SigningKey) -> Option<HmacSha1> {
	<HmacSha1 as Mac>::new_from_slice(key.expose()).ok()
}
