// self
use trustgate::{
	_preludet::*,
	auth::{AccessClaims, RefreshClaims},
	clock,
	codec::{self, CodecError},
	store::{Blacklist, MemoryBlacklist},
	tokens::{AccessTokenManager, RefreshTokenManager, Rotation, RotationError, TokenValidation},
};

fn now_secs() -> u64 {
	clock::unix_seconds(test_epoch()).expect("Test epoch should be after 1970.")
}

fn managers() -> (AccessTokenManager, RefreshTokenManager, Arc<MemoryBlacklist>) {
	let blacklist = Arc::new(MemoryBlacklist::new());
	let access = AccessTokenManager::new(test_access_key(), 15, blacklist.clone());
	let refresh = RefreshTokenManager::new(test_refresh_key(), 7, blacklist.clone());

	(access, refresh, blacklist)
}

#[test]
fn verify_recovers_encoded_claims() {
	let samples = [
		AccessClaims { user_id: 0, iat: 0, exp: 0 },
		AccessClaims { user_id: 1, iat: 1_762_776_000, exp: 1_762_776_900 },
		AccessClaims { user_id: u64::MAX, iat: u64::MAX - 1, exp: u64::MAX },
	];

	for claims in samples {
		for key in [test_access_key(), test_refresh_key()] {
			let token = codec::encode(&claims, &key).expect("Claims should encode.");

			assert_eq!(codec::verify::<AccessClaims>(&token, &key), Ok(claims));
		}
	}
}

#[test]
fn single_character_tampering_never_validates() {
	let (access, _, _) = managers();
	let now = now_secs();
	let token = access.issue(7, now).expect("Token should mint.").token;
	let token = token.expose();
	let alphabet = ['A', 'z', '0', '-', '_'];

	for (index, original) in token.char_indices() {
		if original == '.' {
			continue;
		}

		for replacement in alphabet.iter().copied().filter(|&c| c != original) {
			let mut tampered = token.to_owned();

			tampered.replace_range(index..index + 1, &replacement.to_string());

			let outcome = access.validate(&tampered, now);

			assert!(
				matches!(
					outcome,
					TokenValidation::InvalidSignature | TokenValidation::InvalidBase64
				),
				"Tampering index {index} with `{replacement}` produced {outcome:?}."
			);
		}
	}
}

#[test]
fn expiry_boundary_is_inclusive() {
	let key = test_access_key();
	let now = now_secs();
	let token = codec::encode(&AccessClaims { user_id: 3, iat: now - 60, exp: now }, &key)
		.expect("Claims should encode.");
	let (access, _, _) = managers();

	assert!(access.validate(&token, now).is_valid());
	assert_eq!(access.validate(&token, now + 1), TokenValidation::Expired);
}

#[test]
fn revoked_tokens_stay_invalid_before_exp() {
	let (access, refresh, blacklist) = managers();
	let now = now_secs();
	let access_token = access.issue(5, now).expect("Access token should mint.").token;
	let refresh_token = refresh.issue(5, now).expect("Refresh token should mint.").token;

	assert!(blacklist.add(access_token.expose()));
	assert!(blacklist.add(refresh_token.expose()));

	for offset in [0, 1, 600, 899] {
		assert!(!access.validate(access_token.expose(), now + offset).is_valid());
		assert!(!refresh.validate(refresh_token.expose(), now + offset).is_valid());
	}

	let rotation = refresh
		.rotate_access_token(refresh_token.expose(), 5, now, &access)
		.expect("Rotation should not hit an internal fault.");

	assert_eq!(rotation, Rotation::Rejected(RotationError::Expired));
}

#[test]
fn revoked_tokens_cannot_be_respelled_with_padding() {
	let (access, refresh, blacklist) = managers();
	let now = now_secs();
	let access_token = access.issue(5, now).expect("Access token should mint.").token;
	let refresh_token = refresh.issue(5, now).expect("Refresh token should mint.").token;

	assert!(blacklist.add(access_token.expose()));
	assert!(blacklist.add(refresh_token.expose()));

	for suffix in ["=", "=="] {
		let access_variant = format!("{}{suffix}", access_token.expose());
		let refresh_variant = format!("{}{suffix}", refresh_token.expose());

		assert!(!access.validate(&access_variant, now).is_valid());
		assert_eq!(access.validate(&access_variant, now), TokenValidation::InvalidBase64);
		assert!(!refresh.validate(&refresh_variant, now).is_valid());

		let rotation = refresh
			.rotate_access_token(&refresh_variant, 5, now, &access)
			.expect("Rotation should not hit an internal fault.");

		assert!(rotation.bundle().is_none());
	}
}

#[test]
fn rotation_keeps_user_and_refresh_bytes() {
	let (access, refresh, _) = managers();
	let now = now_secs();
	let issued = refresh.issue(11, now).expect("Refresh token should mint.");
	let later = now + 86_400;

	for _ in 0..3 {
		let bundle = refresh
			.rotate_access_token(issued.token.expose(), 11, later, &access)
			.expect("Rotation should not hit an internal fault.")
			.into_result()
			.expect("Rotation should succeed.");
		let claims = access
			.validate(bundle.access_token.expose(), later)
			.into_claims()
			.expect("Rotated access token should validate.");

		assert_eq!(claims.user_id, 11);
		assert_eq!(bundle.refresh_token.expose().as_bytes(), issued.token.expose().as_bytes());
		assert_eq!(bundle.refresh_token_expires_at, issued.claims.exp);
	}
}

#[test]
fn classes_do_not_cross_validate() {
	let (access, refresh, _) = managers();
	let now = now_secs();
	let access_token = access.issue(1, now).expect("Access token should mint.").token;
	let refresh_token = refresh.issue(1, now).expect("Refresh token should mint.").token;

	assert_eq!(access.validate(refresh_token.expose(), now), TokenValidation::InvalidSignature);
	assert_eq!(
		refresh.validate(access_token.expose(), now),
		TokenValidation::<RefreshClaims>::InvalidSignature
	);
}

#[test]
fn malformed_tokens_map_to_format_and_base64() {
	let (access, _, _) = managers();
	let now = now_secs();

	assert_eq!(access.validate("", now), TokenValidation::InvalidFormat);
	assert_eq!(access.validate("missing-separator", now), TokenValidation::InvalidFormat);
	assert_eq!(access.validate("***.abc", now), TokenValidation::InvalidBase64);
	assert_eq!(codec::decode_unverified("a.b.c"), Ok(("a", "b.c")));
	assert_eq!(codec::decode_unverified("abc"), Err(CodecError::InvalidFormat));
}

#[test]
fn millisecond_conversion_happens_once() {
	let millis = 1_762_776_000_999;
	let secs = clock::unix_seconds_from_millis(millis);

	assert_eq!(secs, 1_762_776_000);
	assert_eq!(clock::unix_seconds_from_millis(secs), 1_762_776);

	let (access, _, _) = managers();
	let claims = access.issue(1, secs).expect("Access token should mint.").claims;

	assert_eq!(claims.iat, now_secs());
	assert_eq!(claims.exp - claims.iat, 900);
}
