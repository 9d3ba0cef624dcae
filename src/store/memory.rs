//! Thread-safe in-memory [`Blacklist`] guarded by a single mutex.

// self
use crate::{_prelude::*, auth, obs, store::Blacklist};

type RevokedSet = Arc<Mutex<HashSet<String>>>;

/// Process-local revocation set; clones share the same underlying set.
#[derive(Clone, Debug, Default)]
pub struct MemoryBlacklist(RevokedSet);
impl MemoryBlacklist {
	/// Creates an empty blacklist.
	pub fn new() -> Self {
		Self::default()
	}
}
impl Blacklist for MemoryBlacklist {
	fn add(&self, token: &str) -> bool {
		let newly_added = self.0.lock().insert(token.to_owned());

		obs::token_revoked(&auth::fingerprint(token), newly_added);

		newly_added
	}

	fn contains(&self, token: &str) -> bool {
		self.0.lock().contains(token)
	}

	fn len(&self) -> usize {
		self.0.lock().len()
	}
}
