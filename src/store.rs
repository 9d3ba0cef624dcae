//! Revocation contracts and the built-in in-memory blacklist.

pub mod memory;

pub use memory::MemoryBlacklist;

// self
use crate::_prelude::*;

/// Revocation set consulted before any token is trusted.
///
/// Membership alone means "revoked". Entries carry no metadata and are kept for the process
/// lifetime; an entry whose token has since expired is harmless because validators reject
/// expired tokens on their own.
pub trait Blacklist
where
	Self: Send + Sync,
{
	/// Revokes `token`. Returns `true` if it was not already present.
	fn add(&self, token: &str) -> bool;

	/// Returns `true` if `token` has been revoked.
	fn contains(&self, token: &str) -> bool;

	/// Number of revoked tokens held.
	fn len(&self) -> usize;

	/// Returns `true` if nothing has been revoked.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl<T> Blacklist for Arc<T>
where
	T: ?Sized + Blacklist,
{
	fn add(&self, token: &str) -> bool {
		(**self).add(token)
	}

	fn contains(&self, token: &str) -> bool {
		(**self).contains(token)
	}

	fn len(&self) -> usize {
		(**self).len()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn shared_handles_delegate() {
		let inner = Arc::new(MemoryBlacklist::default());
		let shared: Arc<dyn Blacklist> = inner.clone();

		assert!(shared.is_empty());
		assert!(shared.add("token-a"));
		assert!(inner.contains("token-a"));
		assert_eq!(Blacklist::len(&inner), 1);
	}
}
