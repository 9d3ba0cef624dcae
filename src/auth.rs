//! Auth-domain claims, redacted secrets, issued bundles, opaque tokens, and login lockout.

pub mod bundle;
pub mod claims;
pub mod lockout;
pub mod opaque;
pub mod secret;

pub use bundle::*;
pub use claims::*;
pub use lockout::*;
pub use opaque::*;
pub use secret::*;
