pub mod claims;
pub mod scheme;

pub use claims::{UnverifiedClaims, decode_unverified};
pub use scheme::AuthScheme;
