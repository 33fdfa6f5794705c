pub mod allow_list;
pub mod client;

pub use allow_list::VaultAllowList;
pub use client::{AuthorizationOutcome, VaultClient};
