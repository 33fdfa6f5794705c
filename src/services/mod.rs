pub mod auth;
pub mod export;
pub mod jobs;
pub mod vault;
