pub mod export;
pub mod health;
