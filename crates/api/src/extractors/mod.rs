//! Custom Axum extractors.

pub mod admin_key;
pub mod user_auth;

pub use admin_key::AdminKey;
pub use user_auth::UserAuth;
