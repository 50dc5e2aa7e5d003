//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access tokens, refresh-token hashing, and the session cookie.

pub mod jwt;
pub mod password;
