//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the authenticated user from a Bearer token or the session cookie.
//! - [`auth::Session`] -- the explicit [`SessionContext`](shopfloor_core::session::SessionContext),
//!   anonymous when no token is presented.
//! - [`rbac::RequireAdmin`] -- requires the administrator role.
//! - [`rbac::RequireAuth`] -- requires any authenticated user.

pub mod auth;
pub mod rbac;
