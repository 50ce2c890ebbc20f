//! `tillbook-auth` — local-only sign-in for the shop till.
//!
//! There is no credential verification here: the till trusts whoever is
//! standing at it, and the role is derived from the email address alone.
//! Real authentication lives behind the (yet to be chosen) sync backend.

pub mod roles;
pub mod user;

pub use roles::{Role, ensure_admin};
pub use user::User;
