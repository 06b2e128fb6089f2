//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs issued elsewhere; `sub` carries the user id.

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{decode_token, issue_token};
pub use middleware::{auth_middleware, AuthState};
pub use models::{AuthUser, JwtClaims};
