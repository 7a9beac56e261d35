//! Authentication and identity
//!
//! Handles:
//! - Access/refresh token issuing (`jwt`)
//! - Credential hashing and role membership (`identity`)
//! - Request authentication middleware

mod identity;
pub mod jwt;
mod middleware;

pub use identity::Identity;
pub use jwt::{Claims, TokenIssuer, TokenRejected};
pub use middleware::CurrentUser;
