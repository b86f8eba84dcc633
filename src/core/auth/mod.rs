//! Credentials and bearer tokens
//!
//! - [`password`] - bcrypt hashing on the blocking pool
//! - [`token`] - HS256 token signing and verification
//! - [`service`] - registration, login and token validation

pub mod password;
pub mod service;
pub mod token;

pub use service::{AuthService, LoginResponse};
pub use token::{Claims, IssuedToken, TokenSigner};
