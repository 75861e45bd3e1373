//! Authentication utilities library
//!
//! Provides the credential and token primitives the portal service builds on:
//! - Password hashing (Argon2id)
//! - Signed token generation and validation (HS256)
//! - Authentication coordination
//!
//! The library knows nothing about users or sessions as stored records; the
//! service maps its own identities onto these primitives.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::{Authenticator, SessionClaims};
//! use chrono::{Duration, Utc};
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!");
//!
//! let hash = auth.hash_password("password123").unwrap();
//! auth.verify_password("password123", &hash).unwrap();
//!
//! let now = Utc::now();
//! let claims = SessionClaims::new(1, "3f0c", now, now + Duration::hours(24));
//! let token = auth.issue_token(&claims).unwrap();
//! let decoded: SessionClaims = auth.validate_token(&token).unwrap();
//! assert_eq!(decoded.jti, "3f0c");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::SessionClaims;
pub use password::PasswordError;
pub use password::PasswordHasher;
