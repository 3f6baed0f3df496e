//! # quill-auth
//!
//! Credentials for the Prompt Builder API.
//!
//! - Password hashing with Argon2id, stored as PHC strings
//! - The registration password rule
//! - HS256 access and refresh tokens carrying `userId`, `email` and `exp`
//!
//! ## Example
//!
//! ```
//! use quill_auth::{hash_password, verify_password, TokenService};
//!
//! let hash = hash_password("hunter2000").unwrap();
//! assert!(verify_password("hunter2000", &hash));
//!
//! let tokens = TokenService::new("access-secret", "refresh-secret");
//! let access = tokens.issue_access(1, "ada@example.com").unwrap();
//! let claims = tokens.verify_access(&access).unwrap();
//! assert_eq!(claims.email, "ada@example.com");
//! ```

mod error;
mod password;
mod token;

pub use error::{AuthError, Result};
pub use password::{hash_password, is_password_hash, validate_new_password, verify_password};
pub use token::{Claims, TokenService, ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL};
