//! Authentication for coldwatch.
//!
//! Two credential schemes share the same HTTP surface: short-lived signed
//! bearer tokens for humans and a static per-device key for machines. This
//! crate covers the stateless half: issuing and validating tokens, hashing
//! passwords, and the [`Principal`] type every workflow operation receives
//! explicitly. Device-key resolution lives next to the storage trait since
//! it is a lookup, not cryptography.

mod password;
mod principal;
mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use principal::Principal;
pub use token::{Claims, TokenConfig, TokenError, TokenKind, TokenPair, TokenService};
