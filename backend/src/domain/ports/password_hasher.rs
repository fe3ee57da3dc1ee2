//! Opaque password hashing capability.

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised while producing a password digest.
    pub enum PasswordHashError {
        /// The adapter could not produce a digest.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Salted one-way hashing with constant-time verification.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError>;

    /// `false` for a wrong password or an unreadable digest.
    fn verify(&self, password: &str, hash: &PasswordHash) -> bool;
}
