//! Token signing, password hashing and digest helpers shared by the
//! movie-store binaries.

pub mod hash;
pub mod jwt;
pub mod password;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("password does not meet strength requirements: {0}")]
    WeakPassword(&'static str),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hashing(String),
}
