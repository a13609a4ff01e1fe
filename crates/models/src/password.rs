//! One-way password transform applied before a user record reaches storage.
//!
//! A [`Password`] records whether its value is still plaintext. Anything read
//! back from storage is [`Password::Hashed`]; only values set by the caller are
//! [`Password::Plain`]. The stored form is never inferred from the text itself,
//! so a plaintext that happens to look like a digest is still hashed.
//!
//! The default algorithm is Argon2id, stored as a PHC string
//! (`$argon2id$v=19$...`). Configure `sha256` (`HBNB_PASSWORD_ALGORITHM=sha256`)
//! for the fixed-length 64 character lowercase hex digest.

use std::fmt;

use argon2::password_hash::{PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::{Argon2, PasswordHash};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

pub use configs::PasswordAlgorithm;

use crate::errors::ModelError;

const SHA256_HEX_LEN: usize = 64;

/// A user password, tagged with whether it has been through the one-way transform.
///
/// Serialises as the bare string. Deserialising always yields `Hashed`, since
/// every record being read comes from storage.
#[derive(Clone, PartialEq, Eq)]
pub enum Password {
    Plain(String),
    Hashed(String),
}

impl Password {
    pub fn plain(value: impl Into<String>) -> Self {
        Password::Plain(value.into())
    }

    pub fn hashed(value: impl Into<String>) -> Self {
        Password::Hashed(value.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Password::Plain(v) | Password::Hashed(v) => v,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    pub fn is_hashed(&self) -> bool {
        matches!(self, Password::Hashed(_))
    }

    /// Non-empty plaintext that must be hashed before it is stored.
    pub fn needs_hashing(&self) -> bool {
        matches!(self, Password::Plain(v) if !v.is_empty())
    }
}

impl Default for Password {
    /// No password set.
    fn default() -> Self {
        Password::Hashed(String::new())
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Password::Plain(_) => f.write_str("Plain(..)"),
            Password::Hashed(v) => f.debug_tuple("Hashed").field(v).finish(),
        }
    }
}

impl Serialize for Password {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Password {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Password::Hashed)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PasswordHasher {
    algorithm: PasswordAlgorithm,
}

impl PasswordHasher {
    pub fn new(algorithm: PasswordAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> PasswordAlgorithm {
        self.algorithm
    }

    pub fn hash(&self, plain: &str) -> Result<String, ModelError> {
        match self.algorithm {
            PasswordAlgorithm::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                let hash = Argon2::default()
                    .hash_password(plain.as_bytes(), &salt)
                    .map_err(|e| ModelError::Hash(e.to_string()))?
                    .to_string();
                Ok(hash)
            }
            PasswordAlgorithm::Sha256 => Ok(sha256_hex(plain)),
        }
    }

    /// Hash `password` if it is still plaintext. Hashed values are left alone; an
    /// empty plaintext becomes the unset password.
    pub fn seal(&self, password: &mut Password) -> Result<(), ModelError> {
        if password.needs_hashing() {
            let hashed = self.hash(password.as_str())?;
            *password = Password::Hashed(hashed);
        } else if password.is_empty() {
            *password = Password::default();
        }
        Ok(())
    }

    /// Check `plain` against a stored hash produced by either algorithm.
    pub fn verify(&self, plain: &str, stored: &str) -> bool {
        if let Some(parsed) = parse_argon2(stored) {
            return Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok();
        }
        is_sha256_hex(stored) && sha256_hex(plain) == stored
    }
}

fn sha256_hex(plain: &str) -> String {
    format!("{:x}", Sha256::digest(plain.as_bytes()))
}

fn is_sha256_hex(value: &str) -> bool {
    value.len() == SHA256_HEX_LEN && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn parse_argon2(value: &str) -> Option<PasswordHash<'_>> {
    PasswordHash::new(value)
        .ok()
        .filter(|h| h.algorithm.as_str().starts_with("argon2"))
}
