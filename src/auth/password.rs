//! Argon2id credential hashing.

use anyhow::anyhow;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Hashes `plain` into a PHC string with a fresh salt.
pub fn hash(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| anyhow!("hash credential: {e}"))
}

/// `Ok(false)` on a mismatch; `Err` only when the stored PHC string is unusable.
pub fn matches(plain: &str, phc: &str) -> anyhow::Result<bool> {
    let stored = PasswordHash::new(phc).map_err(|e| anyhow!("stored credential is corrupt: {e}"))?;
    match hasher().verify_password(plain.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("check credential: {e}")),
    }
}
