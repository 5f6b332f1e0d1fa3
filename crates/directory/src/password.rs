//! Password hashing in the modular-crypt format the API verifies against:
//! `$pbkdf2-sha256$<rounds>$<salt>$<checksum>`.
//!
//! Salt and checksum use the "adapted" base64 alphabet (standard alphabet
//! with `.` in place of `+`, no padding).

use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};
use pbkdf2::pbkdf2_hmac;
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;

use crate::errors::DirectoryError;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Rounds used when hashing new passwords.
pub const DEFAULT_ROUNDS: u32 = 29_000;

fn ab64_encode(bytes: &[u8]) -> String {
    STANDARD_NO_PAD.encode(bytes).replace('+', ".")
}

fn ab64_decode(encoded: &str) -> Result<Vec<u8>, DirectoryError> {
    STANDARD_NO_PAD
        .decode(encoded.replace('.', "+"))
        .map_err(|e| DirectoryError::InvalidPasswordHash(format!("bad base64: {e}")))
}

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut key);
    key
}

pub fn hash_password(password: &str, rounds: u32) -> Result<String, DirectoryError> {
    if rounds == 0 {
        return Err(DirectoryError::InvalidPasswordHash(
            "rounds must be positive".to_string(),
        ));
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let key = derive(password, &salt, rounds);

    Ok(format!(
        "${SCHEME}${rounds}${}${}",
        ab64_encode(&salt),
        ab64_encode(&key)
    ))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, DirectoryError> {
    let parts: Vec<&str> = hash.split('$').collect();
    let [empty, scheme, rounds, salt, checksum] = parts.as_slice() else {
        return Err(DirectoryError::InvalidPasswordHash(format!(
            "expected 4 fields, got {}",
            parts.len().saturating_sub(1)
        )));
    };
    if !empty.is_empty() || *scheme != SCHEME {
        return Err(DirectoryError::InvalidPasswordHash(format!(
            "unsupported scheme: {scheme}"
        )));
    }

    let rounds: u32 = rounds
        .parse()
        .map_err(|e| DirectoryError::InvalidPasswordHash(format!("bad rounds: {e}")))?;
    let salt = ab64_decode(salt)?;
    let expected = ab64_decode(checksum)?;

    let actual = derive(password, &salt, rounds);
    // Fold over every byte so the comparison time doesn't depend on the first mismatch
    let diff = actual
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));

    Ok(expected.len() == KEY_LEN && diff == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN_HASH: &str =
        "$pbkdf2-sha256$5$OqfUmtNaq5UyRohxDuGckw$9H/UL5N5dA7JmUq7ohRPfmJ84OUnpRKjTgsMeuFilXM";

    #[test]
    fn test_verify_known_hash() {
        assert!(verify_password("admin", ADMIN_HASH).unwrap());
        assert!(!verify_password("root", ADMIN_HASH).unwrap());
    }

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse", 10).unwrap();
        assert!(hash.starts_with("$pbkdf2-sha256$10$"));
        assert!(!hash.contains('+'));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("admin", 5).unwrap();
        let b = hash_password("admin", 5).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_foreign_scheme() {
        let err = verify_password("admin", "$argon2id$v=19$m=16,t=2,p=1$c2FsdA$aGFzaA");
        assert!(matches!(err, Err(DirectoryError::InvalidPasswordHash(_))));
    }

    #[test]
    fn test_rejects_zero_rounds() {
        assert!(hash_password("admin", 0).is_err());
    }
}
