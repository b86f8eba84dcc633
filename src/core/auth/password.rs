//! bcrypt password hashing
//!
//! Hashing is CPU bound, so both operations run on the blocking pool.

use crate::domain::{ClinicError, Result};

/// Hashes `password` with a fresh salt at the given work factor
pub async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ClinicError::Internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| ClinicError::Internal(format!("Failed to hash password: {e}")))
}

/// True when `password` matches `hash`; a malformed hash never matches
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| ClinicError::Internal(format!("Password verification task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("secret1".to_string(), 4).await.unwrap();
        assert_ne!(hash, "secret1");
        assert!(verify_password("secret1".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("secret2".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let a = hash_password("secret1".to_string(), 4).await.unwrap();
        let b = hash_password("secret1".to_string(), 4).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_malformed_hash_never_matches() {
        assert!(!verify_password("x".to_string(), "not-a-hash".to_string()).await.unwrap());
    }
}
