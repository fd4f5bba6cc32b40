//! Adaptive-cost password hashing.
//!
//! Hashes are Argon2id PHC strings with a fresh random salt per call, so the
//! stored value carries its own parameters and salt. Verification goes
//! through `PasswordVerifier`, which compares digests in constant time.
//!
//! Rows written by the earlier ledger app carry bcrypt hashes. Those still
//! verify, and `needs_rehash` tells the caller to replace them with Argon2id
//! once the password is known to be right.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use tokio::task;
use tracing::warn;

use crate::config::SecurityConfig;
use crate::constants::password::{BCRYPT_PREFIXES, SALT_BYTES};

fn is_bcrypt(stored: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|prefix| stored.starts_with(prefix))
}

/// Stored hashes in a legacy format should be replaced after a successful
/// verification.
#[must_use]
pub fn needs_rehash(stored: &str) -> bool {
    is_bcrypt(stored)
}

#[derive(Debug, Clone)]
pub struct PasswordHasherConfig {
    params: Params,
}

impl PasswordHasherConfig {
    pub fn from_security(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a freshly generated salt.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; SALT_BYTES]>())
            .map_err(|e| anyhow::anyhow!("Failed to encode salt: {e}"))?;

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

        Ok(hash.to_string())
    }

    /// The parameters embedded in `stored` take precedence over ours, so
    /// hashes written under an older configuration still verify.
    ///
    /// A stored value that is neither bcrypt nor a PHC string matches no
    /// password.
    #[must_use]
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        if is_bcrypt(stored) {
            return bcrypt::verify(password, stored).unwrap_or_else(|e| {
                warn!(error = %e, "Unreadable bcrypt hash in users table");
                false
            });
        }

        let Ok(parsed) = PasswordHash::new(stored) else {
            warn!("Unreadable password hash in users table");
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Argon2 is CPU-intensive, so hashing runs on the blocking pool.
    pub async fn hash_blocking(&self, password: &str) -> Result<String> {
        let hasher = self.clone();
        let password = password.to_string();

        task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("Password hashing task panicked")?
    }

    pub async fn verify_blocking(&self, password: &str, stored: &str) -> Result<bool> {
        let hasher = self.clone();
        let password = password.to_string();
        let stored = stored.to_string();

        task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .context("Password verification task panicked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHasherConfig {
        PasswordHasherConfig::from_security(&SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn hash_is_not_plaintext_and_verifies() {
        let hasher = cheap();
        let hash = hasher.hash("pw1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("pw1"));
        assert!(hasher.verify("pw1", &hash));
        assert!(!hasher.verify("pw2", &hash));
        assert!(!needs_rehash(&hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = cheap();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_accepts_hash_from_other_params() {
        let old = cheap();
        let hash = old.hash("pw").unwrap();

        let newer = PasswordHasherConfig::from_security(&SecurityConfig {
            argon2_memory_cost_kib: 2048,
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        })
        .unwrap();
        assert!(newer.verify("pw", &hash));
    }

    #[test]
    fn malformed_hash_matches_nothing() {
        let hasher = cheap();
        assert!(!hasher.verify("pw", "not-a-phc-string"));
        assert!(!hasher.verify("", ""));
        assert!(!hasher.verify("pw", "$2b$12$short"));
    }

    #[test]
    fn bcrypt_hashes_verify_and_want_rehash() {
        let hasher = cheap();
        let legacy = bcrypt::hash("pw", 4).unwrap();

        assert!(needs_rehash(&legacy));
        assert!(hasher.verify("pw", &legacy));
        assert!(!hasher.verify("nope", &legacy));

        let upgraded = legacy.replacen("$2b$", "$2y$", 1);
        assert!(needs_rehash(&upgraded));
        assert!(hasher.verify("pw", &upgraded));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let result = PasswordHasherConfig::from_security(&SecurityConfig {
            argon2_memory_cost_kib: 1,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn blocking_variants_agree() {
        let hasher = cheap();
        let hash = hasher.hash_blocking("pw").await.unwrap();
        assert!(hasher.verify_blocking("pw", &hash).await.unwrap());
        assert!(!hasher.verify_blocking("nope", &hash).await.unwrap());
        assert!(!hasher.verify_blocking("pw", "garbage").await.unwrap());
    }
}
