/// Password Hashing and Verification
///
/// bcrypt with a configurable cost. Only the first 71 bytes of a password
/// affect the hash; registration rejects anything longer before it gets here.

use bcrypt::{hash, verify};

use crate::error::AppError;

pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Password hashed once at startup to build the placeholder hash.
const PLACEHOLDER_PASSWORD: &str = "thereIsNoUser";

#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    placeholder_hash: String,
}

impl PasswordHasher {
    /// Build a hasher for `cost` (4..=31).
    ///
    /// Computes the placeholder hash with the same cost as real hashes, so
    /// verifying against it takes as long as verifying a stored password.
    pub fn new(cost: u32) -> Result<Self, AppError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(AppError::Internal(format!(
                "bcrypt cost must be between {} and {}, got {}",
                MIN_COST,
                MAX_COST,
                cost
            )));
        }

        let placeholder_hash = hash(PLACEHOLDER_PASSWORD, cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(Self {
            cost,
            placeholder_hash,
        })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Salted one-way hash of `password`.
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Check `candidate` against `hash`.
    ///
    /// Any failure, including a hash that cannot be parsed, is reported as a
    /// plain mismatch.
    pub fn verify(&self, hash: &str, candidate: &str) -> bool {
        match verify(candidate, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be verified");
                false
            }
        }
    }

    /// Whether `hash` was produced at a cost other than the configured one.
    ///
    /// A hash whose cost cannot be read is left alone; it will fail `verify`
    /// anyway.
    pub fn needs_rehash(&self, hash: &str) -> bool {
        match hash_cost(hash) {
            Some(cost) => cost != self.cost,
            None => false,
        }
    }

    /// Burn the same CPU as a real `verify` when there is nothing to verify
    /// against.
    pub fn verify_placeholder(&self, candidate: &str) {
        let _ = verify(candidate, &self.placeholder_hash);
    }
}

/// Cost field of a modular-crypt bcrypt hash (`$2b$<cost>$<salt+hash>`).
fn hash_cost(hash: &str) -> Option<u32> {
    let mut parts = hash.split('$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(""), Some(_version), Some(cost)) => cost.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(MIN_COST).expect("Failed to build hasher")
    }

    #[test]
    fn test_hash_password() {
        let hasher = hasher();
        let password = "secret123";
        let hash = hasher.hash(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = hasher();
        let a = hasher.hash("same-password").unwrap();
        let b = hasher.hash("same-password").unwrap();

        assert_ne!(a, b);
        assert!(hasher.verify(&a, "same-password"));
        assert!(hasher.verify(&b, "same-password"));
    }

    #[test]
    fn test_verify_password() {
        let hasher = hasher();
        let long = "x".repeat(71);
        for password in ["secret123", "", "ünïcödé pässwörd", long.as_str()] {
            let hash = hasher.hash(password).unwrap();
            assert!(hasher.verify(&hash, password), "should verify {:?}", password);
        }
    }

    #[test]
    fn test_verify_wrong_password() {
        let hasher = hasher();
        let hash = hasher.hash("secret123").unwrap();

        for wrong in ["secret124", "Secret123", "secret12", "secret1234", ""] {
            assert!(!hasher.verify(&hash, wrong), "should reject {:?}", wrong);
        }
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        let hasher = hasher();

        assert!(!hasher.verify("not-a-bcrypt-hash", "secret123"));
        assert!(!hasher.verify("", "secret123"));
    }

    #[test]
    fn test_uses_configured_cost() {
        let hasher = PasswordHasher::new(5).unwrap();
        let hash = hasher.hash("secret123").unwrap();

        assert_eq!(hasher.cost(), 5);
        assert!(hash.contains("$05$"));
        assert!(hasher.placeholder_hash.contains("$05$"));
    }

    #[test]
    fn test_rejects_out_of_range_cost() {
        assert!(PasswordHasher::new(3).is_err());
        assert!(PasswordHasher::new(32).is_err());
    }

    #[test]
    fn test_needs_rehash_only_for_other_costs() {
        let hasher = PasswordHasher::new(MIN_COST).unwrap();
        let current = hasher.hash("secret123").unwrap();
        let older = PasswordHasher::new(MIN_COST + 1).unwrap().hash("secret123").unwrap();

        assert!(!hasher.needs_rehash(&current));
        assert!(hasher.needs_rehash(&older));
        assert!(!hasher.needs_rehash("not-a-bcrypt-hash"));
        assert!(!hasher.needs_rehash("$2b$xx$abc"));
    }
}
