//! Master password policy and hashing.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::{CoreError, CoreResult};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// At least six characters with an uppercase letter, a lowercase letter and a digit.
pub fn check_policy(candidate: &str) -> CoreResult<()> {
    if candidate.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::validation(format!(
            "Password must have at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if !candidate.chars().any(|c| c.is_uppercase()) {
        return Err(CoreError::validation("Password must contain an uppercase letter"));
    }
    if !candidate.chars().any(|c| c.is_lowercase()) {
        return Err(CoreError::validation("Password must contain a lowercase letter"));
    }
    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        return Err(CoreError::validation("Password must contain a digit"));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> CoreResult<String> {
    hash(password, DEFAULT_COST).map_err(|e| CoreError::Unexpected(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, hashed: &str) -> CoreResult<bool> {
    verify(password, hashed).map_err(|e| CoreError::Unexpected(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy() {
        assert!(check_policy("Abc123").is_ok());
        assert!(check_policy("Ab1").is_err());
        assert!(check_policy("abc123").is_err());
        assert!(check_policy("ABC123").is_err());
        assert!(check_policy("Abcdef").is_err());
    }

    #[test]
    fn test_hash_roundtrip() {
        let hashed = hash_password("Secret1").unwrap();
        assert!(verify_password("Secret1", &hashed).unwrap());
        assert!(!verify_password("secret1", &hashed).unwrap());
    }
}
