//! Password hashing via bcrypt.

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Minimum accepted password length for sign-up and recovery.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Reject passwords shorter than [`MIN_PASSWORD_LEN`].
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Check `password` against a stored hash. An unparseable hash is a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
    }

    #[test]
    fn empty_hash_never_verifies() {
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn short_password_names_the_field() {
        let err = validate_password("short").unwrap_err();
        assert!(matches!(err, AuthError::Validation { ref attr, .. } if attr == "password"));
        validate_password("long enough").unwrap();
    }
}
