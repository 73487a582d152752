use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::AppError;

/// Hashes with Argon2id into a PHC string, the format new users are seeded with.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("hashing password: {}", e))?
        .to_string();
    Ok(hash)
}

/// Accepts Argon2 PHC strings and legacy bcrypt hashes. Any failure,
/// including an unparseable hash, is `Unauthorized`.
pub fn verify_password(stored_hash: &str, candidate: &str) -> Result<(), AppError> {
    if is_bcrypt(stored_hash) {
        return match bcrypt::verify(candidate, stored_hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(mismatch()),
            Err(e) => Err(AppError::Unauthorized(format!("invalid password hash: {}", e))),
        };
    }

    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Unauthorized(format!("invalid password hash: {}", e)))?;

    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed_hash)
        .map_err(|_| mismatch())
}

fn is_bcrypt(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}

fn mismatch() -> AppError {
    AppError::Unauthorized("password does not match".into())
}
