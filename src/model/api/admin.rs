use argon2::Config as Argon2Config;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ValidationErrors};
use crate::model::db::admin::NewAdmin;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw admin credentials, received from a user. These are never stored directly,
/// since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl TryFrom<AdminCredentials> for NewAdmin {
    type Error = Error;

    /// Convert [`AdminCredentials`] to a new admin by hashing the password.
    /// This enforces that the username is non-empty, and the password meets minimum length.
    fn try_from(cred: AdminCredentials) -> Result<Self, Self::Error> {
        // Check credentials are acceptable.
        let mut errors = ValidationErrors::new();
        if cred.username.is_empty() {
            errors.add("username", "The username field is required.");
        }
        if cred.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("The password must be at least {MIN_PASSWORD_LENGTH} characters."),
            );
        }
        errors.into_result(())?;

        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(cred.password.as_bytes(), &salt, &Argon2Config::default())?;
        Ok(Self {
            username: cred.username,
            password_hash,
        })
    }
}
