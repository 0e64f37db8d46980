use std::ops::{Deref, DerefMut};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    api::admin::AdminCredentials,
    mongodb::{is_duplicate_key_error, Coll, Id},
};

/// Core admin user data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCore {
    pub username: String,
    pub password_hash: String,
}

impl AdminCore {
    /// Check whether the given password is correct.
    /// A malformed stored hash never verifies.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

/// An admin without an ID.
pub type NewAdmin = AdminCore;

/// An admin user from the database, with its unique ID.
#[derive(Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub admin: AdminCore,
}

impl Deref for Admin {
    type Target = AdminCore;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

impl DerefMut for Admin {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.admin
    }
}

/// Create the given default admin if there are no admins at all.
pub async fn ensure_admin_exists(
    admins: &Coll<NewAdmin>,
    credentials: AdminCredentials,
) -> Result<()> {
    if admins.count_documents(None, None).await? > 0 {
        return Ok(());
    }

    warn!(
        "No admins found, creating default admin '{}'",
        credentials.username
    );
    let admin = NewAdmin::try_from(credentials)?;
    match admins.insert_one(admin, None).await {
        Ok(_) => Ok(()),
        // Another instance beat us to it.
        Err(e) if is_duplicate_key_error(&e) => {
            info!("Default admin already created");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_password() {
        let admin = NewAdmin::example();
        assert!(admin.verify_password(AdminCredentials::example().password));
        assert!(!admin.verify_password("not the password"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let admin = NewAdmin {
            username: "broken".into(),
            password_hash: "plaintext".into(),
        };
        assert!(!admin.verify_password("plaintext"));
    }
}
