use std::ops::Deref;

use chrono::{DateTime, Duration, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A logged-in admin session. Bearer tokens name a session; deleting it
/// revokes the token.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSessionCore {
    pub admin_id: Id,
    /// Sessions are reaped by a TTL index on this field.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expire_at: DateTime<Utc>,
}

impl AdminSessionCore {
    pub fn new(admin_id: Id, ttl: Duration) -> Self {
        Self {
            admin_id,
            expire_at: Utc::now() + ttl,
        }
    }

    /// TTL reaping is lazy, so expiry is also checked explicitly.
    pub fn is_live(&self) -> bool {
        self.expire_at > Utc::now()
    }
}

/// A session without an ID.
pub type NewAdminSession = AdminSessionCore;

/// A session from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminSession {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub session: AdminSessionCore,
}

impl Deref for AdminSession {
    type Target = AdminSessionCore;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liveness() {
        let admin_id = Id::new();
        assert!(NewAdminSession::new(admin_id, Duration::seconds(60)).is_live());
        assert!(!NewAdminSession::new(admin_id, Duration::seconds(-1)).is_live());
    }
}
