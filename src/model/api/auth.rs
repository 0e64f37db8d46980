use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use log::warn;
use mongodb::{bson::doc, Database};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    db::session::AdminSession,
    mongodb::{Coll, Id},
};

/// Scheme prefix of the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// An authenticated admin, proven by a bearer token naming a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "adm")]
    pub admin_id: Id,
    #[serde(rename = "ses")]
    pub session_id: Id,
}

impl AuthToken {
    pub fn new(admin_id: Id, session_id: Id) -> Self {
        Self {
            admin_id,
            session_id,
        }
    }

    /// Sign this token, valid until `expire_at`.
    pub fn encode(self, expire_at: DateTime<Utc>, config: &Config) -> Result<String> {
        let claims = Claims {
            token: self,
            expire_at,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;
        Ok(token)
    }

    /// Verify and decode a signed token.
    pub fn decode(token: &str, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }

    /// Extract and verify the token carried by an `Authorization` header value.
    pub fn from_header(header: &str, config: &Config) -> Result<Self> {
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| Error::unauthorized("Expected a bearer token."))?;
        Self::decode(token.trim(), config)
    }

    /// Check the session this token names still exists and belongs to the
    /// token's admin.
    pub async fn verify_session(&self, sessions: &Coll<AdminSession>) -> Result<()> {
        let filter = doc! {
            "_id": self.session_id,
            "admin_id": self.admin_id,
        };
        match sessions.find_one(filter, None).await? {
            Some(session) if session.is_live() => Ok(()),
            _ => Err(Error::unauthorized("Session has ended.")),
        }
    }
}

/// Token claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// Response to a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the `Authorization` header and check that its
    /// session is still live.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` and `Database` are always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();
        let db = req.guard::<&State<Database>>().await.unwrap();

        let header = match req.headers().get_one("Authorization") {
            Some(header) => header,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("Missing bearer token."),
                ))
            }
        };

        let token = match Self::from_header(header, config) {
            Ok(token) => token,
            Err(e) => {
                warn!("Rejected admin credential: {e}");
                return Outcome::Failure((Status::Unauthorized, e));
            }
        };

        match token.verify_session(&Coll::from_db(db)).await {
            Ok(()) => Outcome::Success(token),
            Err(e) => {
                let status = e.status();
                warn!("Rejected admin session {}: {e}", token.session_id);
                Outcome::Failure((status, e))
            }
        }
    }
}
