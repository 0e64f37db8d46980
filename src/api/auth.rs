use log::info;
use mongodb::bson::doc;
use rocket::{
    serde::json::{json, Json, Value},
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            admin::AdminCredentials,
            auth::{AuthToken, LoginResponse},
        },
        db::{
            admin::Admin,
            session::{AdminSession, NewAdminSession},
        },
        mongodb::{Coll, Id},
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![login, logout]
}

/// Exchange admin credentials for a bearer token backed by a new session.
#[post("/admin/login", data = "<credentials>", format = "json")]
pub async fn login(
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
    sessions: Coll<AdminSession>,
    config: &State<Config>,
) -> Result<Json<LoginResponse>> {
    let with_username = doc! {
        "username": &credentials.username
    };

    let admin = admins
        .find_one(with_username, None)
        .await?
        .filter(|admin| admin.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::unauthorized(
                "No admin found with the provided username and password combination.",
            )
        })?;

    let session = AdminSession {
        id: Id::new(),
        session: NewAdminSession::new(admin.id, config.auth_ttl()),
    };
    sessions.insert_one(&session, None).await?;
    info!("Admin '{}' logged in, session {}", admin.username, session.id);

    let token = AuthToken::new(admin.id, session.id).encode(session.expire_at, config)?;
    Ok(Json(LoginResponse {
        token,
        expires_at: session.expire_at,
    }))
}

/// End the session behind the presented token. The token is useless afterwards.
#[post("/admin/logout")]
pub async fn logout(token: AuthToken, sessions: Coll<AdminSession>) -> Result<Json<Value>> {
    sessions.delete_one(token.session_id.as_doc(), None).await?;
    info!("Admin session {} ended", token.session_id);
    Ok(Json(json!({ "message": "Logged out." })))
}

#[cfg(all(test, feature = "mongodb-tests"))]
mod tests {
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::Client,
    };

    use crate::model::api::auth::BEARER_PREFIX;

    use super::*;

    fn default_credentials(client: &Client) -> AdminCredentials {
        client
            .rocket()
            .state::<Config>()
            .unwrap()
            .default_admin_credentials()
    }

    #[backend_test]
    async fn login_valid(client: Client, sessions: Coll<AdminSession>) {
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(default_credentials(&client)).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let login = response.into_json::<LoginResponse>().await.unwrap();
        let config = client.rocket().state::<Config>().unwrap();
        let token = AuthToken::decode(&login.token, config).unwrap();
        let session = sessions
            .find_one(token.session_id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.admin_id, token.admin_id);
        assert!(session.is_live());
    }

    #[backend_test]
    async fn login_invalid(client: Client, sessions: Coll<AdminSession>) {
        // Unknown username.
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(AdminCredentials::empty()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        // Wrong password.
        let mut credentials = default_credentials(&client);
        credentials.password.push('!');
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(credentials).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        assert_eq!(sessions.count_documents(None, None).await.unwrap(), 0);
    }

    #[backend_test(admin)]
    async fn logout_revokes_token(client: Client, auth: Header, sessions: Coll<AdminSession>) {
        let response = client
            .post(uri!(logout))
            .header(auth.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(sessions.count_documents(None, None).await.unwrap(), 0);

        // The same token is now rejected.
        let response = client.post(uri!(logout)).header(auth).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test]
    async fn logout_requires_token(client: Client) {
        let response = client.post(uri!(logout)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());

        let response = client
            .post(uri!(logout))
            .header(Header::new("Authorization", format!("{BEARER_PREFIX}garbage")))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }
}
