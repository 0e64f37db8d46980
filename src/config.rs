use chrono::Duration;
use log::{error, info};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::error::Result;
use crate::model::{
    api::admin::AdminCredentials,
    db::{admin::ensure_admin_exists, question::ensure_catalog_seeded},
    mongodb::{ensure_indexes_exist, Coll},
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    base_url: String,
    auth_ttl: u32,
    default_admin_username: String,
    #[serde(default)]
    dashboard: DashboardConfig,
    // secrets
    jwt_secret: String,
    default_admin_password: String,
}

impl Config {
    /// Public origin of the site, without a trailing slash.
    /// Response URLs handed to respondents are built from it.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Valid lifetime of admin sessions in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    pub fn default_admin_username(&self) -> &str {
        &self.default_admin_username
    }

    /// Credentials of the admin created on first launch.
    pub fn default_admin_credentials(&self) -> AdminCredentials {
        AdminCredentials {
            username: self.default_admin_username.clone(),
            password: self.default_admin_password.clone(),
        }
    }

    /// Which questions feed the dashboard's fixed panels.
    pub fn dashboard(&self) -> &DashboardConfig {
        &self.dashboard
    }
}

/// Question numbers behind each panel of the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DashboardConfig {
    /// Choice question: which headset respondents use.
    pub headset: u32,
    /// Choice question: where they buy content.
    pub store: u32,
    /// Choice question: what they use the headset for.
    pub usage: u32,
    /// Scale questions rating the product.
    pub quality: Vec<u32>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            headset: 5,
            store: 6,
            usage: 9,
            quality: (10..=14).collect(),
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places both a `Client` and a `Database`
/// into managed state.
///
/// Must be attached after [`ConfigFairing`].
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name());

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to connect to database: {e}");
            return Err(rocket);
        }

        // Ensure there is at least one admin and the question catalog is seeded.
        let Some(credentials) = rocket
            .state::<Config>()
            .map(Config::default_admin_credentials)
        else {
            error!("Application config must be loaded before the database");
            return Err(rocket);
        };
        if let Err(e) = initialise(&db, credentials).await {
            error!("Failed to initialise database: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

/// First-launch setup. Safe to run on every launch.
async fn initialise(db: &mongodb::Database, admin: AdminCredentials) -> Result<()> {
    ensure_admin_exists(&Coll::from_db(db), admin).await?;
    ensure_catalog_seeded(&Coll::from_db(db)).await?;
    Ok(())
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
fn get_database_name() -> String {
    "bigscreen".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Config {
        pub fn example() -> Self {
            Self {
                base_url: "http://localhost:8000/".to_string(),
                auth_ttl: 3600,
                default_admin_username: AdminCredentials::example().username,
                dashboard: DashboardConfig::default(),
                jwt_secret: "test-jwt-secret".to_string(),
                default_admin_password: AdminCredentials::example().password,
            }
        }

        pub fn set_jwt_secret(&mut self, secret: &str) {
            self.jwt_secret = secret.to_string();
        }
    }
}
