use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use secrecy::{ExposeSecret, SecretString};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::PgConnectOptions;

use crate::auth::policy::IdentityPolicy;

/// Signing key shipped in `configuration/local.yaml`.
pub const LOCAL_DEVELOPMENT_KEY: &str = "local-development-signing-key-change-me";

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Config {
    pub application: Application,
    /// When absent the gateway runs on the in-memory stores. Required in production.
    #[serde(default)]
    pub database: Option<Database>,
    pub jwt: Jwt,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub identity: IdentityPolicy,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Application {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    #[serde(default)]
    pub run_migration: bool,
}

impl Application {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Jwt {
    pub key: SecretString,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(
        default = "default_lifetime_minutes",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub lifetime_minutes: i64,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Session {
    #[serde(
        default = "default_lifetime_minutes",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub lifetime_minutes: i64,
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            lifetime_minutes: default_lifetime_minutes(),
            secure_cookie: false,
        }
    }
}

fn default_lifetime_minutes() -> i64 {
    24 * 60
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Database {
    pub username: String,
    pub password: SecretString,
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub database_name: String,
}

impl Database {
    pub fn without_db(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.password.expose_secret())
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        let base_path = std::env::current_dir()
            .map_err(|e| figment::Error::from(format!("Failed to read current directory: {e}")))?;
        let config_directory = base_path.join("configuration");

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(figment::Error::from)?;

        let environment_filename = format!("{}.yaml", environment.as_str());

        let config: Config = Figment::new()
            .merge(Yaml::file(config_directory.join("base.yaml")))
            .merge(Yaml::file(config_directory.join(environment_filename)))
            .merge(Env::raw().split("__"))
            .extract()?;

        config.validate(&environment)?;

        Ok(config)
    }

    pub fn validate(&self, environment: &Environment) -> Result<(), figment::Error> {
        let key = self.jwt.key.expose_secret();
        if key.is_empty() {
            return Err(figment::Error::from(String::from(
                "jwt.key must not be empty",
            )));
        }

        if let Environment::Production = environment {
            if key == LOCAL_DEVELOPMENT_KEY {
                return Err(figment::Error::from(String::from(
                    "jwt.key is the local development key, set JWT__KEY",
                )));
            }

            if self.database.is_none() {
                return Err(figment::Error::from(String::from(
                    "database must be configured in production",
                )));
            }
        }

        Ok(())
    }
}
