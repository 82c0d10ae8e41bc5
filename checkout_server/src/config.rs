use std::{env, time::Duration};

use checkout_common::{parse_boolean_flag, Secret};
use checkout_engine::{DEFAULT_CHECKOUT_TIMEOUT, DEFAULT_PAYMENT_METHOD};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::errors::ServerError;

const DEFAULT_CHK_HOST: &str = "127.0.0.1";
const DEFAULT_CHK_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/checkout.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub auth: AuthConfig,
    /// The secret shared with the payment gateway. If it is missing, the server still starts, but every checkout is
    /// refused as "not configured".
    pub gateway_secret: Option<Secret<String>>,
    /// The value recorded in `orders.payment_method`
    pub payment_method: String,
    /// Upper bound on a single order finalization, including waiting for the database write lock.
    pub checkout_timeout: Duration,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CHK_HOST.to_string(),
            port: DEFAULT_CHK_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            auth: AuthConfig::default(),
            gateway_secret: None,
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
            use_x_forwarded_for: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CHK_HOST").ok().unwrap_or_else(|| DEFAULT_CHK_HOST.into());
        let port = env::var("CHK_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CHK_PORT. {e} Using the default, {DEFAULT_CHK_PORT}, instead."
                    );
                    DEFAULT_CHK_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CHK_PORT);
        let database_url = env::var("CHK_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CHK_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let db_max_connections = env::var("CHK_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for CHK_DB_MAX_CONNECTIONS. {e}"))
                    .ok()
            })
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let gateway_secret = configure_gateway_secret();
        let payment_method = env::var("CHK_PAYMENT_METHOD")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());
        let checkout_timeout = configure_checkout_timeout();
        let use_x_forwarded_for = parse_boolean_flag(env::var("CHK_USE_X_FORWARDED_FOR").ok(), false);
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            auth,
            gateway_secret,
            payment_method,
            checkout_timeout,
            use_x_forwarded_for,
        }
    }
}

fn configure_gateway_secret() -> Option<Secret<String>> {
    match env::var("CHK_GATEWAY_KEY_SECRET").map(Secret::new) {
        Ok(secret) if !secret.is_blank() => Some(secret),
        _ => {
            error!(
                "🚨️ CHK_GATEWAY_KEY_SECRET is not set. The server will run, but every checkout will be refused until \
                 the payment gateway secret is configured."
            );
            None
        },
    }
}

fn configure_checkout_timeout() -> Duration {
    env::var("CHK_CHECKOUT_TIMEOUT_MS")
        .map_err(|_| {
            info!(
                "🪛️ CHK_CHECKOUT_TIMEOUT_MS is not set. Using the default value of {} ms.",
                DEFAULT_CHECKOUT_TIMEOUT.as_millis()
            )
        })
        .and_then(|s| {
            s.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| warn!("🪛️ Invalid configuration value for CHK_CHECKOUT_TIMEOUT_MS. {e}"))
        })
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or(DEFAULT_CHECKOUT_TIMEOUT)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 key shared with the identity provider. Bearer tokens are only accepted if they were signed with it.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No token issued by \
             your identity provider will be accepted. DO NOT operate on production like this. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.to_string()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("CHK_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [CHK_JWT_SECRET]")))?;
        let jwt_secret = Secret::new(secret);
        if jwt_secret.is_blank() {
            return Err(ServerError::ConfigurationError("CHK_JWT_SECRET is empty".to_string()));
        }
        Ok(Self { jwt_secret })
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for }
    }
}
