//! Environment-driven configuration, read once at startup.
//!
//! M-Pesa variables resolve through a legacy name first and then the
//! `DARAJA_`-prefixed alias; both naming schemes are deployed in the
//! wild and must keep working.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    /// Base URL the payment redirect callbacks send the customer back to.
    pub frontend_url: String,
    /// `None` selects mock mode for M-Pesa.
    pub mpesa: Option<MpesaConfig>,
    /// `None` selects mock mode for Flutterwave.
    pub flutterwave: Option<FlutterwaveConfig>,
    /// Pending transactions older than this are swept to `cancelled`.
    pub pending_ttl_minutes: i32,
    pub sweep_interval_secs: u64,
    /// Optional bootstrap admin, seeded when the admins table is empty.
    pub seed_admin: Option<SeedAdmin>,
}

#[derive(Debug, Clone)]
pub struct MpesaConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub shortcode: String,
    pub passkey: String,
    pub callback_url: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct FlutterwaveConfig {
    pub secret_key: String,
    pub base_url: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

const DEFAULT_MPESA_BASE: &str = "https://sandbox.safaricom.co.ke";
const DEFAULT_FLW_BASE: &str = "https://api.flutterwave.com";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary lookup. Split out from
    /// [`AppConfig::from_env`] so tests never touch process env.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let any = |names: &[&str]| names.iter().find_map(|n| get(n).filter(|v| !v.is_empty()));

        let port = match any(&["PORT"]) {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value: v })?,
            None => 8080,
        };

        let database_url = any(&["DATABASE_URL"]).ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = any(&["JWT_SECRET"]).ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let frontend_url =
            any(&["FRONTEND_URL"]).unwrap_or_else(|| "http://localhost:3000".to_string());

        // All four core credentials must be present to leave mock mode.
        let mpesa = match (
            any(&["MPESA_CONSUMER_KEY", "DARAJA_CONSUMER_KEY"]),
            any(&["MPESA_CONSUMER_SECRET", "DARAJA_CONSUMER_SECRET"]),
            any(&["MPESA_SHORTCODE", "DARAJA_SHORTCODE"]),
            any(&["MPESA_PASSKEY", "DARAJA_PASSKEY"]),
        ) {
            (Some(consumer_key), Some(consumer_secret), Some(shortcode), Some(passkey)) => {
                Some(MpesaConfig {
                    consumer_key,
                    consumer_secret,
                    shortcode,
                    passkey,
                    callback_url: any(&["MPESA_CALLBACK_URL", "DARAJA_CALLBACK_URL"])
                        .unwrap_or_else(|| format!("{frontend_url}/api/payment/mpesa-callback")),
                    base_url: any(&["MPESA_BASE_URL", "DARAJA_BASE_URL"])
                        .unwrap_or_else(|| DEFAULT_MPESA_BASE.to_string()),
                })
            }
            _ => None,
        };

        let flutterwave = any(&["FLW_SECRET_KEY", "FLUTTERWAVE_SECRET_KEY"]).map(|secret_key| {
            FlutterwaveConfig {
                secret_key,
                base_url: any(&["FLW_BASE_URL"]).unwrap_or_else(|| DEFAULT_FLW_BASE.to_string()),
                redirect_url: any(&["FLW_REDIRECT_URL"])
                    .unwrap_or_else(|| format!("{frontend_url}/api/payment/flutterwave-callback")),
            }
        });

        let pending_ttl_minutes = match any(&["PENDING_PAYMENT_TTL_MINUTES"]) {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "PENDING_PAYMENT_TTL_MINUTES",
                value: v,
            })?,
            None => 60,
        };

        let sweep_interval_secs = match any(&["PAYMENT_SWEEP_INTERVAL_SECS"]) {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "PAYMENT_SWEEP_INTERVAL_SECS",
                value: v,
            })?,
            None => 300,
        };

        let seed_admin = match (any(&["ADMIN_EMAIL"]), any(&["ADMIN_PASSWORD"])) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            _ => None,
        };

        Ok(Self {
            port,
            database_url,
            jwt_secret,
            frontend_url,
            mpesa,
            flutterwave,
            pending_ttl_minutes,
            sweep_interval_secs,
            seed_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/seekon"),
            ("JWT_SECRET", "test-secret"),
        ])
    }

    fn config_from(env: &HashMap<&str, &str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|name| env.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let mut env = base_env();
        env.remove("JWT_SECRET");
        assert!(matches!(
            config_from(&env),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    fn absent_provider_credentials_select_mock_mode() {
        let cfg = config_from(&base_env()).unwrap();
        assert!(cfg.mpesa.is_none());
        assert!(cfg.flutterwave.is_none());
    }

    #[test]
    fn partial_mpesa_credentials_stay_in_mock_mode() {
        let mut env = base_env();
        env.insert("MPESA_CONSUMER_KEY", "key");
        env.insert("MPESA_CONSUMER_SECRET", "secret");
        assert!(config_from(&env).unwrap().mpesa.is_none());
    }

    #[test]
    fn daraja_prefixed_names_are_accepted() {
        let mut env = base_env();
        env.insert("DARAJA_CONSUMER_KEY", "key");
        env.insert("DARAJA_CONSUMER_SECRET", "secret");
        env.insert("DARAJA_SHORTCODE", "174379");
        env.insert("DARAJA_PASSKEY", "passkey");
        let mpesa = config_from(&env).unwrap().mpesa.unwrap();
        assert_eq!(mpesa.consumer_key, "key");
        assert_eq!(mpesa.shortcode, "174379");
        assert_eq!(mpesa.base_url, DEFAULT_MPESA_BASE);
    }

    #[test]
    fn legacy_name_wins_over_daraja_alias() {
        let mut env = base_env();
        env.insert("MPESA_CONSUMER_KEY", "legacy");
        env.insert("DARAJA_CONSUMER_KEY", "prefixed");
        env.insert("MPESA_CONSUMER_SECRET", "secret");
        env.insert("MPESA_SHORTCODE", "174379");
        env.insert("MPESA_PASSKEY", "passkey");
        let mpesa = config_from(&env).unwrap().mpesa.unwrap();
        assert_eq!(mpesa.consumer_key, "legacy");
    }

    #[test]
    fn empty_string_counts_as_absent() {
        let mut env = base_env();
        env.insert("MPESA_CONSUMER_KEY", "");
        env.insert("DARAJA_CONSUMER_KEY", "prefixed");
        env.insert("MPESA_CONSUMER_SECRET", "secret");
        env.insert("MPESA_SHORTCODE", "174379");
        env.insert("MPESA_PASSKEY", "passkey");
        let mpesa = config_from(&env).unwrap().mpesa.unwrap();
        assert_eq!(mpesa.consumer_key, "prefixed");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut env = base_env();
        env.insert("PORT", "not-a-port");
        assert!(matches!(
            config_from(&env),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }

    #[test]
    fn defaults_applied() {
        let cfg = config_from(&base_env()).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.pending_ttl_minutes, 60);
        assert_eq!(cfg.sweep_interval_secs, 300);
        assert_eq!(cfg.frontend_url, "http://localhost:3000");
    }
}
