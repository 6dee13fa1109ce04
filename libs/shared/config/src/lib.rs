use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_URL not set, using default");
                    "postgres://localhost/clinic".to_string()
                }),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
            server_port: parse_or("SERVER_PORT", 3001),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            jwt_ttl_minutes: parse_or("JWT_TTL_MINUTES", 480),
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.database_url.is_empty() && !self.jwt_secret.is_empty()
    }

    /// Both bootstrap variables must be present and non-empty.
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_admin_email, &self.bootstrap_admin_password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/clinic_test".to_string(),
            database_max_connections: 5,
            server_port: 3001,
            jwt_secret: "secret".to_string(),
            jwt_ttl_minutes: 60,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }

    #[test]
    fn test_is_configured_requires_secret() {
        let mut config = base_config();
        assert!(config.is_configured());

        config.jwt_secret = String::new();
        assert!(!config.is_configured());
    }

    #[test]
    fn test_bootstrap_admin_requires_both_values() {
        let mut config = base_config();
        assert!(config.bootstrap_admin().is_none());

        config.bootstrap_admin_email = Some("admin@clinic.test".to_string());
        assert!(config.bootstrap_admin().is_none());

        config.bootstrap_admin_password = Some(String::new());
        assert!(config.bootstrap_admin().is_none());

        config.bootstrap_admin_password = Some("changeme123".to_string());
        assert_eq!(config.bootstrap_admin(), Some(("admin@clinic.test", "changeme123")));
    }
}
