use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub wallet: WalletConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string of the hosted database (DATABASE_URL)
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the hosted auth service, e.g. https://xyz.supabase.co
    pub supabase_url: String,
    pub anon_key: String,
    pub service_role_key: String,
    /// When set, bearer tokens are verified locally instead of via /auth/v1/user
    pub jwt_secret: Option<String>,
    pub jwt_audience: String,
    /// Where magic links land after the provider has consumed them
    pub site_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub min_withdrawal: Decimal,
    /// Percentage of the package commission paid at each referral level, level 1 first
    pub commission_level_shares: Vec<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Some(v) = env::var("CASHFLOW_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Auth overrides
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.auth.supabase_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("SUPABASE_ANON_KEY") {
            self.auth.anon_key = v;
        }
        if let Ok(v) = env::var("SUPABASE_SERVICE_ROLE_KEY") {
            self.auth.service_role_key = v;
        }
        if let Ok(v) = env::var("SUPABASE_JWT_SECRET") {
            self.auth.jwt_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SUPABASE_JWT_AUDIENCE") {
            self.auth.jwt_audience = v;
        }
        if let Ok(v) = env::var("SITE_URL") {
            self.auth.site_url = v;
        }

        // Wallet overrides
        if let Ok(v) = env::var("WALLET_MIN_WITHDRAWAL") {
            self.wallet.min_withdrawal = Decimal::from_str(&v).unwrap_or(self.wallet.min_withdrawal);
        }
        if let Ok(v) = env::var("WALLET_COMMISSION_LEVEL_SHARES") {
            if let Some(shares) = parse_decimal_list(&v) {
                self.wallet.commission_level_shares = shares;
            }
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            auth: AuthConfig {
                supabase_url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                service_role_key: String::new(),
                jwt_secret: None,
                jwt_audience: "authenticated".to_string(),
                site_url: "http://localhost:5173".to_string(),
            },
            wallet: WalletConfig {
                min_withdrawal: Decimal::ONE,
                commission_level_shares: default_level_shares(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            auth: AuthConfig {
                supabase_url: String::new(),
                anon_key: String::new(),
                service_role_key: String::new(),
                jwt_secret: None,
                jwt_audience: "authenticated".to_string(),
                site_url: "https://staging.example.com".to_string(),
            },
            wallet: WalletConfig {
                min_withdrawal: Decimal::new(10, 0),
                commission_level_shares: default_level_shares(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            auth: AuthConfig {
                supabase_url: String::new(),
                anon_key: String::new(),
                service_role_key: String::new(),
                jwt_secret: None,
                jwt_audience: "authenticated".to_string(),
                site_url: "https://app.example.com".to_string(),
            },
            wallet: WalletConfig {
                min_withdrawal: Decimal::new(10, 0),
                commission_level_shares: default_level_shares(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

/// Three-level network: the direct referrer takes the full package rate,
/// the next two levels half and a quarter of it.
fn default_level_shares() -> Vec<Decimal> {
    vec![Decimal::new(100, 0), Decimal::new(50, 0), Decimal::new(25, 0)]
}

fn parse_decimal_list(raw: &str) -> Option<Vec<Decimal>> {
    raw.split(',')
        .map(|s| Decimal::from_str(s.trim()).ok())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.wallet.commission_level_shares.len(), 3);
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.max_connections, 50);
        assert_eq!(config.wallet.min_withdrawal, Decimal::new(10, 0));
        assert_eq!(config.security.cors_origins, vec!["https://app.example.com".to_string()]);
    }

    #[test]
    fn parses_level_share_lists() {
        let shares = parse_decimal_list("100, 40,10.5").unwrap();
        assert_eq!(shares, vec![Decimal::new(100, 0), Decimal::new(40, 0), Decimal::new(105, 1)]);
        assert!(parse_decimal_list("100,abc").is_none());
    }
}
