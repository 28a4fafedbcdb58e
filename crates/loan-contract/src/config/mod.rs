use crate::workflows::contract::amortization::MAX_TERM_MONTHS;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8090;
const DEFAULT_PRINCIPAL: Decimal = dec!(100000);
const DEFAULT_TERM_MONTHS: u32 = 12;
const DEFAULT_ANNUAL_RATE: Decimal = dec!(4.35);

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub loan: LoanDefaults,
    pub form: FormDefaults,
    pub data: DataSources,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::parse(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("APP_PORT") {
            Ok(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidPort)?,
            Err(_) => DEFAULT_PORT,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let loan = LoanDefaults {
            principal: decimal_var("LOAN_DEFAULT_PRINCIPAL", DEFAULT_PRINCIPAL)?,
            term_months: match env::var("LOAN_DEFAULT_TERM_MONTHS") {
                Ok(value) => value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|months| (1..=MAX_TERM_MONTHS).contains(months))
                    .ok_or(ConfigError::InvalidTerm { value })?,
                Err(_) => DEFAULT_TERM_MONTHS,
            },
            annual_rate_percent: decimal_var("LOAN_DEFAULT_ANNUAL_RATE", DEFAULT_ANNUAL_RATE)?,
        };

        let form = FormDefaults {
            mirror_spouse: flag_var("FORM_MIRROR_SPOUSE", true)?,
        };

        let data = DataSources {
            branch_directory: path_var("BRANCH_DIRECTORY"),
            customer_roster: path_var("CUSTOMER_ROSTER"),
            form_options: path_var("FORM_OPTIONS"),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            loan,
            form,
            data,
        })
    }
}

fn decimal_var(key: &'static str, default: Decimal) -> Result<Decimal, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<Decimal>()
            .ok()
            .filter(|parsed| !parsed.is_sign_negative())
            .ok_or(ConfigError::InvalidDecimal { key, value }),
        Err(_) => Ok(default),
    }
}

fn flag_var(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(value) = env::var(key) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key, value }),
    }
}

fn path_var(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Values the repayment calculator starts from.
#[derive(Debug, Clone)]
pub struct LoanDefaults {
    pub principal: Decimal,
    pub term_months: u32,
    pub annual_rate_percent: Decimal,
}

#[derive(Debug, Clone)]
pub struct FormDefaults {
    pub mirror_spouse: bool,
}

/// Optional reference files loaded at startup.
#[derive(Debug, Clone, Default)]
pub struct DataSources {
    pub branch_directory: Option<PathBuf>,
    pub customer_roster: Option<PathBuf>,
    pub form_options: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDecimal { key: &'static str, value: String },
    InvalidTerm { value: String },
    InvalidFlag { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDecimal { key, value } => {
                write!(f, "{key} must be a non-negative decimal, got '{value}'")
            }
            ConfigError::InvalidTerm { value } => write!(
                f,
                "LOAN_DEFAULT_TERM_MONTHS must be a whole number from 1 to {MAX_TERM_MONTHS}, got '{value}'"
            ),
            ConfigError::InvalidFlag { key, value } => {
                write!(f, "{key} must be true or false, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "LOAN_DEFAULT_PRINCIPAL",
            "LOAN_DEFAULT_TERM_MONTHS",
            "LOAN_DEFAULT_ANNUAL_RATE",
            "FORM_MIRROR_SPOUSE",
            "BRANCH_DIRECTORY",
            "CUSTOMER_ROSTER",
            "FORM_OPTIONS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.loan.principal, dec!(100000));
        assert_eq!(config.loan.term_months, 12);
        assert_eq!(config.loan.annual_rate_percent, dec!(4.35));
        assert!(config.form.mirror_spouse);
        assert!(config.data.branch_directory.is_none());
        assert!(config.data.form_options.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8090));
        reset_env();
    }

    #[test]
    fn reads_loan_and_form_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("LOAN_DEFAULT_PRINCIPAL", "250000.50");
        env::set_var("LOAN_DEFAULT_TERM_MONTHS", "36");
        env::set_var("FORM_MIRROR_SPOUSE", "off");
        env::set_var("CUSTOMER_ROSTER", "data/customers.csv");
        env::set_var("FORM_OPTIONS", " data/config.json ");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.loan.principal, dec!(250000.50));
        assert_eq!(config.loan.term_months, 36);
        assert!(!config.form.mirror_spouse);
        assert_eq!(
            config.data.customer_roster,
            Some(PathBuf::from("data/customers.csv"))
        );
        assert_eq!(
            config.data.form_options,
            Some(PathBuf::from("data/config.json"))
        );
        reset_env();
    }

    #[test]
    fn rejects_malformed_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "eighty");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidPort)));

        reset_env();
        env::set_var("LOAN_DEFAULT_TERM_MONTHS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidTerm { .. })
        ));

        reset_env();
        env::set_var("LOAN_DEFAULT_TERM_MONTHS", "361");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidTerm { .. })
        ));

        reset_env();
        env::set_var("LOAN_DEFAULT_ANNUAL_RATE", "-1");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidDecimal {
                key: "LOAN_DEFAULT_ANNUAL_RATE",
                ..
            })
        ));

        reset_env();
        env::set_var("FORM_MIRROR_SPOUSE", "maybe");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFlag { .. })
        ));
        reset_env();
    }
}
