use domain::services::TokenTtls;
use domain::EngineSettings;
use serde::Deserialize;
use shared::attendance_token::MIN_SECRET_LEN;
use shared::jwt::{AccessTokenVerifier, JwtError};
use shared::{AttendanceTokenService, TokenKeyError};
use std::net::{AddrParseError, SocketAddr};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// Requester access token verification
    pub jwt: JwtAuthConfig,
    /// Attendance token signing
    pub attendance: AttendanceConfig,
    /// Background sweeps
    pub scheduler: SchedulerConfig,
    /// Email service configuration
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Key required in `X-API-Key` for admin routes. Empty disables them.
    #[serde(default)]
    pub admin_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// RS256 (identity service public key) or HS256 (shared secret)
    #[serde(default = "default_jwt_algorithm")]
    pub algorithm: String,

    /// RSA public key in PEM format for verifying tokens
    #[serde(default)]
    pub public_key: String,

    /// Shared secret, used only with HS256
    #[serde(default)]
    pub hs256_secret: String,

    /// Leeway in seconds for clock skew tolerance (default: 30)
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

impl JwtAuthConfig {
    /// Builds the access token verifier for the configured algorithm.
    pub fn verifier(&self) -> Result<AccessTokenVerifier, JwtError> {
        match self.algorithm.to_ascii_uppercase().as_str() {
            "HS256" => AccessTokenVerifier::hs256(&self.hs256_secret, self.leeway_secs),
            "RS256" => AccessTokenVerifier::rs256(&self.public_key, self.leeway_secs),
            other => Err(JwtError::InvalidKey(format!(
                "Unsupported algorithm: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceConfig {
    /// HMAC secret for attendance tokens, at least 32 bytes
    pub token_secret: String,

    /// Lifetime of the token displayed at the venue (default: 4 hours)
    #[serde(default = "default_event_token_ttl")]
    pub event_token_ttl_secs: i64,

    /// Lifetime of an attendee's personal token (default: 5 minutes)
    #[serde(default = "default_subject_token_ttl")]
    pub subject_token_ttl_secs: i64,
}

impl AttendanceConfig {
    pub fn token_service(&self) -> Result<AttendanceTokenService, TokenKeyError> {
        AttendanceTokenService::new(self.token_secret.as_bytes())
    }

    pub fn token_ttls(&self) -> TokenTtls {
        TokenTtls {
            event_token: chrono::Duration::seconds(self.event_token_ttl_secs),
            subject_token: chrono::Duration::seconds(self.subject_token_ttl_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the background sweeps run in this process
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_sweep_interval")]
    pub lifecycle_interval_secs: u64,

    /// Events handled per phase of one lifecycle sweep
    #[serde(default = "default_batch_limit")]
    pub lifecycle_batch_limit: i64,

    #[serde(default = "default_sweep_interval")]
    pub reminder_interval_secs: u64,

    /// Reminders claimed per reminder sweep
    #[serde(default = "default_batch_limit")]
    pub reminder_batch_limit: i64,

    /// Seconds before an unreleased sweep lease is considered abandoned
    #[serde(default = "default_lease_ttl")]
    pub lease_ttl_secs: i64,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_jwt_algorithm() -> String {
    "RS256".to_string()
}
fn default_jwt_leeway() -> u64 {
    30
}
fn default_event_token_ttl() -> i64 {
    4 * 3600
}
fn default_subject_token_ttl() -> i64 {
    300
}
fn default_true() -> bool {
    true
}
fn default_sweep_interval() -> u64 {
    60
}
fn default_batch_limit() -> i64 {
    100
}
fn default_lease_ttl() -> i64 {
    300
}

/// Email service configuration for reminder emails.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Whether email sending is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Email provider: sendgrid, or console (for development)
    #[serde(default = "default_email_provider")]
    pub provider: String,

    /// SendGrid API key (for sendgrid provider)
    #[serde(default)]
    pub sendgrid_api_key: String,

    /// Sender email address (From header)
    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    /// Sender name (From header)
    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Base URL for email links (e.g., https://app.example.com)
    #[serde(default)]
    pub base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            sendgrid_api_key: String::new(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
            base_url: String::new(),
        }
    }
}

fn default_email_provider() -> String {
    "console".to_string()
}

fn default_sender_email() -> String {
    "noreply@turnout.events".to_string()
}

fn default_sender_name() -> String {
    "Turnout".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with TURNOUT__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("TURNOUT").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on config files.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            admin_api_key = ""

            [jwt]
            algorithm = "HS256"
            hs256_secret = "test-jwt-secret-not-for-production"
            leeway_secs = 30

            [attendance]
            token_secret = "test-attendance-secret-0123456789abcdef"
            event_token_ttl_secs = 14400
            subject_token_ttl_secs = 300

            [scheduler]
            enabled = false
            lifecycle_interval_secs = 60
            lifecycle_batch_limit = 100
            reminder_interval_secs = 60
            reminder_batch_limit = 100
            lease_ttl_secs = 300

            [email]
            enabled = false
            provider = "console"
            sender_email = "test@example.com"
            sender_name = "Test"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Validation is left to the caller so tests can build partial configs
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "TURNOUT__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.attendance.token_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigValidationError::InvalidValue(format!(
                "attendance.token_secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        if self.attendance.event_token_ttl_secs <= 0 || self.attendance.subject_token_ttl_secs <= 0
        {
            return Err(ConfigValidationError::InvalidValue(
                "attendance token TTLs must be positive".to_string(),
            ));
        }

        if self.scheduler.lifecycle_batch_limit <= 0 || self.scheduler.reminder_batch_limit <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "scheduler batch limits must be positive".to_string(),
            ));
        }

        if self.scheduler.lifecycle_interval_secs == 0
            || self.scheduler.reminder_interval_secs == 0
            || self.scheduler.lease_ttl_secs <= 0
        {
            return Err(ConfigValidationError::InvalidValue(
                "scheduler intervals and lease TTL must be positive".to_string(),
            ));
        }

        match self.jwt.algorithm.to_ascii_uppercase().as_str() {
            "RS256" if self.jwt.public_key.is_empty() => {
                return Err(ConfigValidationError::MissingRequired(
                    "jwt.public_key is required for RS256".to_string(),
                ))
            }
            "HS256" if self.jwt.hs256_secret.is_empty() => {
                return Err(ConfigValidationError::MissingRequired(
                    "jwt.hs256_secret is required for HS256".to_string(),
                ))
            }
            "RS256" | "HS256" => {}
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "jwt.algorithm must be RS256 or HS256, got {}",
                    other
                )))
            }
        }

        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            token_ttls: self.attendance.token_ttls(),
            lease_ttl: chrono::Duration::seconds(self.scheduler.lease_ttl_secs),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
