use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CRM__` (e.g. `CRM__API__HTTP_PORT=5000`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub campaigns: CampaignConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// ─── Campaign Execution Config ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
    /// Delay between `start` and the automatic transition to `completed`.
    #[serde(default = "default_completion_delay_ms")]
    pub completion_delay_ms: u64,
    #[serde(default = "default_delivery_rate")]
    pub delivery_rate: f64,
    #[serde(default = "default_open_rate")]
    pub open_rate: f64,
    #[serde(default = "default_click_rate")]
    pub click_rate: f64,
    #[serde(default = "default_preview_sample_size")]
    pub preview_sample_size: usize,
    #[serde(default = "default_insights_sample_size")]
    pub insights_sample_size: usize,
}

fn default_completion_delay_ms() -> u64 { 5000 }
fn default_delivery_rate() -> f64 { 0.95 }
fn default_open_rate() -> f64 { 0.25 }
fn default_click_rate() -> f64 { 0.05 }
fn default_preview_sample_size() -> usize { 10 }
fn default_insights_sample_size() -> usize { 5 }

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            completion_delay_ms: default_completion_delay_ms(),
            delivery_rate: default_delivery_rate(),
            open_rate: default_open_rate(),
            click_rate: default_click_rate(),
            preview_sample_size: default_preview_sample_size(),
            insights_sample_size: default_insights_sample_size(),
        }
    }
}

// ─── Auth Config ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

fn default_admin_name() -> String { "Admin User".to_string() }
fn default_admin_email() -> String { "admin@xeno-crm.com".to_string() }
fn default_admin_password() -> String { "admin123".to_string() }
fn default_token_ttl_hours() -> i64 { DEFAULT_TOKEN_TTL_HOURS }

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 168;
/// One year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

impl AuthConfig {
    /// Session lifetime, or `None` when `token_ttl_hours` is outside
    /// `1..=MAX_TOKEN_TTL_HOURS`.
    pub fn token_ttl(&self) -> Option<chrono::Duration> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return None;
        }
        chrono::Duration::try_hours(self.token_ttl_hours)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_name: default_admin_name(),
            admin_email: default_admin_email(),
            admin_password: default_admin_password(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed_enabled")]
    pub enabled: bool,
}

fn default_seed_enabled() -> bool { true }

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: default_seed_enabled(),
        }
    }
}

// Default functions
fn default_node_id() -> String {
    "crm-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    5000
}
fn default_frontend_origin() -> String {
    "http://localhost:5173".to_string()
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            frontend_origin: default_frontend_origin(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            campaigns: CampaignConfig::default(),
            auth: AuthConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CRM")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.auth.token_ttl().is_none() {
            return Err(config::ConfigError::Message(format!(
                "auth.token_ttl_hours must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_HOURS, self.auth.token_ttl_hours
            )));
        }
        Ok(())
    }
}
