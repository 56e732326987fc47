pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, AuthConfig, CampaignConfig};
pub use error::{CrmError, CrmResult};
pub use types::{Address, Customer, CustomerStatus, CustomerSummary, MarketingPreferences};
