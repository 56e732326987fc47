//! CRM backend: customers, orders, campaigns and audience targeting.
//!
//! Data lives in DashMap-backed in-memory tables. Campaign runs are
//! simulated and complete on a timer.

pub mod auth;
pub mod campaigns;
pub mod dispatcher;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod router;
pub mod seed;
pub mod store;

pub use auth::AuthService;
pub use campaigns::CampaignService;
pub use dispatcher::{CampaignDispatcher, Dispatch, SimulatedDispatcher};
pub use handlers::{ApiError, ManagementState};
pub use router::management_router;
pub use seed::{seed_demo_data, SeedSummary};
pub use store::CrmStore;
