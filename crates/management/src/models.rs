//! CRM domain types: campaigns, orders, audit log and the API payloads.

use chrono::{DateTime, Utc};
use crm_core::{Address, Customer, CustomerStatus, CustomerSummary, CrmError, CrmResult, MarketingPreferences};
use crm_segmentation::Rule;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Campaign ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub message: CampaignMessage,
    pub audience_rules: Vec<Rule>,
    /// Snapshot taken at create/update/start. Not kept in sync with later
    /// customer changes.
    pub audience_size: u64,
    pub status: CampaignStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Start of the current run. Doubles as the run token checked by the
    /// deferred completion.
    pub sent_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub stats: CampaignStats,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CampaignType {
    Email,
    Sms,
    Push,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Scheduled,
    Running,
    Completed,
    Paused,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::Running => "running",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMessage {
    #[serde(default)]
    pub subject: Option<String>,
    pub content: String,
    #[serde(default)]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStats {
    pub sent: u64,
    pub delivered: u64,
    pub opened: u64,
    pub clicked: u64,
    pub failed: u64,
    pub unsubscribed: u64,
}

// ─── Order ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: Option<Address>,
    pub order_date: DateTime<Utc>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_name: String,
    pub quantity: u32,
    pub price: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Orders that count towards revenue.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, OrderStatus::Shipped | OrderStatus::Delivered)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    DebitCard,
    Upi,
    NetBanking,
    CashOnDelivery,
}

// ─── Users ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

// ─── Audit Log ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub user: String,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Start,
    Pause,
    Complete,
    Login,
}

// ─── Pagination ────────────────────────────────────────────────────────────

/// Requested page, already bounds-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

impl PageRequest {
    pub fn new(page: Option<usize>, limit: Option<usize>) -> CrmResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if page < 1 {
            return Err(CrmError::validation("Page must be a positive integer"));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(CrmError::validation("Limit must be between 1 and 100"));
        }
        Ok(Self { page, limit })
    }

    /// Slice one page out of an already sorted collection.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total_items = items.len();
        let total_pages = total_items.div_ceil(self.limit);
        let data = items
            .into_iter()
            .skip((self.page - 1).saturating_mul(self.limit))
            .take(self.limit)
            .collect();
        Page {
            data,
            pagination: Pagination {
                current_page: self.page,
                total_pages,
                total_items,
                has_next_page: self.page < total_pages,
                has_prev_page: self.page > 1,
            },
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

// ─── Query strings ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<CampaignStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub status: Option<CustomerStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<OrderStatus>,
    pub customer_id: Option<Uuid>,
}

// ─── Campaign requests ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub message: CampaignMessage,
    #[serde(default)]
    pub audience_rules: Vec<Rule>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl CreateCampaignRequest {
    pub fn validate(&self) -> CrmResult<()> {
        validate_campaign_name(&self.name)?;
        validate_message(&self.message)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: Option<CampaignType>,
    pub message: Option<CampaignMessage>,
    pub audience_rules: Option<Vec<Rule>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: Option<CampaignStatus>,
}

impl UpdateCampaignRequest {
    pub fn validate(&self) -> CrmResult<()> {
        if let Some(name) = &self.name {
            validate_campaign_name(name)?;
        }
        if let Some(message) = &self.message {
            validate_message(message)?;
        }
        Ok(())
    }
}

fn validate_campaign_name(name: &str) -> CrmResult<()> {
    if name.trim().chars().count() < 2 {
        return Err(CrmError::validation("Campaign name must be at least 2 characters"));
    }
    Ok(())
}

fn validate_message(message: &CampaignMessage) -> CrmResult<()> {
    if message.content.trim().is_empty() {
        return Err(CrmError::validation("Message content is required"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewAudienceRequest {
    pub audience_rules: Vec<Rule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentInsightsRequest {
    pub rules: Vec<Rule>,
}

// ─── Customer requests ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub total_spending: f64,
    #[serde(default)]
    pub visits: u64,
    #[serde(default)]
    pub last_purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub registration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: CustomerStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub preferences: MarketingPreferences,
}

impl CreateCustomerRequest {
    pub fn validate(&self) -> CrmResult<()> {
        validate_customer_name(&self.name)?;
        validate_email(&self.email)?;
        validate_spending(self.total_spending)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub total_spending: Option<f64>,
    pub visits: Option<u64>,
    pub last_purchase_date: Option<DateTime<Utc>>,
    pub status: Option<CustomerStatus>,
    pub tags: Option<Vec<String>>,
    pub address: Option<Address>,
    pub preferences: Option<MarketingPreferences>,
}

impl UpdateCustomerRequest {
    pub fn validate(&self) -> CrmResult<()> {
        if let Some(name) = &self.name {
            validate_customer_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(spending) = self.total_spending {
            validate_spending(spending)?;
        }
        Ok(())
    }
}

fn validate_customer_name(name: &str) -> CrmResult<()> {
    if name.trim().chars().count() < 2 {
        return Err(CrmError::validation("Name must be at least 2 characters"));
    }
    Ok(())
}

fn validate_email(email: &str) -> CrmResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(CrmError::validation("Please provide a valid email"));
    }
    Ok(())
}

fn validate_spending(spending: f64) -> CrmResult<()> {
    if !spending.is_finite() || spending < 0.0 {
        return Err(CrmError::validation("Total spending must be a non-negative number"));
    }
    Ok(())
}

/// Emails are stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    pub customer: Customer,
    pub recent_orders: Vec<Order>,
}

// ─── Order requests ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_name: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub items: Vec<OrderItemInput>,
    pub total_amount: f64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub order_date: Option<DateTime<Utc>>,
}

/// Allowed difference between the stated total and the item sum.
pub const ORDER_TOTAL_TOLERANCE: f64 = 0.01;

impl CreateOrderRequest {
    /// Check the payload and compute per-item totals.
    pub fn priced_items(&self) -> CrmResult<Vec<OrderItem>> {
        if self.items.is_empty() {
            return Err(CrmError::validation("At least one item is required"));
        }
        if !self.total_amount.is_finite() || self.total_amount < 0.0 {
            return Err(CrmError::validation("Total amount must be non-negative"));
        }

        let mut items = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if item.product_name.trim().is_empty() {
                return Err(CrmError::validation("Product name is required"));
            }
            if item.quantity < 1 {
                return Err(CrmError::validation("Quantity must be at least 1"));
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(CrmError::validation("Price must be non-negative"));
            }
            items.push(OrderItem {
                product_name: item.product_name.trim().to_string(),
                quantity: item.quantity,
                price: item.price,
                total: item.quantity as f64 * item.price,
            });
        }

        let computed: f64 = items.iter().map(|i| i.total).sum();
        if (computed - self.total_amount).abs() > ORDER_TOTAL_TOLERANCE {
            return Err(CrmError::validation("Total amount does not match sum of items"));
        }
        Ok(items)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

// ─── Analytics ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOverview {
    pub total_customers: usize,
    pub active_customers: usize,
    pub inactive_customers: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAnalytics {
    pub overview: CustomerOverview,
    pub top_spenders: Vec<CustomerSummary>,
    pub recent_customers: Vec<CustomerSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOverview {
    pub total_orders: usize,
    pub pending_orders: usize,
    pub delivered_orders: usize,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub revenue: f64,
    pub orders: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAnalytics {
    pub overview: OrderOverview,
    pub recent_orders: Vec<Order>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignOverview {
    pub total_campaigns: usize,
    pub active_campaigns: usize,
    pub completed_campaigns: usize,
}

/// Summed stats over completed campaigns. Rates are percentages.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPerformance {
    pub total_sent: u64,
    pub total_delivered: u64,
    pub total_opened: u64,
    pub total_clicked: u64,
    pub total_failed: u64,
    pub delivery_rate: f64,
    pub open_rate: f64,
    pub click_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDigest {
    pub id: Uuid,
    pub name: String,
    pub status: CampaignStatus,
    pub stats: CampaignStats,
    pub created_at: DateTime<Utc>,
}

impl From<&Campaign> for CampaignDigest {
    fn from(c: &Campaign) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            status: c.status,
            stats: c.stats,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignAnalytics {
    pub overview: CampaignOverview,
    pub performance: CampaignPerformance,
    pub recent_campaigns: Vec<CampaignDigest>,
}

// ─── Auth ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
