//! In-memory CRM store backed by DashMap.
//!
//! Holds customers, orders, campaigns and the audit log. Each record is
//! guarded by its DashMap entry; no code path holds guards on two maps at
//! once.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Datelike, Months, Utc};
use crm_core::{Customer, CustomerStatus, CustomerSummary, CrmError, CrmResult};
use crm_segmentation::CustomerSource;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::*;

pub const RECENT_ORDERS_PER_CUSTOMER: usize = 10;
pub const ANALYTICS_LIST_SIZE: usize = 5;

/// Thread-safe in-memory store for customers, orders, campaigns and audit log.
pub struct CrmStore {
    customers: DashMap<Uuid, Customer>,
    /// Lowercased email -> customer id. Enforces email uniqueness.
    customer_emails: DashMap<String, Uuid>,
    orders: DashMap<Uuid, Order>,
    campaigns: DashMap<Uuid, Campaign>,
    audit_log: DashMap<Uuid, AuditLogEntry>,
    order_seq: AtomicU64,
}

impl CrmStore {
    pub fn new() -> Self {
        info!("CRM store initialized (in-memory)");
        Self {
            customers: DashMap::new(),
            customer_emails: DashMap::new(),
            orders: DashMap::new(),
            campaigns: DashMap::new(),
            audit_log: DashMap::new(),
            order_seq: AtomicU64::new(0),
        }
    }

    // ─── Customers ─────────────────────────────────────────────────────────

    /// Newest first, filtered by status and a case-insensitive search over
    /// name, email and phone.
    pub fn list_customers(&self, query: &CustomerQuery) -> CrmResult<Page<Customer>> {
        let page = PageRequest::new(query.page, query.limit)?;
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut customers: Vec<Customer> = self
            .customers
            .iter()
            .filter(|r| query.status.map_or(true, |s| r.value().status == s))
            .filter(|r| needle.as_deref().map_or(true, |n| matches_search(r.value(), n)))
            .map(|r| r.value().clone())
            .collect();
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page.paginate(customers))
    }

    pub fn get_customer(&self, id: Uuid) -> Option<Customer> {
        self.customers.get(&id).map(|r| r.value().clone())
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    /// A customer with their most recent orders.
    pub fn customer_detail(&self, id: Uuid) -> CrmResult<CustomerDetail> {
        let customer = self.get_customer(id).ok_or(CrmError::NotFound("Customer"))?;
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|r| r.value().customer_id == id)
            .map(|r| r.value().clone())
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        orders.truncate(RECENT_ORDERS_PER_CUSTOMER);
        Ok(CustomerDetail {
            customer,
            recent_orders: orders,
        })
    }

    pub fn create_customer(&self, req: CreateCustomerRequest) -> CrmResult<Customer> {
        req.validate()?;
        let email = normalize_email(&req.email);
        let id = Uuid::new_v4();
        self.reserve_email(&email, id)?;

        let now = Utc::now();
        let customer = Customer {
            id,
            name: req.name.trim().to_string(),
            email,
            phone: req.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            total_spending: req.total_spending,
            visits: req.visits,
            last_purchase_date: req.last_purchase_date,
            registration_date: req.registration_date.unwrap_or(now),
            status: req.status,
            tags: req.tags,
            address: req.address,
            preferences: req.preferences,
            created_at: now,
            updated_at: now,
        };
        self.customers.insert(id, customer.clone());
        metrics::counter!("crm.customers.created").increment(1);
        debug!(customer_id = %id, "Customer created");
        Ok(customer)
    }

    pub fn update_customer(&self, id: Uuid, req: UpdateCustomerRequest) -> CrmResult<Customer> {
        req.validate()?;
        let current = self.get_customer(id).ok_or(CrmError::NotFound("Customer"))?;

        let new_email = req
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| *e != current.email);
        if let Some(email) = &new_email {
            self.reserve_email(email, id)?;
        }

        let updated = self.customers.get_mut(&id).map(|mut entry| {
            let c = entry.value_mut();
            if let Some(name) = req.name { c.name = name.trim().to_string(); }
            if let Some(email) = new_email.clone() { c.email = email; }
            if let Some(phone) = req.phone { c.phone = Some(phone.trim().to_string()).filter(|p| !p.is_empty()); }
            if let Some(spending) = req.total_spending { c.total_spending = spending; }
            if let Some(visits) = req.visits { c.visits = visits; }
            if let Some(date) = req.last_purchase_date { c.last_purchase_date = Some(date); }
            if let Some(status) = req.status { c.status = status; }
            if let Some(tags) = req.tags { c.tags = tags; }
            if let Some(address) = req.address { c.address = address; }
            if let Some(preferences) = req.preferences { c.preferences = preferences; }
            c.updated_at = Utc::now();
            c.clone()
        });

        match (updated, new_email) {
            (Some(customer), Some(_)) => {
                self.customer_emails.remove_if(&current.email, |_, owner| *owner == id);
                Ok(customer)
            }
            (Some(customer), None) => Ok(customer),
            (None, Some(email)) => {
                // Deleted concurrently; give the reserved address back.
                self.customer_emails.remove_if(&email, |_, owner| *owner == id);
                Err(CrmError::NotFound("Customer"))
            }
            (None, None) => Err(CrmError::NotFound("Customer")),
        }
    }

    /// Orders of a deleted customer are kept.
    pub fn delete_customer(&self, id: Uuid) -> CrmResult<()> {
        let (_, customer) = self.customers.remove(&id).ok_or(CrmError::NotFound("Customer"))?;
        self.customer_emails.remove_if(&customer.email, |_, owner| *owner == id);
        Ok(())
    }

    pub fn customer_analytics(&self) -> CustomerAnalytics {
        let customers: Vec<Customer> = self.customers.iter().map(|r| r.value().clone()).collect();
        let count = |status: CustomerStatus| customers.iter().filter(|c| c.status == status).count();

        let mut top: Vec<&Customer> = customers.iter().collect();
        top.sort_by(|a, b| b.total_spending.total_cmp(&a.total_spending));
        let mut recent: Vec<&Customer> = customers.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        CustomerAnalytics {
            overview: CustomerOverview {
                total_customers: customers.len(),
                active_customers: count(CustomerStatus::Active),
                inactive_customers: count(CustomerStatus::Inactive),
            },
            top_spenders: top.into_iter().take(ANALYTICS_LIST_SIZE).map(CustomerSummary::from).collect(),
            recent_customers: recent.into_iter().take(ANALYTICS_LIST_SIZE).map(CustomerSummary::from).collect(),
        }
    }

    fn reserve_email(&self, email: &str, id: Uuid) -> CrmResult<()> {
        match self.customer_emails.entry(email.to_string()) {
            Entry::Occupied(_) => Err(CrmError::Conflict(
                "Customer with this email already exists".to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }

    // ─── Orders ────────────────────────────────────────────────────────────

    pub fn list_orders(&self, query: &OrderQuery) -> CrmResult<Page<Order>> {
        let page = PageRequest::new(query.page, query.limit)?;
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|r| query.status.map_or(true, |s| r.value().status == s))
            .filter(|r| query.customer_id.map_or(true, |id| r.value().customer_id == id))
            .map(|r| r.value().clone())
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        Ok(page.paginate(orders))
    }

    pub fn get_order(&self, id: Uuid) -> Option<Order> {
        self.orders.get(&id).map(|r| r.value().clone())
    }

    /// Record an order and fold it into the customer's spending, visits and
    /// last purchase date.
    pub fn create_order(&self, req: CreateOrderRequest) -> CrmResult<Order> {
        let items = req.priced_items()?;
        if !self.customers.contains_key(&req.customer_id) {
            return Err(CrmError::NotFound("Customer"));
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            customer_id: req.customer_id,
            order_number: self.next_order_number(),
            items,
            total_amount: req.total_amount,
            status: req.status,
            payment_status: req.payment_status,
            payment_method: req.payment_method,
            shipping_address: req.shipping_address,
            order_date: req.order_date.unwrap_or(now),
            delivery_date: None,
            created_at: now,
            updated_at: now,
        };

        let mut customer = self
            .customers
            .get_mut(&req.customer_id)
            .ok_or(CrmError::NotFound("Customer"))?;
        customer.total_spending += order.total_amount;
        customer.visits += 1;
        customer.last_purchase_date = Some(now);
        customer.updated_at = now;
        drop(customer);

        self.orders.insert(order.id, order.clone());
        metrics::counter!("crm.orders.created").increment(1);
        debug!(order_id = %order.id, order_number = %order.order_number, "Order created");
        Ok(order)
    }

    pub fn update_order_status(&self, id: Uuid, status: OrderStatus) -> CrmResult<Order> {
        let mut entry = self.orders.get_mut(&id).ok_or(CrmError::NotFound("Order"))?;
        let now = Utc::now();
        entry.status = status;
        if status == OrderStatus::Delivered {
            entry.delivery_date = Some(now);
        }
        entry.updated_at = now;
        Ok(entry.clone())
    }

    /// Remove an order and take it back out of the customer's totals,
    /// floored at zero.
    pub fn delete_order(&self, id: Uuid) -> CrmResult<()> {
        let (_, order) = self.orders.remove(&id).ok_or(CrmError::NotFound("Order"))?;
        if let Some(mut customer) = self.customers.get_mut(&order.customer_id) {
            customer.total_spending = (customer.total_spending - order.total_amount).max(0.0);
            customer.visits = customer.visits.saturating_sub(1);
            customer.updated_at = Utc::now();
        }
        Ok(())
    }

    pub fn order_analytics(&self) -> OrderAnalytics {
        let orders: Vec<Order> = self.orders.iter().map(|r| r.value().clone()).collect();
        let now = Utc::now();
        let since = now.checked_sub_months(Months::new(6)).unwrap_or(now);

        let mut monthly: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
        for order in orders.iter().filter(|o| o.status.is_fulfilled() && o.order_date >= since) {
            let bucket = monthly
                .entry((order.order_date.year(), order.order_date.month()))
                .or_insert((0.0, 0));
            bucket.0 += order.total_amount;
            bucket.1 += 1;
        }

        let mut recent = orders.clone();
        recent.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        recent.truncate(ANALYTICS_LIST_SIZE);

        OrderAnalytics {
            overview: OrderOverview {
                total_orders: orders.len(),
                pending_orders: orders.iter().filter(|o| o.status == OrderStatus::Pending).count(),
                delivered_orders: orders.iter().filter(|o| o.status == OrderStatus::Delivered).count(),
                total_revenue: orders
                    .iter()
                    .filter(|o| o.status.is_fulfilled())
                    .map(|o| o.total_amount)
                    .sum(),
            },
            recent_orders: recent,
            monthly_revenue: monthly
                .into_iter()
                .map(|((year, month), (revenue, orders))| MonthlyRevenue { year, month, revenue, orders })
                .collect(),
        }
    }

    /// `ORD-<epoch millis>-<sequence, 4 digits>`
    fn next_order_number(&self) -> String {
        let seq = self.order_seq.fetch_add(1, Ordering::Relaxed) + 1;
        format!("ORD-{}-{:04}", Utc::now().timestamp_millis(), seq)
    }

    /// Insert an order as-is, without touching customer totals.
    pub(crate) fn insert_order(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub(crate) fn allocate_order_number(&self) -> String {
        self.next_order_number()
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    pub fn insert_campaign(&self, campaign: Campaign) {
        self.campaigns.insert(campaign.id, campaign);
    }

    pub fn get_campaign(&self, id: Uuid) -> Option<Campaign> {
        self.campaigns.get(&id).map(|r| r.value().clone())
    }

    /// Newest first.
    pub fn list_campaigns(&self, query: &CampaignQuery) -> CrmResult<Page<Campaign>> {
        let page = PageRequest::new(query.page, query.limit)?;
        let mut campaigns = self.campaigns_where(|c| query.status.map_or(true, |s| c.status == s));
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page.paginate(campaigns))
    }

    pub fn campaigns_where(&self, predicate: impl Fn(&Campaign) -> bool) -> Vec<Campaign> {
        self.campaigns
            .iter()
            .filter(|r| predicate(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }

    /// Run `f` against the campaign while holding its entry lock, so checks
    /// and writes inside `f` are atomic with respect to other callers.
    pub fn modify_campaign<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Campaign) -> CrmResult<R>,
    ) -> CrmResult<R> {
        let mut entry = self.campaigns.get_mut(&id).ok_or(CrmError::NotFound("Campaign"))?;
        f(entry.value_mut())
    }

    /// Remove the campaign if `allowed` accepts it under the entry lock.
    pub fn remove_campaign_if(
        &self,
        id: Uuid,
        allowed: impl Fn(&Campaign) -> CrmResult<()>,
    ) -> CrmResult<Campaign> {
        let mut rejection = None;
        let removed = self.campaigns.remove_if(&id, |_, campaign| match allowed(campaign) {
            Ok(()) => true,
            Err(e) => {
                rejection = Some(e);
                false
            }
        });
        match (removed, rejection) {
            (Some((_, campaign)), _) => Ok(campaign),
            (None, Some(e)) => Err(e),
            (None, None) => Err(CrmError::NotFound("Campaign")),
        }
    }

    // ─── Audit Log ─────────────────────────────────────────────────────────

    pub fn get_audit_log(&self) -> Vec<AuditLogEntry> {
        let mut entries: Vec<AuditLogEntry> = self.audit_log.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    pub fn log_audit(
        &self,
        user: &str,
        action: AuditAction,
        resource_type: &str,
        resource_id: &str,
        details: serde_json::Value,
    ) {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            user: user.to_string(),
            action,
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            details,
            timestamp: Utc::now(),
        };
        self.audit_log.insert(entry.id, entry);
    }

    /// Insert a customer record without validation. Used for seed data.
    pub(crate) fn insert_customer(&self, customer: Customer) -> bool {
        if self.reserve_email(&customer.email, customer.id).is_err() {
            return false;
        }
        self.customers.insert(customer.id, customer);
        true
    }
}

impl Default for CrmStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerSource for CrmStore {
    fn find_customers(&self, predicate: &dyn Fn(&Customer) -> bool) -> Vec<Customer> {
        self.customers
            .iter()
            .filter(|r| predicate(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }

    fn count_customers(&self, predicate: &dyn Fn(&Customer) -> bool) -> usize {
        self.customers.iter().filter(|r| predicate(r.value())).count()
    }
}

fn matches_search(customer: &Customer, needle_lower: &str) -> bool {
    customer.name.to_lowercase().contains(needle_lower)
        || customer.email.contains(needle_lower)
        || customer
            .phone
            .as_deref()
            .is_some_and(|p| p.to_lowercase().contains(needle_lower))
}
