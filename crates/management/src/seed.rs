//! Demo data: customers, orders and a few campaigns to populate the dashboard.

use chrono::{Duration, Utc};
use crm_core::{Address, Customer, CustomerStatus, MarketingPreferences};
use crm_segmentation::RuleSetBuilder;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::campaigns::CampaignService;
use crate::models::*;

const CUSTOMER_NAMES: [&str; 20] = [
    "Rajesh Kumar",
    "Priya Sharma",
    "Amit Patel",
    "Sneha Gupta",
    "Vikram Singh",
    "Anita Verma",
    "Rohit Agarwal",
    "Kavya Reddy",
    "Suresh Nair",
    "Meera Joshi",
    "Arjun Mehta",
    "Divya Iyer",
    "Karan Malhotra",
    "Ritu Bansal",
    "Sanjay Rao",
    "Pooja Saxena",
    "Nikhil Jain",
    "Shreya Kapoor",
    "Manish Tiwari",
    "Nisha Agrawal",
];

const CITIES: [&str; 7] = ["Mumbai", "Delhi", "Bangalore", "Chennai", "Kolkata", "Pune", "Hyderabad"];

const PRODUCTS: [&str; 10] = [
    "Smartphone",
    "Laptop",
    "Headphones",
    "Watch",
    "Tablet",
    "Camera",
    "Speaker",
    "Keyboard",
    "Mouse",
    "Monitor",
];

const SEED_ORDERS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub customers: usize,
    pub orders: usize,
    pub campaigns: usize,
}

/// Populate an empty store. Seed orders are inserted as historical records
/// and do not adjust the customers' running totals.
pub fn seed_demo_data(service: &CampaignService, admin: &User) -> SeedSummary {
    let store = service.store();
    let mut rng = rand::thread_rng();
    let now = Utc::now();

    let mut customer_ids = Vec::with_capacity(CUSTOMER_NAMES.len());
    for name in CUSTOMER_NAMES {
        let registered = now - Duration::seconds(rng.gen_range(0..365 * 24 * 3600));
        let customer = Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replacen(' ', ".", 1)),
            phone: Some(format!("+91{}", rng.gen_range(1_000_000_000u64..10_000_000_000))),
            total_spending: rng.gen_range(0..100_000) as f64,
            visits: rng.gen_range(1..=50),
            last_purchase_date: Some(now - Duration::seconds(rng.gen_range(0..180 * 24 * 3600))),
            registration_date: registered,
            status: if rng.gen_bool(0.9) { CustomerStatus::Active } else { CustomerStatus::Inactive },
            tags: vec![
                "customer".to_string(),
                if rng.gen_bool(0.5) { "premium" } else { "regular" }.to_string(),
            ],
            address: Address {
                city: CITIES.choose(&mut rng).map(|c| c.to_string()),
                state: Some("India".to_string()),
                country: Some("India".to_string()),
                ..Address::default()
            },
            preferences: MarketingPreferences::default(),
            created_at: registered,
            updated_at: now,
        };
        let id = customer.id;
        if store.insert_customer(customer) {
            customer_ids.push(id);
        }
    }

    let statuses = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];
    let payments = [PaymentStatus::Pending, PaymentStatus::Paid, PaymentStatus::Failed];
    let methods = [
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Upi,
        PaymentMethod::NetBanking,
    ];

    let mut orders = 0;
    for _ in 0..SEED_ORDERS {
        let Some(customer_id) = customer_ids.choose(&mut rng).copied() else {
            break;
        };
        let items: Vec<OrderItem> = (0..rng.gen_range(1..=3))
            .map(|_| {
                let quantity = rng.gen_range(1..=3);
                let price = rng.gen_range(1_000..51_000) as f64;
                OrderItem {
                    product_name: PRODUCTS[rng.gen_range(0..PRODUCTS.len())].to_string(),
                    quantity,
                    price,
                    total: quantity as f64 * price,
                }
            })
            .collect();
        let order_date = now - Duration::seconds(rng.gen_range(0..90 * 24 * 3600));
        store.insert_order(Order {
            id: Uuid::new_v4(),
            customer_id,
            order_number: store.allocate_order_number(),
            total_amount: items.iter().map(|i| i.total).sum(),
            items,
            status: statuses[rng.gen_range(0..statuses.len())],
            payment_status: payments[rng.gen_range(0..payments.len())],
            payment_method: methods[rng.gen_range(0..methods.len())],
            shipping_address: None,
            order_date,
            delivery_date: None,
            created_at: order_date,
            updated_at: order_date,
        });
        orders += 1;
    }

    let month_ago = (now - Duration::days(30)).format("%Y-%m-%d").to_string();
    let quarter_ago = (now - Duration::days(90)).format("%Y-%m-%d").to_string();
    let campaigns = [
        (
            "Welcome New Customers",
            "Welcome campaign for new customers",
            CampaignStatus::Completed,
            "Welcome to our store!",
            "Thank you for joining us. Enjoy 10% off your first purchase!",
            RuleSetBuilder::new().rule("registrationDate", ">", month_ago).build(),
            CampaignStats { sent: 156, delivered: 148, opened: 89, clicked: 23, failed: 8, unsubscribed: 0 },
        ),
        (
            "High Spender Appreciation",
            "Thank high-value customers",
            CampaignStatus::Completed,
            "Thank you for being a valued customer",
            "We appreciate your loyalty. Here's a special 15% discount just for you!",
            RuleSetBuilder::new().spending_above(50_000.0).build(),
            CampaignStats { sent: 45, delivered: 44, opened: 32, clicked: 12, failed: 1, unsubscribed: 0 },
        ),
        (
            "Win Back Inactive Customers",
            "Re-engage customers who haven't purchased recently",
            CampaignStatus::Draft,
            "We miss you! Come back for exclusive offers",
            "It's been a while since your last purchase. Here's 20% off to welcome you back!",
            RuleSetBuilder::new().rule("lastPurchaseDate", "<", quarter_ago).build(),
            CampaignStats::default(),
        ),
    ];

    let campaign_count = campaigns.len();
    for (i, (name, description, status, subject, content, rules, stats)) in campaigns.into_iter().enumerate() {
        let created = now - Duration::days(20 - i as i64 * 5);
        let finished = status == CampaignStatus::Completed;
        store.insert_campaign(Campaign {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: Some(description.to_string()),
            campaign_type: CampaignType::Email,
            message: CampaignMessage {
                subject: Some(subject.to_string()),
                content: content.to_string(),
                template: None,
            },
            audience_size: service.audience_size(&rules),
            audience_rules: rules,
            status,
            scheduled_at: None,
            sent_at: finished.then(|| created + Duration::hours(1)),
            completed_at: finished.then(|| created + Duration::hours(2)),
            stats,
            created_by: admin.id,
            created_at: created,
            updated_at: created,
        });
    }

    let summary = SeedSummary {
        customers: customer_ids.len(),
        orders,
        campaigns: campaign_count,
    };
    info!(
        customers = summary.customers,
        orders = summary.orders,
        campaigns = summary.campaigns,
        "Seeded demo data"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CrmStore;
    use crm_core::CampaignConfig;
    use crm_segmentation::CustomerSource;
    use std::sync::Arc;

    #[test]
    fn test_seed_populates_store() {
        let store = Arc::new(CrmStore::new());
        let service = CampaignService::from_config(Arc::clone(&store), &CampaignConfig::default());
        let admin = User {
            id: Uuid::new_v4(),
            name: "Admin User".into(),
            email: "admin@xeno-crm.com".into(),
            role: "admin".into(),
        };

        let summary = seed_demo_data(&service, &admin);
        assert_eq!(summary, SeedSummary { customers: 20, orders: 50, campaigns: 3 });
        assert_eq!(store.customer_count(), 20);
        assert!(store.find_customers(&|c: &Customer| c.email.ends_with("@example.com")).len() == 20);

        let rajesh = store.find_customers(&|c: &Customer| c.name == "Rajesh Kumar");
        assert_eq!(rajesh[0].email, "rajesh.kumar@example.com");

        let campaigns = store.campaigns_where(|_| true);
        assert_eq!(campaigns.len(), 3);
        assert!(campaigns.iter().all(|c| c.created_by == admin.id));
        let analytics = service.analytics();
        assert_eq!(analytics.performance.total_sent, 201);
    }
}
