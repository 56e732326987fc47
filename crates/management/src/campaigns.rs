//! Campaign service: audience sizing, lifecycle transitions and the deferred
//! completion of running campaigns.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use crm_core::{CampaignConfig, CrmError, CrmResult};
use crm_segmentation::{AudienceEvaluator, AudiencePreview, Rule, SegmentInsights};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dispatcher::{CampaignDispatcher, SimulatedDispatcher};
use crate::lifecycle::{self, CampaignAction};
use crate::models::*;
use crate::store::CrmStore;

pub struct CampaignService {
    store: Arc<CrmStore>,
    evaluator: AudienceEvaluator,
    dispatcher: Arc<dyn CampaignDispatcher>,
}

impl CampaignService {
    pub fn new(
        store: Arc<CrmStore>,
        evaluator: AudienceEvaluator,
        dispatcher: Arc<dyn CampaignDispatcher>,
    ) -> Self {
        Self {
            store,
            evaluator,
            dispatcher,
        }
    }

    pub fn from_config(store: Arc<CrmStore>, config: &CampaignConfig) -> Self {
        Self::new(
            store,
            AudienceEvaluator::new(config.preview_sample_size, config.insights_sample_size),
            Arc::new(SimulatedDispatcher::from_config(config)),
        )
    }

    pub fn store(&self) -> &Arc<CrmStore> {
        &self.store
    }

    // ─── Audience ──────────────────────────────────────────────────────────

    pub fn audience_size(&self, rules: &[Rule]) -> u64 {
        self.evaluator.audience_size(self.store.as_ref(), rules) as u64
    }

    pub fn preview_audience(&self, rules: &[Rule]) -> AudiencePreview {
        self.evaluator.preview(self.store.as_ref(), rules)
    }

    pub fn segment_insights(&self, rules: &[Rule]) -> SegmentInsights {
        self.evaluator.insights(self.store.as_ref(), rules)
    }

    // ─── CRUD ──────────────────────────────────────────────────────────────

    pub fn get(&self, id: Uuid) -> CrmResult<Campaign> {
        self.store.get_campaign(id).ok_or(CrmError::NotFound("Campaign"))
    }

    pub fn list(&self, query: &CampaignQuery) -> CrmResult<Page<Campaign>> {
        self.store.list_campaigns(query)
    }

    /// New campaigns start as drafts with a freshly computed audience size.
    pub fn create(&self, req: CreateCampaignRequest, user: &User) -> CrmResult<Campaign> {
        req.validate()?;
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            description: req.description,
            campaign_type: req.campaign_type,
            audience_size: self.audience_size(&req.audience_rules),
            audience_rules: req.audience_rules,
            message: req.message,
            status: CampaignStatus::Draft,
            scheduled_at: req.scheduled_at,
            sent_at: None,
            completed_at: None,
            stats: CampaignStats::default(),
            created_by: user.id,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_campaign(campaign.clone());
        self.store.log_audit(
            &user.email,
            AuditAction::Create,
            "campaign",
            &campaign.id.to_string(),
            serde_json::json!({"name": &campaign.name, "audienceSize": campaign.audience_size}),
        );
        metrics::counter!("crm.campaigns.created").increment(1);
        info!(campaign_id = %campaign.id, audience_size = campaign.audience_size, "Campaign created");
        Ok(campaign)
    }

    /// Edit a draft, scheduled, paused or cancelled campaign. A new rule list
    /// resizes the audience.
    pub fn update(&self, id: Uuid, req: UpdateCampaignRequest, user: &User) -> CrmResult<Campaign> {
        req.validate()?;
        if let Some(status) = req.status {
            lifecycle::ensure_assignable(status)?;
        }

        let updated = self.store.modify_campaign(id, |c| {
            if let Err(e) = lifecycle::ensure_editable(c.status) {
                warn!(campaign_id = %id, status = c.status.as_str(), "Rejected campaign edit");
                return Err(e);
            }
            if let Some(name) = req.name { c.name = name.trim().to_string(); }
            if let Some(description) = req.description { c.description = Some(description); }
            if let Some(kind) = req.campaign_type { c.campaign_type = kind; }
            if let Some(message) = req.message { c.message = message; }
            if let Some(rules) = req.audience_rules {
                c.audience_size = self.audience_size(&rules);
                c.audience_rules = rules;
            }
            if let Some(at) = req.scheduled_at { c.scheduled_at = Some(at); }
            if let Some(status) = req.status { c.status = status; }
            c.updated_at = Utc::now();
            Ok(c.clone())
        })?;

        self.store.log_audit(
            &user.email,
            AuditAction::Update,
            "campaign",
            &id.to_string(),
            serde_json::json!({"status": updated.status, "audienceSize": updated.audience_size}),
        );
        Ok(updated)
    }

    pub fn delete(&self, id: Uuid, user: &User) -> CrmResult<()> {
        let removed = self
            .store
            .remove_campaign_if(id, |c| lifecycle::ensure_deletable(c.status))
            .map_err(|e| {
                if matches!(e, CrmError::InvalidState(_)) {
                    warn!(campaign_id = %id, "Rejected delete of running campaign");
                }
                e
            })?;
        self.store.log_audit(
            &user.email,
            AuditAction::Delete,
            "campaign",
            &id.to_string(),
            serde_json::json!({"name": removed.name}),
        );
        metrics::counter!("crm.campaigns.deleted").increment(1);
        Ok(())
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────

    /// Move a draft or scheduled campaign to running: re-evaluate the
    /// audience, stamp the dispatch stats and arm the completion timer.
    pub fn start(&self, id: Uuid, user: &User) -> CrmResult<Campaign> {
        let (campaign, completes_after) = self.store.modify_campaign(id, |c| {
            let current = c.status;
            let next = lifecycle::transition(current, CampaignAction::Start).map_err(|e| {
                warn!(campaign_id = %id, status = current.as_str(), "Rejected campaign start");
                e
            })?;
            let audience_size = self.audience_size(&c.audience_rules);
            let dispatch = self.dispatcher.dispatch(audience_size);
            let now = Utc::now();

            c.status = next;
            c.audience_size = audience_size;
            c.stats = dispatch.stats;
            c.sent_at = Some(next_run_token(c.sent_at, now));
            c.completed_at = None;
            c.updated_at = now;
            Ok((c.clone(), dispatch.completes_after))
        })?;

        if let Some(run_token) = campaign.sent_at {
            self.schedule_completion(id, run_token, completes_after);
        }
        self.store.log_audit(
            &user.email,
            AuditAction::Start,
            "campaign",
            &id.to_string(),
            serde_json::json!({"sent": campaign.stats.sent}),
        );
        metrics::counter!("crm.campaigns.started").increment(1);
        info!(
            campaign_id = %id,
            sent = campaign.stats.sent,
            delivered = campaign.stats.delivered,
            "Campaign started"
        );
        Ok(campaign)
    }

    pub fn pause(&self, id: Uuid, user: &User) -> CrmResult<Campaign> {
        let campaign = self.store.modify_campaign(id, |c| {
            let current = c.status;
            c.status = lifecycle::transition(current, CampaignAction::Pause).map_err(|e| {
                warn!(campaign_id = %id, status = current.as_str(), "Rejected campaign pause");
                e
            })?;
            c.updated_at = Utc::now();
            Ok(c.clone())
        })?;
        self.store.log_audit(&user.email, AuditAction::Pause, "campaign", &id.to_string(), serde_json::json!({}));
        metrics::counter!("crm.campaigns.paused").increment(1);
        info!(campaign_id = %id, "Campaign paused");
        Ok(campaign)
    }

    fn schedule_completion(&self, id: Uuid, run_token: DateTime<Utc>, delay: std::time::Duration) {
        let store = Arc::clone(&self.store);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    complete_run(&store, id, run_token);
                });
            }
            Err(_) => warn!(campaign_id = %id, "No async runtime; campaign will not auto-complete"),
        }
    }

    // ─── Analytics ─────────────────────────────────────────────────────────

    pub fn analytics(&self) -> CampaignAnalytics {
        let campaigns = self.store.campaigns_where(|_| true);
        let count = |status: CampaignStatus| campaigns.iter().filter(|c| c.status == status).count();

        let mut perf = CampaignPerformance::default();
        for c in campaigns.iter().filter(|c| c.status == CampaignStatus::Completed) {
            perf.total_sent += c.stats.sent;
            perf.total_delivered += c.stats.delivered;
            perf.total_opened += c.stats.opened;
            perf.total_clicked += c.stats.clicked;
            perf.total_failed += c.stats.failed;
        }
        perf.delivery_rate = percent(perf.total_delivered, perf.total_sent);
        perf.open_rate = percent(perf.total_opened, perf.total_delivered);
        perf.click_rate = percent(perf.total_clicked, perf.total_opened);

        let mut recent: Vec<&Campaign> = campaigns.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        CampaignAnalytics {
            overview: CampaignOverview {
                total_campaigns: campaigns.len(),
                active_campaigns: count(CampaignStatus::Running),
                completed_campaigns: count(CampaignStatus::Completed),
            },
            performance: perf,
            recent_campaigns: recent
                .into_iter()
                .take(crate::store::ANALYTICS_LIST_SIZE)
                .map(CampaignDigest::from)
                .collect(),
        }
    }
}

/// Deferred `running -> completed` transition. Applies only if the campaign
/// still exists, is running, and is on the same run that armed the timer.
pub fn complete_run(store: &CrmStore, id: Uuid, run_token: DateTime<Utc>) -> bool {
    let outcome = store.modify_campaign(id, |c| {
        if c.sent_at != Some(run_token) {
            return Ok(false);
        }
        match lifecycle::transition(c.status, CampaignAction::Complete) {
            Ok(next) => {
                let now = Utc::now();
                c.status = next;
                c.completed_at = Some(now);
                c.updated_at = now;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    });

    match outcome {
        Ok(true) => {
            store.log_audit("system", AuditAction::Complete, "campaign", &id.to_string(), serde_json::json!({}));
            metrics::counter!("crm.campaigns.completed").increment(1);
            info!(campaign_id = %id, "Campaign completed");
            true
        }
        Ok(false) | Err(_) => false,
    }
}

/// Run tokens must differ between runs even if the clock has not moved.
fn next_run_token(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if prev >= now => prev + chrono::Duration::nanoseconds(1),
        _ => now,
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    crm_segmentation::insights::round2(part as f64 / whole as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn admin() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Admin User".into(),
            email: "admin@xeno-crm.com".into(),
            role: "admin".into(),
        }
    }

    fn service_with_customers(n: usize) -> CampaignService {
        let store = Arc::new(CrmStore::new());
        for i in 0..n {
            let req: CreateCustomerRequest = serde_json::from_value(serde_json::json!({
                "name": format!("Customer {i}"),
                "email": format!("customer{i}@example.com"),
                "totalSpending": (i * 100) as f64,
            }))
            .unwrap();
            store.create_customer(req).unwrap();
        }
        CampaignService::from_config(store, &CampaignConfig::default())
    }

    fn draft(service: &CampaignService, rules: serde_json::Value) -> Campaign {
        let req: CreateCampaignRequest = serde_json::from_value(serde_json::json!({
            "name": "Festive Offers",
            "type": "email",
            "message": {"subject": "Hi", "content": "20% off this week"},
            "audienceRules": rules,
        }))
        .unwrap();
        service.create(req, &admin()).unwrap()
    }

    #[test]
    fn test_create_computes_audience_size() {
        let service = service_with_customers(20);
        let all = draft(&service, serde_json::json!([]));
        assert_eq!(all.status, CampaignStatus::Draft);
        assert_eq!(all.audience_size, 20);

        let big = draft(
            &service,
            serde_json::json!([{"field": "totalSpending", "operator": ">=", "value": 1500}]),
        );
        assert_eq!(big.audience_size, 5);
    }

    #[test]
    fn test_update_resizes_only_when_rules_change() {
        let service = service_with_customers(10);
        let campaign = draft(&service, serde_json::json!([]));

        let renamed = service
            .update(campaign.id, UpdateCampaignRequest { name: Some("Renamed".into()), ..Default::default() }, &admin())
            .unwrap();
        assert_eq!(renamed.audience_size, 10);

        let rules: Vec<Rule> =
            serde_json::from_value(serde_json::json!([{"field": "totalSpending", "operator": "<", "value": 300}]))
                .unwrap();
        let narrowed = service
            .update(campaign.id, UpdateCampaignRequest { audience_rules: Some(rules), ..Default::default() }, &admin())
            .unwrap();
        assert_eq!(narrowed.audience_size, 3);
    }

    #[test]
    fn test_update_cannot_assign_running() {
        let service = service_with_customers(1);
        let campaign = draft(&service, serde_json::json!([]));
        let err = service
            .update(
                campaign.id,
                UpdateCampaignRequest { status: Some(CampaignStatus::Running), ..Default::default() },
                &admin(),
            )
            .unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_stamps_stats_and_auto_completes() {
        let service = service_with_customers(100);
        let campaign = draft(&service, serde_json::json!([]));

        let running = service.start(campaign.id, &admin()).unwrap();
        assert_eq!(running.status, CampaignStatus::Running);
        assert!(running.sent_at.is_some());
        let s = running.stats;
        assert_eq!((s.sent, s.delivered, s.failed, s.opened, s.clicked), (100, 95, 5, 23, 1));

        let edit = service.update(campaign.id, UpdateCampaignRequest::default(), &admin());
        assert_eq!(edit.unwrap_err().to_string(), lifecycle::CANNOT_EDIT);
        assert_eq!(service.delete(campaign.id, &admin()).unwrap_err().to_string(), lifecycle::CANNOT_DELETE);

        tokio::time::sleep(Duration::from_millis(5100)).await;
        let done = service.get(campaign.id).unwrap();
        assert_eq!(done.status, CampaignStatus::Completed);
        assert!(done.completed_at.is_some());

        assert_eq!(service.start(campaign.id, &admin()).unwrap_err().to_string(), lifecycle::CANNOT_START);
        let analytics = service.analytics();
        assert_eq!(analytics.overview.completed_campaigns, 1);
        assert_eq!(analytics.performance.delivery_rate, 95.0);
        assert_eq!(analytics.performance.open_rate, 24.21);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_before_completion_sticks() {
        let service = service_with_customers(5);
        let campaign = draft(&service, serde_json::json!([]));
        service.start(campaign.id, &admin()).unwrap();
        let paused = service.pause(campaign.id, &admin()).unwrap();
        assert_eq!(paused.status, CampaignStatus::Paused);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(service.get(campaign.id).unwrap().status, CampaignStatus::Paused);
        assert_eq!(service.pause(campaign.id, &admin()).unwrap_err().to_string(), lifecycle::CANNOT_PAUSE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_does_not_complete_a_new_run() {
        let service = service_with_customers(5);
        let campaign = draft(&service, serde_json::json!([]));
        service.start(campaign.id, &admin()).unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        service.pause(campaign.id, &admin()).unwrap();
        service
            .update(
                campaign.id,
                UpdateCampaignRequest { status: Some(CampaignStatus::Scheduled), ..Default::default() },
                &admin(),
            )
            .unwrap();
        service.start(campaign.id, &admin()).unwrap();

        // First timer fires at 5s and must leave the second run alone.
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(service.get(campaign.id).unwrap().status, CampaignStatus::Running);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(service.get(campaign.id).unwrap().status, CampaignStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_after_delete_is_noop() {
        let service = service_with_customers(2);
        let campaign = draft(&service, serde_json::json!([]));
        let running = service.start(campaign.id, &admin()).unwrap();
        service.pause(campaign.id, &admin()).unwrap();
        service.delete(campaign.id, &admin()).unwrap();

        assert!(!complete_run(service.store(), campaign.id, running.sent_at.unwrap()));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(service.get(campaign.id).is_err());
    }

    #[test]
    fn test_missing_campaign_is_not_found() {
        let service = service_with_customers(0);
        let id = Uuid::new_v4();
        assert!(matches!(service.start(id, &admin()), Err(CrmError::NotFound("Campaign"))));
        assert!(matches!(service.pause(id, &admin()), Err(CrmError::NotFound("Campaign"))));
        assert!(matches!(service.delete(id, &admin()), Err(CrmError::NotFound("Campaign"))));
    }

    #[test]
    fn test_start_outside_runtime_still_transitions() {
        let service = service_with_customers(3);
        let campaign = draft(&service, serde_json::json!([]));
        let running = service.start(campaign.id, &admin()).unwrap();
        assert_eq!(running.status, CampaignStatus::Running);
        assert_eq!(running.stats.sent, 3);
    }
}
