//! Axum REST handlers for the CRM API.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use crm_core::{AppConfig, Customer, CrmError};
use crm_segmentation::{AudiencePreview, SegmentInsights};
use tracing::error;
use uuid::Uuid;

use crate::auth::AuthService;
use crate::campaigns::CampaignService;
use crate::models::*;
use crate::store::CrmStore;

/// Shared handler state.
#[derive(Clone)]
pub struct ManagementState {
    pub store: Arc<CrmStore>,
    pub campaigns: Arc<CampaignService>,
    pub auth: Arc<AuthService>,
}

impl ManagementState {
    pub fn from_config(config: &AppConfig) -> Self {
        let store = Arc::new(CrmStore::new());
        let campaigns = Arc::new(CampaignService::from_config(Arc::clone(&store), &config.campaigns));
        Self {
            store,
            campaigns,
            auth: Arc::new(AuthService::new(&config.auth)),
        }
    }
}

/// A [`CrmError`] rendered as `{ error, message }` with the matching status.
#[derive(Debug)]
pub struct ApiError(pub CrmError);

impl From<CrmError> for ApiError {
    fn from(err: CrmError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self.0 {
            CrmError::NotFound(what) => (StatusCode::NOT_FOUND, "not_found", format!("{} not found", what)),
            CrmError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_failed", msg),
            CrmError::InvalidState(msg) => (StatusCode::BAD_REQUEST, "invalid_state", msg),
            CrmError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            CrmError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            other => {
                error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Something went wrong".to_string(),
                )
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(CrmError::validation(rejection.body_text()))
    }
}

/// JSON body extractor whose rejections use the `{ error, message }` shape.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

type ApiResult<T> = Result<Json<T>, ApiError>;

// ─── Auth ──────────────────────────────────────────────────────────────────

pub async fn handle_login(
    State(state): State<ManagementState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let resp = state.auth.login(&req)?;
    state.store.log_audit(
        &resp.user.email,
        AuditAction::Login,
        "user",
        &resp.user.id.to_string(),
        serde_json::json!({}),
    );
    Ok(Json(resp))
}

pub async fn current_user(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

pub async fn handle_logout(State(state): State<ManagementState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        state.auth.logout(token.trim());
    }
    StatusCode::NO_CONTENT
}

// ─── Customers ─────────────────────────────────────────────────────────────

pub async fn list_customers(
    State(state): State<ManagementState>,
    Query(query): Query<CustomerQuery>,
) -> ApiResult<Page<Customer>> {
    Ok(Json(state.store.list_customers(&query)?))
}

pub async fn get_customer(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CustomerDetail> {
    Ok(Json(state.store.customer_detail(id)?))
}

pub async fn create_customer(
    State(state): State<ManagementState>,
    ApiJson(req): ApiJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = state.store.create_customer(req)?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateCustomerRequest>,
) -> ApiResult<Customer> {
    Ok(Json(state.store.update_customer(id, req)?))
}

pub async fn delete_customer(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_customer(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn customer_analytics(State(state): State<ManagementState>) -> Json<CustomerAnalytics> {
    Json(state.store.customer_analytics())
}

// ─── Orders ────────────────────────────────────────────────────────────────

pub async fn list_orders(
    State(state): State<ManagementState>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Page<Order>> {
    Ok(Json(state.store.list_orders(&query)?))
}

pub async fn get_order(State(state): State<ManagementState>, Path(id): Path<Uuid>) -> ApiResult<Order> {
    state
        .store
        .get_order(id)
        .map(Json)
        .ok_or(ApiError(CrmError::NotFound("Order")))
}

pub async fn create_order(
    State(state): State<ManagementState>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.store.create_order(req)?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update_order_status(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateOrderStatusRequest>,
) -> ApiResult<Order> {
    Ok(Json(state.store.update_order_status(id, req.status)?))
}

pub async fn delete_order(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_order(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn order_analytics(State(state): State<ManagementState>) -> Json<OrderAnalytics> {
    Json(state.store.order_analytics())
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(
    State(state): State<ManagementState>,
    Query(query): Query<CampaignQuery>,
) -> ApiResult<Page<Campaign>> {
    Ok(Json(state.campaigns.list(&query)?))
}

pub async fn get_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Campaign> {
    Ok(Json(state.campaigns.get(id)?))
}

pub async fn create_campaign(
    State(state): State<ManagementState>,
    Extension(user): Extension<User>,
    ApiJson(req): ApiJson<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let campaign = state.campaigns.create(req, &user)?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn update_campaign(
    State(state): State<ManagementState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateCampaignRequest>,
) -> ApiResult<Campaign> {
    Ok(Json(state.campaigns.update(id, req, &user)?))
}

pub async fn delete_campaign(
    State(state): State<ManagementState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.campaigns.delete(id, &user)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn start_campaign(
    State(state): State<ManagementState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Campaign> {
    Ok(Json(state.campaigns.start(id, &user)?))
}

pub async fn pause_campaign(
    State(state): State<ManagementState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Campaign> {
    Ok(Json(state.campaigns.pause(id, &user)?))
}

pub async fn preview_audience(
    State(state): State<ManagementState>,
    ApiJson(req): ApiJson<PreviewAudienceRequest>,
) -> Json<AudiencePreview> {
    Json(state.campaigns.preview_audience(&req.audience_rules))
}

pub async fn campaign_analytics(State(state): State<ManagementState>) -> Json<CampaignAnalytics> {
    Json(state.campaigns.analytics())
}

// ─── Segments ──────────────────────────────────────────────────────────────

pub async fn segment_insights(
    State(state): State<ManagementState>,
    ApiJson(req): ApiJson<SegmentInsightsRequest>,
) -> Json<SegmentInsights> {
    Json(state.campaigns.segment_insights(&req.rules))
}

// ─── Audit Log ─────────────────────────────────────────────────────────────

pub async fn audit_log(State(state): State<ManagementState>) -> Json<Vec<AuditLogEntry>> {
    Json(state.store.get_audit_log())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: CrmError) -> (StatusCode, ErrorResponse) {
        let resp = ApiError(err).into_response();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let (status, body) = render(CrmError::NotFound("Campaign")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "Campaign not found");

        let (status, body) = render(CrmError::invalid_state("Campaign cannot be started")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "invalid_state");
        assert_eq!(body.message, "Campaign cannot be started");

        let (status, body) = render(CrmError::validation("Message content is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "validation_failed");

        let (status, _) = render(CrmError::Conflict("dup".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_shape() {
        let req = axum::http::Request::builder()
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from("{\"audienceRules\": 5}"))
            .unwrap();
        let err = match ApiJson::<PreviewAudienceRequest>::from_request(req, &()).await {
            Err(err) => err,
            Ok(_) => panic!("body should be rejected"),
        };
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error, "validation_failed");
    }

    #[tokio::test]
    async fn test_internal_errors_are_generic() {
        let (status, body) = render(CrmError::Internal(anyhow::anyhow!("disk on fire"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Something went wrong");
    }
}
