use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

use crate::db::entities::{service, vendor};
use crate::db::services::{self, DateRangeFilter};
use crate::reminders::selector::horizon_end;
use crate::reminders::Color;
use crate::web::models::{
    CountedServices, ReminderCheckRequest, ReminderCheckResponse, ServiceDatesRequest,
    ServiceRequest, ServiceResponse,
};
use crate::web::{AppError, AppState};

fn to_responses(
    app_state: &AppState,
    rows: Vec<(service::Model, Option<vendor::Model>)>,
) -> Vec<ServiceResponse> {
    let today = app_state.clock.today();
    let horizon = app_state.config.reminder_days;
    rows.into_iter()
        .map(|row| ServiceResponse::with_vendor(row, today, horizon))
        .collect()
}

async fn list_filtered(
    app_state: &AppState,
    filter: DateRangeFilter,
) -> Result<Vec<ServiceResponse>, AppError> {
    let rows = services::find_services_with_vendor(&app_state.db_pool, &filter).await?;
    Ok(to_responses(app_state, rows))
}

async fn load_response(app_state: &AppState, service_id: i32) -> Result<ServiceResponse, AppError> {
    let row = services::get_service_with_vendor(&app_state.db_pool, service_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Service {service_id} not found")))?;
    Ok(ServiceResponse::with_vendor(
        row,
        app_state.clock.today(),
        app_state.config.reminder_days,
    ))
}

// --- CRUD Handlers ---

async fn list_services_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    Ok(Json(list_filtered(&app_state, DateRangeFilter::All).await?))
}

async fn create_service_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ServiceRequest>,
) -> Result<(StatusCode, Json<ServiceResponse>), AppError> {
    let input = payload.into_input()?;
    if services::get_vendor_by_id(&app_state.db_pool, input.vendor_id).await?.is_none() {
        return Err(AppError::InvalidInput(format!(
            "Vendor {} does not exist",
            input.vendor_id
        )));
    }
    let created = services::create_service(&app_state.db_pool, &input).await?;
    info!(service_id = created.id, vendor_id = created.vendor_id, "Service created.");
    Ok((StatusCode::CREATED, Json(load_response(&app_state, created.id).await?)))
}

async fn get_service_handler(
    State(app_state): State<Arc<AppState>>,
    Path(service_id): Path<i32>,
) -> Result<Json<ServiceResponse>, AppError> {
    Ok(Json(load_response(&app_state, service_id).await?))
}

async fn update_service_handler(
    State(app_state): State<Arc<AppState>>,
    Path(service_id): Path<i32>,
    Json(payload): Json<ServiceRequest>,
) -> Result<Json<ServiceResponse>, AppError> {
    let input = payload.into_input()?;
    services::update_service(&app_state.db_pool, service_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Service {service_id} not found")))?;
    Ok(Json(load_response(&app_state, service_id).await?))
}

async fn update_service_dates_handler(
    State(app_state): State<Arc<AppState>>,
    Path(service_id): Path<i32>,
    Json(payload): Json<ServiceDatesRequest>,
) -> Result<Json<ServiceResponse>, AppError> {
    if payload.expiry_date.is_none() && payload.payment_due_date.is_none() {
        return Err(AppError::InvalidInput(
            "expiry_date or payment_due_date is required".to_string(),
        ));
    }
    services::update_service_dates(
        &app_state.db_pool,
        service_id,
        payload.expiry_date,
        payload.payment_due_date,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Service {service_id} not found")))?;
    info!(service_id, "Service dates updated.");
    Ok(Json(load_response(&app_state, service_id).await?))
}

async fn delete_service_handler(
    State(app_state): State<Arc<AppState>>,
    Path(service_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let rows_affected = services::delete_service(&app_state.db_pool, service_id).await?;
    if rows_affected == 0 {
        return Err(AppError::NotFound(format!("Service {service_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- Report Handlers ---

async fn expiring_soon_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<CountedServices>, AppError> {
    let today = app_state.clock.today();
    let end = horizon_end(today, app_state.config.reminder_days);
    let rows = services::find_services_expiring_between(&app_state.db_pool, today, end).await?;
    Ok(Json(to_responses(&app_state, rows).into()))
}

async fn payment_due_soon_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<CountedServices>, AppError> {
    let today = app_state.clock.today();
    let end = horizon_end(today, app_state.config.reminder_days);
    let rows = services::find_services_payment_due_between(&app_state.db_pool, today, end).await?;
    Ok(Json(to_responses(&app_state, rows).into()))
}

async fn active_services_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let today = app_state.clock.today();
    let active = list_filtered(&app_state, DateRangeFilter::ExpiryOnOrAfter(today)).await?;
    Ok(Json(serde_json::json!({
        "count": active.len(),
        "active_services": active,
    })))
}

async fn expired_services_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let today = app_state.clock.today();
    let expired = list_filtered(&app_state, DateRangeFilter::ExpiryBefore(today)).await?;
    Ok(Json(serde_json::json!({
        "count": expired.len(),
        "expired_services": expired,
    })))
}

async fn services_by_color_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<Color, CountedServices>>, AppError> {
    let today = app_state.clock.today();
    let horizon = app_state.config.reminder_days;
    let groups = app_state.reminder_service.get_services_with_color_codes(today).await?;
    let vendor_names: HashMap<i32, String> = services::get_all_vendors(&app_state.db_pool)
        .await?
        .into_iter()
        .map(|v| (v.id, v.name))
        .collect();

    let body = groups
        .into_iter()
        .map(|(color, members)| {
            let responses: Vec<ServiceResponse> = members
                .into_iter()
                .map(|s| {
                    let vendor_name = vendor_names.get(&s.vendor_id).cloned().unwrap_or_default();
                    ServiceResponse::new(s, vendor_name, today, horizon)
                })
                .collect();
            (color, CountedServices::from(responses))
        })
        .collect();
    Ok(Json(body))
}

async fn run_reminder_check(
    app_state: &AppState,
    days: Option<u32>,
) -> Result<Json<ReminderCheckResponse>, AppError> {
    let days = days.unwrap_or(app_state.config.reminder_days);
    let today = app_state.clock.today();
    info!(%today, days, "Manual reminder check requested.");
    let summary = app_state
        .reminder_service
        .check_and_send_reminders(today, days)
        .await?;
    Ok(Json(ReminderCheckResponse {
        message: "Reminder check completed".to_string(),
        summary,
    }))
}

async fn check_reminders_get_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ReminderCheckRequest>,
) -> Result<Json<ReminderCheckResponse>, AppError> {
    run_reminder_check(&app_state, query.days).await
}

async fn check_reminders_post_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ReminderCheckRequest>,
    body: Option<Json<ReminderCheckRequest>>,
) -> Result<Json<ReminderCheckResponse>, AppError> {
    let days = body.and_then(|Json(b)| b.days).or(query.days);
    run_reminder_check(&app_state, days).await
}

// --- Router ---

pub fn create_services_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_services_handler).post(create_service_handler))
        .route("/expiring_soon", get(expiring_soon_handler))
        .route("/payment_due_soon", get(payment_due_soon_handler))
        .route("/active_services", get(active_services_handler))
        .route("/expired_services", get(expired_services_handler))
        .route("/services_by_color", get(services_by_color_handler))
        .route(
            "/check_reminders",
            get(check_reminders_get_handler).post(check_reminders_post_handler),
        )
        .route(
            "/{service_id}",
            get(get_service_handler)
                .put(update_service_handler)
                .delete(delete_service_handler),
        )
        .route("/{service_id}/dates", patch(update_service_dates_handler))
}
