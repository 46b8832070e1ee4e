use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;
use tracing::info;

use crate::db::services;
use crate::web::models::{VendorRequest, VendorResponse, VendorWithActiveServices};
use crate::web::{AppError, AppState};

// --- Route Handlers ---

async fn list_vendors_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<VendorResponse>>, AppError> {
    let today = app_state.clock.today();
    let horizon = app_state.config.reminder_days;
    let vendors = services::get_all_vendors_with_services(&app_state.db_pool).await?;
    Ok(Json(
        vendors
            .into_iter()
            .map(|(vendor, services)| VendorResponse::new(vendor, services, today, horizon))
            .collect(),
    ))
}

async fn list_with_active_services_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<VendorWithActiveServices>>, AppError> {
    let today = app_state.clock.today();
    let horizon = app_state.config.reminder_days;
    let vendors = services::get_all_vendors_with_services(&app_state.db_pool).await?;
    Ok(Json(
        vendors
            .into_iter()
            .map(|(vendor, services)| VendorWithActiveServices::new(vendor, services, today, horizon))
            .collect(),
    ))
}

async fn create_vendor_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<VendorRequest>,
) -> Result<(StatusCode, Json<VendorResponse>), AppError> {
    let input = payload.into_input()?;
    let vendor = services::create_vendor(&app_state.db_pool, &input).await?;
    info!(vendor_id = vendor.id, name = %vendor.name, "Vendor created.");
    let response = VendorResponse::new(
        vendor,
        Vec::new(),
        app_state.clock.today(),
        app_state.config.reminder_days,
    );
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_vendor_handler(
    State(app_state): State<Arc<AppState>>,
    Path(vendor_id): Path<i32>,
) -> Result<Json<VendorResponse>, AppError> {
    let vendor = services::get_vendor_by_id(&app_state.db_pool, vendor_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vendor {vendor_id} not found")))?;
    let owned = services::find_services_for_vendor(&app_state.db_pool, vendor_id).await?;
    Ok(Json(VendorResponse::new(
        vendor,
        owned,
        app_state.clock.today(),
        app_state.config.reminder_days,
    )))
}

async fn update_vendor_handler(
    State(app_state): State<Arc<AppState>>,
    Path(vendor_id): Path<i32>,
    Json(payload): Json<VendorRequest>,
) -> Result<Json<VendorResponse>, AppError> {
    let input = payload.into_input()?;
    let vendor = services::update_vendor(&app_state.db_pool, vendor_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vendor {vendor_id} not found")))?;
    let owned = services::find_services_for_vendor(&app_state.db_pool, vendor_id).await?;
    Ok(Json(VendorResponse::new(
        vendor,
        owned,
        app_state.clock.today(),
        app_state.config.reminder_days,
    )))
}

async fn delete_vendor_handler(
    State(app_state): State<Arc<AppState>>,
    Path(vendor_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let rows_affected = services::delete_vendor(&app_state.db_pool, vendor_id).await?;
    if rows_affected == 0 {
        return Err(AppError::NotFound(format!("Vendor {vendor_id} not found")));
    }
    info!(vendor_id, "Vendor deleted together with its services.");
    Ok(StatusCode::NO_CONTENT)
}

// --- Router ---

pub fn create_vendors_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_vendors_handler).post(create_vendor_handler))
        .route("/list_with_active_services", get(list_with_active_services_handler))
        .route(
            "/{vendor_id}",
            get(get_vendor_handler)
                .put(update_vendor_handler)
                .delete(delete_vendor_handler),
        )
}
