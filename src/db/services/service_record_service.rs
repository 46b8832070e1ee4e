use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set,
};

use crate::db::entities::{service, vendor};

// --- Service Record Functions ---

/// Input structure for creating or replacing a service.
#[derive(Debug, Clone)]
pub struct ServiceInput {
    pub vendor_id: i32,
    pub service_name: String,
    pub start_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub payment_due_date: NaiveDate,
    pub amount: Decimal,
}

/// Date-based service filters. Ranges include both endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeFilter {
    All,
    ExpiryBetween(NaiveDate, NaiveDate),
    PaymentDueBetween(NaiveDate, NaiveDate),
    /// `expiry_date >= date`
    ExpiryOnOrAfter(NaiveDate),
    /// `expiry_date < date`
    ExpiryBefore(NaiveDate),
}

impl DateRangeFilter {
    pub fn condition(&self) -> Condition {
        match *self {
            DateRangeFilter::All => Condition::all(),
            DateRangeFilter::ExpiryBetween(start, end) => Condition::all()
                .add(service::Column::ExpiryDate.gte(start))
                .add(service::Column::ExpiryDate.lte(end)),
            DateRangeFilter::PaymentDueBetween(start, end) => Condition::all()
                .add(service::Column::PaymentDueDate.gte(start))
                .add(service::Column::PaymentDueDate.lte(end)),
            DateRangeFilter::ExpiryOnOrAfter(date) => {
                Condition::all().add(service::Column::ExpiryDate.gte(date))
            }
            DateRangeFilter::ExpiryBefore(date) => {
                Condition::all().add(service::Column::ExpiryDate.lt(date))
            }
        }
    }

    /// In-memory counterpart of [`DateRangeFilter::condition`].
    pub fn matches(&self, service: &service::Model) -> bool {
        match *self {
            DateRangeFilter::All => true,
            DateRangeFilter::ExpiryBetween(start, end) => {
                start <= service.expiry_date && service.expiry_date <= end
            }
            DateRangeFilter::PaymentDueBetween(start, end) => {
                start <= service.payment_due_date && service.payment_due_date <= end
            }
            DateRangeFilter::ExpiryOnOrAfter(date) => service.expiry_date >= date,
            DateRangeFilter::ExpiryBefore(date) => service.expiry_date < date,
        }
    }
}

/// Creates a new service for an existing vendor.
pub async fn create_service(
    db: &DatabaseConnection,
    input: &ServiceInput,
) -> Result<service::Model, DbErr> {
    let now = Utc::now();
    let new_service = service::ActiveModel {
        vendor_id: Set(input.vendor_id),
        service_name: Set(input.service_name.clone()),
        start_date: Set(input.start_date),
        expiry_date: Set(input.expiry_date),
        payment_due_date: Set(input.payment_due_date),
        amount: Set(input.amount),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    new_service.insert(db).await
}

/// Retrieves a service and the vendor that owns it.
pub async fn get_service_with_vendor(
    db: &DatabaseConnection,
    service_id: i32,
) -> Result<Option<(service::Model, Option<vendor::Model>)>, DbErr> {
    service::Entity::find_by_id(service_id)
        .find_also_related(vendor::Entity)
        .one(db)
        .await
}

/// Retrieves the services matching `filter`.
pub async fn find_services(
    db: &DatabaseConnection,
    filter: &DateRangeFilter,
) -> Result<Vec<service::Model>, DbErr> {
    service::Entity::find()
        .filter(filter.condition())
        .order_by_asc(service::Column::Id)
        .all(db)
        .await
}

/// Retrieves the services matching `filter`, each paired with its vendor.
pub async fn find_services_with_vendor(
    db: &DatabaseConnection,
    filter: &DateRangeFilter,
) -> Result<Vec<(service::Model, Option<vendor::Model>)>, DbErr> {
    service::Entity::find()
        .filter(filter.condition())
        .find_also_related(vendor::Entity)
        .order_by_asc(service::Column::Id)
        .all(db)
        .await
}

/// Retrieves every service owned by a vendor.
pub async fn find_services_for_vendor(
    db: &DatabaseConnection,
    vendor_id: i32,
) -> Result<Vec<service::Model>, DbErr> {
    service::Entity::find()
        .filter(service::Column::VendorId.eq(vendor_id))
        .order_by_asc(service::Column::Id)
        .all(db)
        .await
}

/// Services whose expiry date falls within `[start, end]`.
pub async fn find_services_expiring_between(
    db: &DatabaseConnection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(service::Model, Option<vendor::Model>)>, DbErr> {
    find_services_with_vendor(db, &DateRangeFilter::ExpiryBetween(start, end)).await
}

/// Services whose payment due date falls within `[start, end]`.
pub async fn find_services_payment_due_between(
    db: &DatabaseConnection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(service::Model, Option<vendor::Model>)>, DbErr> {
    find_services_with_vendor(db, &DateRangeFilter::PaymentDueBetween(start, end)).await
}

/// Replaces a service's editable fields. Returns `None` if the service does not exist.
pub async fn update_service(
    db: &DatabaseConnection,
    service_id: i32,
    input: &ServiceInput,
) -> Result<Option<service::Model>, DbErr> {
    let Some(existing) = service::Entity::find_by_id(service_id).one(db).await? else {
        return Ok(None);
    };

    let mut active_service = existing.into_active_model();
    active_service.vendor_id = Set(input.vendor_id);
    active_service.service_name = Set(input.service_name.clone());
    active_service.start_date = Set(input.start_date);
    active_service.expiry_date = Set(input.expiry_date);
    active_service.payment_due_date = Set(input.payment_due_date);
    active_service.amount = Set(input.amount);
    active_service.updated_at = Set(Utc::now());
    active_service.update(db).await.map(Some)
}

/// Updates only the expiry and/or payment due date of a service.
pub async fn update_service_dates(
    db: &DatabaseConnection,
    service_id: i32,
    expiry_date: Option<NaiveDate>,
    payment_due_date: Option<NaiveDate>,
) -> Result<Option<service::Model>, DbErr> {
    let Some(existing) = service::Entity::find_by_id(service_id).one(db).await? else {
        return Ok(None);
    };

    let mut active_service = existing.into_active_model();
    if let Some(date) = expiry_date {
        active_service.expiry_date = Set(date);
    }
    if let Some(date) = payment_due_date {
        active_service.payment_due_date = Set(date);
    }
    active_service.updated_at = Set(Utc::now());
    active_service.update(db).await.map(Some)
}

/// Deletes a service by its ID.
pub async fn delete_service(db: &DatabaseConnection, service_id: i32) -> Result<u64, DbErr> {
    let result = service::Entity::delete_by_id(service_id).exec(db).await?;
    Ok(result.rows_affected)
}
