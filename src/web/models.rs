use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::entities::{service, vendor};
use crate::db::enums::VendorStatus;
use crate::db::services::{ServiceInput, VendorInput};
use crate::reminders::{Summary, classify};
use crate::web::error::AppError;

// Upper bound for NUMERIC(10, 2).
const MAX_AMOUNT_UNITS: i64 = 100_000_000;

#[derive(Debug, Serialize, Deserialize)]
pub struct VendorRequest {
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub status: VendorStatus,
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(AppError::InvalidInput(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

impl VendorRequest {
    pub fn into_input(self) -> Result<VendorInput, AppError> {
        check_len("name", &self.name, 200)?;
        check_len("contact_person", &self.contact_person, 200)?;
        check_len("email", &self.email, 100)?;
        check_len("phone", &self.phone, 20)?;
        if !self.email.contains('@') {
            return Err(AppError::InvalidInput("email is not a valid address".to_string()));
        }
        Ok(VendorInput {
            name: self.name.trim().to_string(),
            contact_person: self.contact_person,
            email: self.email.trim().to_string(),
            phone: self.phone,
            status: self.status,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceRequest {
    #[serde(rename = "vendor")]
    pub vendor_id: i32,
    pub service_name: String,
    pub start_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub payment_due_date: NaiveDate,
    pub amount: Decimal,
}

impl ServiceRequest {
    pub fn into_input(self) -> Result<ServiceInput, AppError> {
        check_len("service_name", &self.service_name, 200)?;
        if self.amount.scale() > 2 {
            return Err(AppError::InvalidInput(
                "amount must have at most 2 decimal places".to_string(),
            ));
        }
        if self.amount.abs() >= Decimal::from(MAX_AMOUNT_UNITS) {
            return Err(AppError::InvalidInput(
                "amount must have at most 10 digits in total".to_string(),
            ));
        }
        Ok(ServiceInput {
            vendor_id: self.vendor_id,
            service_name: self.service_name,
            start_date: self.start_date,
            expiry_date: self.expiry_date,
            payment_due_date: self.payment_due_date,
            amount: self.amount,
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServiceDatesRequest {
    pub expiry_date: Option<NaiveDate>,
    pub payment_due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceResponse {
    pub id: i32,
    pub vendor: i32,
    pub service_name: String,
    pub start_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub payment_due_date: NaiveDate,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: String,
    pub vendor_name: String,
}

impl ServiceResponse {
    pub fn new(model: service::Model, vendor_name: String, today: NaiveDate, horizon_days: u32) -> Self {
        let status = classify(today, model.expiry_date, model.payment_due_date, horizon_days);
        Self {
            id: model.id,
            vendor: model.vendor_id,
            service_name: model.service_name,
            start_date: model.start_date,
            expiry_date: model.expiry_date,
            payment_due_date: model.payment_due_date,
            amount: model.amount,
            created_at: model.created_at,
            updated_at: model.updated_at,
            status: status.label().to_string(),
            vendor_name,
        }
    }

    pub fn with_vendor(
        (model, vendor): (service::Model, Option<vendor::Model>),
        today: NaiveDate,
        horizon_days: u32,
    ) -> Self {
        let vendor_name = vendor.map(|v| v.name).unwrap_or_default();
        Self::new(model, vendor_name, today, horizon_days)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VendorResponse {
    pub id: i32,
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub status: VendorStatus,
    pub services: Vec<ServiceResponse>,
    pub active_services_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VendorResponse {
    pub fn new(
        vendor: vendor::Model,
        services: Vec<service::Model>,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Self {
        let active_services_count = services.iter().filter(|s| s.expiry_date >= today).count();
        let services = services
            .into_iter()
            .map(|s| ServiceResponse::new(s, vendor.name.clone(), today, horizon_days))
            .collect();
        Self {
            id: vendor.id,
            name: vendor.name,
            contact_person: vendor.contact_person,
            email: vendor.email,
            phone: vendor.phone,
            status: vendor.status,
            services,
            active_services_count,
            created_at: vendor.created_at,
            updated_at: vendor.updated_at,
        }
    }
}

/// A vendor listed with only the services that have not expired.
#[derive(Debug, Serialize, Deserialize)]
pub struct VendorWithActiveServices {
    pub id: i32,
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub status: VendorStatus,
    pub active_services: Vec<ServiceResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VendorWithActiveServices {
    pub fn new(
        vendor: vendor::Model,
        services: Vec<service::Model>,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Self {
        let active_services = services
            .into_iter()
            .filter(|s| s.expiry_date >= today)
            .map(|s| ServiceResponse::new(s, vendor.name.clone(), today, horizon_days))
            .collect();
        Self {
            id: vendor.id,
            name: vendor.name,
            contact_person: vendor.contact_person,
            email: vendor.email,
            phone: vendor.phone,
            status: vendor.status,
            active_services,
            created_at: vendor.created_at,
            updated_at: vendor.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountedServices {
    pub count: usize,
    pub services: Vec<ServiceResponse>,
}

impl From<Vec<ServiceResponse>> for CountedServices {
    fn from(services: Vec<ServiceResponse>) -> Self {
        Self {
            count: services.len(),
            services,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReminderCheckRequest {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReminderCheckResponse {
    pub message: String,
    pub summary: Summary,
}
