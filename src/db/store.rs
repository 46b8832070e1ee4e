use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

use crate::db::entities::{service, vendor};
use crate::db::services;

pub use crate::db::services::DateRangeFilter;

/// Read-only access to services and their vendors, as needed by the reminder job.
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Lists the services matching `filter`, using inclusive date ranges.
    async fn list_services(&self, filter: &DateRangeFilter) -> Result<Vec<service::Model>, DbErr>;

    /// Loads the vendor that owns `service`. A dangling reference is an error.
    async fn get_vendor(&self, service: &service::Model) -> Result<vendor::Model, DbErr>;
}

#[async_trait]
impl ServiceStore for DatabaseConnection {
    async fn list_services(&self, filter: &DateRangeFilter) -> Result<Vec<service::Model>, DbErr> {
        services::find_services(self, filter).await
    }

    async fn get_vendor(&self, service: &service::Model) -> Result<vendor::Model, DbErr> {
        vendor::Entity::find_by_id(service.vendor_id)
            .one(self)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound(format!(
                    "vendor {} referenced by service {}",
                    service.vendor_id, service.id
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::db::enums::VendorStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_service() -> service::Model {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        service::Model {
            id: 7,
            vendor_id: 3,
            service_name: "Hosting".to_string(),
            start_date: date(2023, 1, 1),
            expiry_date: date(2024, 1, 10),
            payment_due_date: date(2024, 2, 1),
            amount: Decimal::new(120050, 2),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn sample_vendor() -> vendor::Model {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        vendor::Model {
            id: 3,
            name: "Acme".to_string(),
            contact_person: "Jo".to_string(),
            email: "jo@acme.test".to_string(),
            phone: "555-0100".to_string(),
            status: VendorStatus::Active,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[tokio::test]
    async fn test_list_services_returns_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_service()]])
            .into_connection();

        let filter = DateRangeFilter::ExpiryBetween(date(2024, 1, 1), date(2024, 1, 16));
        let rows = db.list_services(&filter).await.unwrap();

        assert_eq!(rows, vec![sample_service()]);
    }

    #[tokio::test]
    async fn test_get_vendor_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_vendor()]])
            .into_connection();

        let vendor = db.get_vendor(&sample_service()).await.unwrap();
        assert_eq!(vendor.name, "Acme");
    }

    #[tokio::test]
    async fn test_get_vendor_missing_is_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<vendor::Model>::new()])
            .into_connection();

        let result = db.get_vendor(&sample_service()).await;
        assert!(matches!(result, Err(DbErr::RecordNotFound(_))));
    }

    #[test]
    fn test_filter_matches_is_inclusive() {
        let service = sample_service();
        assert!(DateRangeFilter::ExpiryBetween(date(2024, 1, 10), date(2024, 1, 10)).matches(&service));
        assert!(!DateRangeFilter::ExpiryBetween(date(2024, 1, 11), date(2024, 1, 20)).matches(&service));
        assert!(DateRangeFilter::PaymentDueBetween(date(2024, 1, 1), date(2024, 2, 1)).matches(&service));
        assert!(DateRangeFilter::ExpiryOnOrAfter(date(2024, 1, 10)).matches(&service));
        assert!(!DateRangeFilter::ExpiryBefore(date(2024, 1, 10)).matches(&service));
        assert!(DateRangeFilter::All.matches(&service));
    }
}
