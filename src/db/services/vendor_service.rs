use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QueryOrder, Set,
};

use crate::db::entities::{service, vendor};
use crate::db::enums::VendorStatus;

// --- Vendor Service Functions ---

/// Input structure for creating or replacing a vendor.
#[derive(Debug, Clone)]
pub struct VendorInput {
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub status: VendorStatus,
}

/// Creates a new vendor. `created_at` and `updated_at` are assigned here.
pub async fn create_vendor(
    db: &DatabaseConnection,
    input: &VendorInput,
) -> Result<vendor::Model, DbErr> {
    let now = Utc::now();
    let new_vendor = vendor::ActiveModel {
        name: Set(input.name.clone()),
        contact_person: Set(input.contact_person.clone()),
        email: Set(input.email.clone()),
        phone: Set(input.phone.clone()),
        status: Set(input.status),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default() // id is assigned by the database
    };
    new_vendor.insert(db).await
}

/// Retrieves a vendor by its ID.
pub async fn get_vendor_by_id(
    db: &DatabaseConnection,
    vendor_id: i32,
) -> Result<Option<vendor::Model>, DbErr> {
    vendor::Entity::find_by_id(vendor_id).one(db).await
}

/// Retrieves all vendors ordered by name.
pub async fn get_all_vendors(db: &DatabaseConnection) -> Result<Vec<vendor::Model>, DbErr> {
    vendor::Entity::find()
        .order_by_asc(vendor::Column::Name)
        .all(db)
        .await
}

/// Retrieves all vendors together with every service they own.
pub async fn get_all_vendors_with_services(
    db: &DatabaseConnection,
) -> Result<Vec<(vendor::Model, Vec<service::Model>)>, DbErr> {
    vendor::Entity::find()
        .find_with_related(service::Entity)
        .order_by_asc(vendor::Column::Name)
        .order_by_asc(service::Column::Id)
        .all(db)
        .await
}

/// Replaces a vendor's editable fields. Returns `None` if the vendor does not exist.
pub async fn update_vendor(
    db: &DatabaseConnection,
    vendor_id: i32,
    input: &VendorInput,
) -> Result<Option<vendor::Model>, DbErr> {
    let Some(existing) = vendor::Entity::find_by_id(vendor_id).one(db).await? else {
        return Ok(None);
    };

    let mut active_vendor = existing.into_active_model();
    active_vendor.name = Set(input.name.clone());
    active_vendor.contact_person = Set(input.contact_person.clone());
    active_vendor.email = Set(input.email.clone());
    active_vendor.phone = Set(input.phone.clone());
    active_vendor.status = Set(input.status);
    active_vendor.updated_at = Set(Utc::now());
    active_vendor.update(db).await.map(Some)
}

/// Deletes a vendor. The foreign key cascade removes its services.
pub async fn delete_vendor(db: &DatabaseConnection, vendor_id: i32) -> Result<u64, DbErr> {
    let result = vendor::Entity::delete_by_id(vendor_id).exec(db).await?;
    Ok(result.rows_affected)
}
