use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::db::entities::service;
use crate::reminders::status::{Color, classify};

/// Services partitioned into color buckets. Every color key is always present.
pub type ColorGroups<T> = BTreeMap<Color, Vec<T>>;

fn empty_groups<T>() -> ColorGroups<T> {
    Color::ALL.into_iter().map(|color| (color, Vec::new())).collect()
}

/// Puts each item into exactly one bucket according to its classification.
/// `service_of` projects an item to the service whose dates are classified,
/// so callers can group services paired with extra data such as their vendor.
pub fn group_by_color_with<T, F>(
    today: NaiveDate,
    horizon_days: u32,
    items: impl IntoIterator<Item = T>,
    service_of: F,
) -> ColorGroups<T>
where
    F: Fn(&T) -> &service::Model,
{
    let mut groups = empty_groups();
    for item in items {
        let service = service_of(&item);
        let color = classify(today, service.expiry_date, service.payment_due_date, horizon_days).color();
        groups.entry(color).or_default().push(item);
    }
    groups
}

pub fn group_by_color(
    today: NaiveDate,
    horizon_days: u32,
    all_services: impl IntoIterator<Item = service::Model>,
) -> ColorGroups<service::Model> {
    group_by_color_with(today, horizon_days, all_services, |s| s)
}
