use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::db::entities::service;
use crate::db::store::DateRangeFilter;

/// Which reminder conditions a candidate service matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderFlags {
    pub expiring: bool,
    pub payment_due: bool,
}

/// Services selected for a reminder run, keyed by service id.
///
/// `expiring_count` and `payment_due_count` are the sizes of the two window
/// sets before merging, so a service matching both is counted in each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderSelection {
    pub candidates: BTreeMap<i32, ReminderFlags>,
    pub expiring_count: usize,
    pub payment_due_count: usize,
}

impl ReminderSelection {
    pub fn total_flagged(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Last day of the horizon window that starts at `today`.
/// Saturates at `NaiveDate::MAX` for horizons past the calendar's end.
pub fn horizon_end(today: NaiveDate, horizon_days: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(horizon_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Filter matching services whose expiry date is in `[today, today + horizon_days]`.
pub fn expiring_window(today: NaiveDate, horizon_days: u32) -> DateRangeFilter {
    DateRangeFilter::ExpiryBetween(today, horizon_end(today, horizon_days))
}

/// Filter matching services whose payment due date is in `[today, today + horizon_days]`.
pub fn payment_due_window(today: NaiveDate, horizon_days: u32) -> DateRangeFilter {
    DateRangeFilter::PaymentDueBetween(today, horizon_end(today, horizon_days))
}

/// Merges the expiring and payment-due sets by service id.
pub fn merge_candidates(
    expiring_ids: &BTreeSet<i32>,
    payment_due_ids: &BTreeSet<i32>,
) -> ReminderSelection {
    let mut candidates: BTreeMap<i32, ReminderFlags> = BTreeMap::new();
    for id in expiring_ids {
        candidates.entry(*id).or_default().expiring = true;
    }
    for id in payment_due_ids {
        candidates.entry(*id).or_default().payment_due = true;
    }

    ReminderSelection {
        candidates,
        expiring_count: expiring_ids.len(),
        payment_due_count: payment_due_ids.len(),
    }
}

/// Selects the services that need a reminder on `today`.
///
/// Services that already expired are never candidates, even when their payment
/// due date falls inside the window. The input may contain the same service more
/// than once, for example when it is the concatenation of two window queries.
/// Duplicates are collapsed by id.
pub fn select_reminder_candidates(
    today: NaiveDate,
    horizon_days: u32,
    all_services: &[service::Model],
) -> ReminderSelection {
    let expiring = expiring_window(today, horizon_days);
    let payment_due = payment_due_window(today, horizon_days);
    let live = DateRangeFilter::ExpiryOnOrAfter(today);

    let expiring_ids: BTreeSet<i32> = all_services
        .iter()
        .filter(|s| expiring.matches(s))
        .map(|s| s.id)
        .collect();
    let payment_due_ids: BTreeSet<i32> = all_services
        .iter()
        .filter(|s| live.matches(s) && payment_due.matches(s))
        .map(|s| s.id)
        .collect();

    merge_candidates(&expiring_ids, &payment_due_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(id: i32, expiry: NaiveDate, payment_due: NaiveDate) -> service::Model {
        let ts = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        service::Model {
            id,
            vendor_id: 1,
            service_name: format!("service-{id}"),
            start_date: date(2023, 1, 1),
            expiry_date: expiry,
            payment_due_date: payment_due,
            amount: Decimal::new(1000, 2),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_window_is_closed_on_both_ends() {
        let today = date(2024, 1, 1);
        let services = vec![
            service(1, today, date(2025, 1, 1)),
            service(2, date(2024, 1, 16), date(2025, 1, 1)),
            service(3, date(2024, 1, 17), date(2025, 1, 1)),
            service(4, date(2023, 12, 31), date(2025, 1, 1)),
        ];

        let selection = select_reminder_candidates(today, 15, &services);
        let ids: Vec<i32> = selection.candidates.keys().copied().collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_service_in_both_windows_appears_once() {
        let today = date(2024, 1, 1);
        let services = vec![service(9, date(2024, 1, 5), date(2024, 1, 6))];

        let selection = select_reminder_candidates(today, 15, &services);

        assert_eq!(selection.total_flagged(), 1);
        assert_eq!(
            selection.candidates[&9],
            ReminderFlags { expiring: true, payment_due: true }
        );
        assert_eq!(selection.expiring_count, 1);
        assert_eq!(selection.payment_due_count, 1);
    }

    #[test]
    fn test_duplicate_inputs_are_collapsed() {
        let today = date(2024, 1, 1);
        let s = service(4, date(2024, 1, 5), date(2024, 1, 6));
        let selection = select_reminder_candidates(today, 15, &[s.clone(), s]);
        assert_eq!(selection.total_flagged(), 1);
        assert_eq!(selection.expiring_count, 1);
        assert_eq!(selection.payment_due_count, 1);
    }

    #[test]
    fn test_selection_is_order_independent_and_repeatable() {
        let today = date(2024, 1, 1);
        let mut services = vec![
            service(1, date(2024, 1, 3), date(2025, 1, 1)),
            service(2, date(2025, 1, 1), date(2024, 1, 10)),
            service(3, date(2024, 1, 2), date(2024, 1, 2)),
            service(4, date(2025, 1, 1), date(2025, 1, 1)),
        ];

        let first = select_reminder_candidates(today, 15, &services);
        let second = select_reminder_candidates(today, 15, &services);
        services.reverse();
        let reversed = select_reminder_candidates(today, 15, &services);

        assert_eq!(first, second);
        assert_eq!(first, reversed);
        assert_eq!(first.expiring_count, 2);
        assert_eq!(first.payment_due_count, 2);
        assert_eq!(first.total_flagged(), 3);
    }

    #[test]
    fn test_expired_service_with_upcoming_payment_is_not_a_candidate() {
        let today = date(2024, 1, 1);
        let services = vec![
            service(5, date(2023, 12, 1), date(2024, 1, 5)),
            service(6, date(2024, 3, 1), date(2024, 1, 5)),
        ];
        let selection = select_reminder_candidates(today, 15, &services);
        assert_eq!(selection.candidates.get(&5), None);
        assert_eq!(
            selection.candidates.get(&6),
            Some(&ReminderFlags { expiring: false, payment_due: true })
        );
        assert_eq!(selection.payment_due_count, 1);
    }

    #[test]
    fn test_merge_counts_sets_independently() {
        let expiring: BTreeSet<i32> = [1, 2, 3].into_iter().collect();
        let payment_due: BTreeSet<i32> = [3, 4].into_iter().collect();
        let selection = merge_candidates(&expiring, &payment_due);
        assert_eq!(selection.total_flagged(), 4);
        assert_eq!(selection.expiring_count, 3);
        assert_eq!(selection.payment_due_count, 2);
    }

    #[test]
    fn test_windows_use_horizon_end() {
        let today = date(2024, 1, 1);
        assert_eq!(horizon_end(today, 15), date(2024, 1, 16));
        assert_eq!(
            expiring_window(today, 0),
            DateRangeFilter::ExpiryBetween(today, today)
        );
        assert_eq!(
            payment_due_window(today, 30),
            DateRangeFilter::PaymentDueBetween(today, date(2024, 1, 31))
        );
    }

    #[test]
    fn test_huge_horizon_saturates_instead_of_overflowing() {
        let today = date(2024, 1, 1);
        assert_eq!(horizon_end(today, u32::MAX), NaiveDate::MAX);
        assert_eq!(horizon_end(today, 200_000_000), NaiveDate::MAX);

        let far = date(9000, 1, 1);
        let services = vec![service(1, far, far), service(2, date(2023, 6, 1), far)];
        let selection = select_reminder_candidates(today, u32::MAX, &services);
        assert_eq!(
            selection.candidates.get(&1),
            Some(&ReminderFlags { expiring: true, payment_due: true })
        );
        assert!(!selection.candidates.contains_key(&2));
    }
}
