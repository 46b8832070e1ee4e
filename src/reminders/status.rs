use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reminder horizon used when no other value is configured.
pub const DEFAULT_HORIZON_DAYS: u32 = 15;

/// Derived status of a service relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCategory {
    Expired,
    PaymentOverdue,
    ExpiringSoon,
    Normal,
}

/// Dashboard bucket for a [`StatusCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Orange,
    Yellow,
    Gray,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Orange, Color::Yellow, Color::Gray];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Gray => "gray",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StatusCategory {
    pub fn color(&self) -> Color {
        match self {
            StatusCategory::Expired => Color::Red,
            StatusCategory::PaymentOverdue => Color::Orange,
            StatusCategory::ExpiringSoon => Color::Yellow,
            StatusCategory::Normal => Color::Gray,
        }
    }

    /// Human-readable label shown next to a service.
    pub fn label(&self) -> &'static str {
        match self {
            StatusCategory::Expired => "Expired",
            StatusCategory::PaymentOverdue => "Payment Overdue",
            StatusCategory::ExpiringSoon => "Expiring Soon",
            StatusCategory::Normal => "Active",
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole days from `today` until `date`. Negative when `date` is in the past.
pub fn days_until(today: NaiveDate, date: NaiveDate) -> i64 {
    (date - today).num_days()
}

fn within_horizon(today: NaiveDate, date: NaiveDate, horizon_days: u32) -> bool {
    let days = days_until(today, date);
    0 <= days && days <= i64::from(horizon_days)
}

/// Classifies a service. Rules are checked in order and the first match wins:
/// expired, payment overdue, expiring soon, normal.
pub fn classify(
    today: NaiveDate,
    expiry_date: NaiveDate,
    payment_due_date: NaiveDate,
    horizon_days: u32,
) -> StatusCategory {
    if expiry_date < today {
        StatusCategory::Expired
    } else if payment_due_date < today {
        StatusCategory::PaymentOverdue
    } else if within_horizon(today, expiry_date, horizon_days)
        || within_horizon(today, payment_due_date, horizon_days)
    {
        StatusCategory::ExpiringSoon
    } else {
        StatusCategory::Normal
    }
}

/// True when the expiry date is between today and `today + horizon_days`, inclusive.
pub fn is_expiring_soon(today: NaiveDate, expiry_date: NaiveDate, horizon_days: u32) -> bool {
    within_horizon(today, expiry_date, horizon_days)
}

/// True when the payment due date is between today and `today + horizon_days`, inclusive.
pub fn is_payment_due_soon(
    today: NaiveDate,
    payment_due_date: NaiveDate,
    horizon_days: u32,
) -> bool {
    within_horizon(today, payment_due_date, horizon_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_expired_takes_precedence_over_payment_overdue() {
        let today = date(2024, 1, 1);
        let status = classify(today, date(2023, 12, 31), date(2023, 12, 1), 15);
        assert_eq!(status, StatusCategory::Expired);
    }

    #[test]
    fn test_expired_regardless_of_payment_date() {
        let today = date(2024, 6, 15);
        let yesterday = today - Duration::days(1);
        for offset in [-30, -1, 0, 1, 10, 365] {
            let payment_due = today + Duration::days(offset);
            assert_eq!(classify(today, yesterday, payment_due, 15), StatusCategory::Expired);
        }
    }

    #[test]
    fn test_payment_overdue_before_expiring_soon() {
        let today = date(2024, 1, 1);
        // Expiry is within the horizon, but the missed payment wins.
        let status = classify(today, date(2024, 1, 5), date(2023, 12, 20), 15);
        assert_eq!(status, StatusCategory::PaymentOverdue);
    }

    #[test]
    fn test_horizon_boundary_is_inclusive() {
        let today = date(2024, 1, 1);
        let far_payment = today + Duration::days(100);
        let at_boundary = classify(today, today + Duration::days(15), far_payment, 15);
        let past_boundary = classify(today, today + Duration::days(16), far_payment, 15);
        assert_eq!(at_boundary, StatusCategory::ExpiringSoon);
        assert_eq!(past_boundary, StatusCategory::Normal);
    }

    #[test]
    fn test_payment_due_soon_alone_flags_expiring_soon() {
        let today = date(2024, 1, 1);
        let status = classify(today, date(2025, 1, 1), date(2024, 1, 3), 15);
        assert_eq!(status, StatusCategory::ExpiringSoon);
    }

    #[test]
    fn test_due_today_is_expiring_soon() {
        let today = date(2024, 1, 1);
        assert_eq!(classify(today, today, date(2025, 1, 1), 15), StatusCategory::ExpiringSoon);
        assert_eq!(classify(today, today, today, 0), StatusCategory::ExpiringSoon);
    }

    #[test]
    fn test_zero_horizon_only_flags_today() {
        let today = date(2024, 1, 1);
        let tomorrow = today + Duration::days(1);
        assert_eq!(classify(today, tomorrow, tomorrow, 0), StatusCategory::Normal);
    }

    #[test]
    fn test_classify_covers_every_combination() {
        let today = date(2024, 3, 1);
        for expiry_offset in -3..=20 {
            for payment_offset in -3..=20 {
                let expiry = today + Duration::days(expiry_offset);
                let payment = today + Duration::days(payment_offset);
                let expected = if expiry_offset < 0 {
                    StatusCategory::Expired
                } else if payment_offset < 0 {
                    StatusCategory::PaymentOverdue
                } else if expiry_offset <= 15 || payment_offset <= 15 {
                    StatusCategory::ExpiringSoon
                } else {
                    StatusCategory::Normal
                };
                assert_eq!(classify(today, expiry, payment, 15), expected);
            }
        }
    }

    #[test]
    fn test_soon_predicates() {
        let today = date(2024, 1, 1);
        assert!(is_expiring_soon(today, today, 15));
        assert!(is_expiring_soon(today, date(2024, 1, 16), 15));
        assert!(!is_expiring_soon(today, date(2024, 1, 17), 15));
        assert!(!is_expiring_soon(today, date(2023, 12, 31), 15));

        assert!(is_payment_due_soon(today, date(2024, 1, 16), 15));
        assert!(!is_payment_due_soon(today, date(2023, 12, 31), 15));
        assert!(!is_payment_due_soon(today, date(2024, 2, 1), 15));
    }

    #[test]
    fn test_max_horizon_does_not_overflow() {
        let today = date(2024, 1, 1);
        assert!(is_expiring_soon(today, NaiveDate::MAX, u32::MAX));
        assert_eq!(
            classify(today, date(3000, 1, 1), date(3000, 1, 1), u32::MAX),
            StatusCategory::ExpiringSoon
        );
    }

    #[test]
    fn test_colors_and_labels() {
        assert_eq!(StatusCategory::Expired.color(), Color::Red);
        assert_eq!(StatusCategory::PaymentOverdue.color(), Color::Orange);
        assert_eq!(StatusCategory::ExpiringSoon.color(), Color::Yellow);
        assert_eq!(StatusCategory::Normal.color(), Color::Gray);
        assert_eq!(StatusCategory::PaymentOverdue.label(), "Payment Overdue");
        assert_eq!(serde_json::to_string(&Color::Gray).unwrap(), "\"gray\"");
    }
}
