use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::db::entities::{service, vendor};
use crate::mail::{DeliveryError, EmailMessage, EmailSender};
use crate::reminders::selector::{ReminderFlags, ReminderSelection};
use crate::reminders::status::days_until;
use crate::reminders::ReminderError;

const SUBJECT_PREFIX: &str = "Vendor Management Alert";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A candidate service together with the vendor it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderTarget {
    pub service: service::Model,
    pub vendor: vendor::Model,
}

/// Sender identity and extra recipients, fixed for one reminder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub from_email: String,
    pub admin_email: Option<String>,
}

/// Outcome of a reminder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "total_services_flagged")]
    pub total_flagged: usize,
    pub expiring_count: usize,
    pub payment_due_count: usize,
    pub emails_sent: usize,
    pub emails_failed: usize,
}

/// Running count of delivery outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryTally {
    pub sent: usize,
    pub failed: usize,
}

impl DeliveryTally {
    pub fn record(&mut self, outcome: &Result<(), DeliveryError>) {
        match outcome {
            Ok(()) => self.sent += 1,
            Err(_) => self.failed += 1,
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Builds the subject line. Conditions are joined with " & ".
pub fn compose_subject(today: NaiveDate, service: &service::Model, flags: ReminderFlags) -> String {
    let mut parts = Vec::with_capacity(2);
    if flags.expiring {
        parts.push(format!(
            "Service Expiring in {} days",
            days_until(today, service.expiry_date)
        ));
    }
    if flags.payment_due {
        parts.push(format!(
            "Payment Due in {} days",
            days_until(today, service.payment_due_date)
        ));
    }
    format!("{SUBJECT_PREFIX}: {}", parts.join(" & "))
}

/// Builds the plain-text body for one service.
pub fn compose_body(today: NaiveDate, target: &ReminderTarget, flags: ReminderFlags) -> String {
    let service = &target.service;
    let vendor = &target.vendor;

    let mut lines: Vec<String> = vec![
        format!("Dear {},", vendor.contact_person),
        String::new(),
        format!(
            "This is a reminder regarding the service '{}' for vendor '{}'.",
            service.service_name, vendor.name
        ),
        String::new(),
    ];

    if flags.expiring {
        lines.push(format!(
            "⚠️ EXPIRY ALERT: This service will expire on {} ({} days from now).",
            format_date(service.expiry_date),
            days_until(today, service.expiry_date)
        ));
        lines.push(String::new());
    }

    if flags.payment_due {
        lines.push(format!(
            "💰 PAYMENT DUE: Payment of ${:.2} is due on {} ({} days from now).",
            service.amount,
            format_date(service.payment_due_date),
            days_until(today, service.payment_due_date)
        ));
        lines.push(String::new());
    }

    lines.extend([
        "Service Details:".to_string(),
        format!("  - Service Name: {}", service.service_name),
        format!("  - Start Date: {}", format_date(service.start_date)),
        format!("  - Expiry Date: {}", format_date(service.expiry_date)),
        format!("  - Payment Due Date: {}", format_date(service.payment_due_date)),
        format!("  - Amount: ${:.2}", service.amount),
        String::new(),
        "Please take necessary action.".to_string(),
        String::new(),
        "Best regards,".to_string(),
        "Vendor Management System".to_string(),
    ]);

    lines.join("\n")
}

/// The vendor's address, followed by the administrator's when one is configured.
pub fn recipients(vendor: &vendor::Model, settings: &MailSettings) -> Vec<String> {
    let mut to = vec![vendor.email.clone()];
    if let Some(admin) = settings.admin_email.as_deref().filter(|a| !a.is_empty()) {
        to.push(admin.to_string());
    }
    to
}

/// Composes the single reminder email for a candidate, whatever flags it carries.
pub fn compose_reminder(
    today: NaiveDate,
    target: &ReminderTarget,
    flags: ReminderFlags,
    settings: &MailSettings,
) -> EmailMessage {
    EmailMessage {
        from: settings.from_email.clone(),
        to: recipients(&target.vendor, settings),
        subject: compose_subject(today, &target.service, flags),
        body: compose_body(today, target, flags),
    }
}

/// Sends one reminder per candidate, one after another.
///
/// A failed delivery is logged and counted, and the loop moves on. Nothing
/// already sent is undone. A candidate with no entry in `targets` aborts the run.
pub async fn dispatch_reminders(
    today: NaiveDate,
    selection: &ReminderSelection,
    targets: &BTreeMap<i32, ReminderTarget>,
    sender: &dyn EmailSender,
    settings: &MailSettings,
) -> Result<Summary, ReminderError> {
    let mut tally = DeliveryTally::default();

    for (service_id, flags) in &selection.candidates {
        let target = targets
            .get(service_id)
            .ok_or(ReminderError::MissingTarget(*service_id))?;
        let message = compose_reminder(today, target, *flags, settings);

        let outcome = sender.send(&message).await;
        match &outcome {
            Ok(()) => info!(
                service_id = *service_id,
                recipients = ?message.to,
                "Reminder email sent."
            ),
            Err(e) => error!(
                service_id = *service_id,
                vendor_email = %target.vendor.email,
                error = %e,
                "Failed to send reminder email."
            ),
        }
        tally.record(&outcome);
    }

    Ok(Summary {
        total_flagged: selection.total_flagged(),
        expiring_count: selection.expiring_count,
        payment_due_count: selection.payment_due_count,
        emails_sent: tally.sent,
        emails_failed: tally.failed,
    })
}
