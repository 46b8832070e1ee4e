use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::db::entities::service;
use crate::db::store::{DateRangeFilter, ServiceStore};
use crate::mail::EmailSender;
use crate::reminders::dispatcher::{MailSettings, ReminderTarget, Summary, dispatch_reminders};
use crate::reminders::grouping::{ColorGroups, group_by_color};
use crate::reminders::selector::{expiring_window, payment_due_window, select_reminder_candidates};
use crate::reminders::ReminderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSettings {
    pub mail: MailSettings,
    /// Window used by the periodic check and the color report.
    pub horizon_days: u32,
}

/// Runs reminder checks and builds the status report against a store and a mail sender.
pub struct ReminderService {
    store: Arc<dyn ServiceStore>,
    sender: Arc<dyn EmailSender>,
    settings: ReminderSettings,
}

impl ReminderService {
    pub fn new(
        store: Arc<dyn ServiceStore>,
        sender: Arc<dyn EmailSender>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            store,
            sender,
            settings,
        }
    }

    /// Finds services expiring or with payment due in `[today, today + days]`
    /// and emails one reminder per service.
    ///
    /// Individual delivery failures are counted in the summary. Store errors,
    /// including a vendor that cannot be found, abort the run.
    pub async fn check_and_send_reminders(
        &self,
        today: NaiveDate,
        days: u32,
    ) -> Result<Summary, ReminderError> {
        let mut services = self.store.list_services(&expiring_window(today, days)).await?;
        services.extend(self.store.list_services(&payment_due_window(today, days)).await?);

        let selection = select_reminder_candidates(today, days, &services);
        if selection.is_empty() {
            debug!(%today, days, "No services need a reminder.");
        }
        debug!(
            flagged = selection.total_flagged(),
            expiring = selection.expiring_count,
            payment_due = selection.payment_due_count,
            "Reminder candidates selected."
        );

        let mut targets: BTreeMap<i32, ReminderTarget> = BTreeMap::new();
        for service in services {
            if !selection.candidates.contains_key(&service.id) || targets.contains_key(&service.id) {
                continue;
            }
            let vendor = self.store.get_vendor(&service).await?;
            targets.insert(service.id, ReminderTarget { service, vendor });
        }

        dispatch_reminders(
            today,
            &selection,
            &targets,
            self.sender.as_ref(),
            &self.settings.mail,
        )
        .await
    }

    /// Groups every service by status color using the configured horizon.
    pub async fn get_services_with_color_codes(
        &self,
        today: NaiveDate,
    ) -> Result<ColorGroups<service::Model>, ReminderError> {
        let services = self.store.list_services(&DateRangeFilter::All).await?;
        Ok(group_by_color(today, self.settings.horizon_days, services))
    }

    /// Runs the reminder check every `period`, reading the date from `clock` on each tick.
    pub async fn start_periodic_check(self: Arc<Self>, clock: Arc<dyn Clock>, period: Duration) {
        info!(
            interval_seconds = period.as_secs(),
            horizon_days = self.settings.horizon_days,
            "Reminder check task started."
        );
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            let today = clock.today();
            info!(%today, "Performing scheduled reminder check...");
            match self.check_and_send_reminders(today, self.settings.horizon_days).await {
                Ok(summary) => info!(
                    flagged = summary.total_flagged,
                    sent = summary.emails_sent,
                    failed = summary.emails_failed,
                    "Scheduled reminder check completed."
                ),
                Err(e) => error!(error = %e, "Error during scheduled reminder check."),
            }
        }
    }
}
