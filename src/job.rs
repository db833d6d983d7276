use std::collections::HashSet;

use anyhow::{Error, Result};
use chrono::NaiveDate;
use futures_util::{StreamExt, future};
use tracing::{debug, error, info, warn};

use crate::{
    clients::{Messenger, NotificationLedger, RecordStore},
    config::Config,
    error::DeliveryError,
    models::{
        invoice::{InvoiceCandidate, ReminderTarget},
        query::{
            Column, Field, Filter, InvoiceQuery, OPEN_INVOICE_STATUS, RecordSource, SortOrder,
        },
        status::{DispatchStatus, RunSummary},
    },
    reminder::{ReminderContent, build_message},
};

/// Open mainline invoices of the configured subsidiary whose due date is exactly
/// `days_past_due` whole days before `as_of`, oldest transaction first.
///
/// A configured saved view supplies its own criteria; only the columns and
/// ordering are kept.
pub fn build_invoice_query(config: &Config, as_of: NaiveDate) -> InvoiceQuery {
    let columns = vec![
        Column::sorted(Field::TranDate, SortOrder::Asc),
        Column::new(Field::DueDate),
        Column::new(Field::TranId),
        Column::new(Field::Entity),
    ];

    if let Some(view) = &config.saved_view {
        return InvoiceQuery {
            source: RecordSource::SavedView(view.clone()),
            filters: Vec::new(),
            columns,
        };
    }

    InvoiceQuery {
        source: RecordSource::Transactions,
        filters: vec![
            Filter::SubsidiaryAnyOf(vec![config.subsidiary_id]),
            Filter::Mainline(true),
            Filter::StatusAnyOf(vec![OPEN_INVOICE_STATUS.to_string()]),
            Filter::DaysPastDue {
                as_of,
                days: config.days_past_due,
            },
        ],
        columns,
    }
}

pub fn to_reminder_target(candidate: InvoiceCandidate) -> ReminderTarget {
    ReminderTarget {
        invoice_id: candidate.invoice_id,
        customer_id: candidate.customer_id,
        document_number: candidate.document_number,
        customer_email: candidate.customer_email,
    }
}

fn log_delivery_error(target: &ReminderTarget, err: &DeliveryError) {
    error!(
        title = err.title(),
        details = %err,
        invoice_id = target.invoice_id,
        customer_id = target.customer_id,
        "Reminder email not sent"
    );
}

/// Renders and sends one reminder. Delivery failures are logged, never raised.
pub async fn dispatch_reminder(
    target: &ReminderTarget,
    config: &Config,
    content: &ReminderContent,
    messenger: &dyn Messenger,
) -> bool {
    let message = match build_message(target, config, content) {
        Ok(message) => message,
        Err(e) => {
            log_delivery_error(target, &DeliveryError::from(e));
            return false;
        }
    };

    match messenger.send(&message).await {
        Ok(()) => {
            info!(
                title = "emailSent",
                invoice_id = target.invoice_id,
                customer_id = target.customer_id,
                document_number = %target.document_number,
                "Reminder email sent"
            );
            true
        }
        Err(e) => {
            log_delivery_error(target, &e);
            false
        }
    }
}

pub fn report_completion(summary: &RunSummary) {
    info!(
        matched = summary.matched,
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped,
        "Dunning email process complete"
    );
}

pub struct DunningJob<'a> {
    config: &'a Config,
    store: &'a dyn RecordStore,
    messenger: &'a dyn Messenger,
    content: &'a ReminderContent,
    ledger: Option<&'a dyn NotificationLedger>,
}

impl<'a> DunningJob<'a> {
    pub fn new(
        config: &'a Config,
        store: &'a dyn RecordStore,
        messenger: &'a dyn Messenger,
        content: &'a ReminderContent,
    ) -> Self {
        Self {
            config,
            store,
            messenger,
            content,
            ledger: None,
        }
    }

    pub fn with_ledger(mut self, ledger: &'a dyn NotificationLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Runs one pass: query, transform, dispatch every match, report.
    ///
    /// Only a failure to start the query is returned as an error. Unreadable
    /// records and failed sends are logged and counted.
    pub async fn run(&self, as_of: NaiveDate) -> Result<RunSummary, Error> {
        info!(
            days_past_due = self.config.days_past_due,
            as_of = %as_of,
            saved_view = self.config.saved_view.as_deref(),
            "Initializing dunning email process..."
        );

        let query = build_invoice_query(self.config, as_of);
        let candidates = self.store.enumerate(&query).await?;

        let mut summary = RunSummary::default();
        let mut seen = HashSet::new();
        let mut unreadable = 0;

        {
            let mut dispatches = candidates
                .filter_map(|result| {
                    let target = match result {
                        Ok(candidate) => {
                            let target = to_reminder_target(candidate);
                            if seen.insert(target.invoice_id) {
                                Some(target)
                            } else {
                                debug!(
                                    invoice_id = target.invoice_id,
                                    "Invoice already queued in this run, ignoring repeat"
                                );
                                None
                            }
                        }
                        Err(e) => {
                            error!(
                                title = "unexpected error",
                                details = %e,
                                "Skipping unreadable invoice record"
                            );
                            unreadable += 1;
                            None
                        }
                    };
                    future::ready(target)
                })
                .map(|target| self.process(target))
                .buffer_unordered(self.config.worker_concurrency);

            while let Some(status) = dispatches.next().await {
                debug!(status = %status, "Dispatch finished");
                summary.matched += 1;
                summary.record(status);
            }
        }

        summary.matched += unreadable;
        summary.failed += unreadable;

        report_completion(&summary);

        Ok(summary)
    }

    async fn process(&self, target: ReminderTarget) -> DispatchStatus {
        let days = self.config.days_past_due;

        if let Some(ledger) = self.ledger {
            match ledger.already_notified(target.invoice_id, days).await {
                Ok(true) => {
                    info!(
                        invoice_id = target.invoice_id,
                        days_past_due = days,
                        "Reminder already sent for this threshold, skipping"
                    );
                    return DispatchStatus::Skipped;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        invoice_id = target.invoice_id,
                        error = %e,
                        "Could not read notified marker, sending anyway"
                    );
                }
            }
        }

        if !dispatch_reminder(&target, self.config, self.content, self.messenger).await {
            return DispatchStatus::Failed;
        }

        if let Some(ledger) = self.ledger {
            if let Err(e) = ledger.mark_notified(target.invoice_id, days).await {
                warn!(
                    invoice_id = target.invoice_id,
                    error = %e,
                    "Failed to record notified marker"
                );
            }
        }

        DispatchStatus::Sent
    }
}
